use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{PatientId, RiskLevel, Uuid};

/// The `Event` struct is the immutable record of a fact produced by an aggregate.
///
/// Every event carries a unique ID and the instant it occurred; the concrete fact lives in its
/// [`EventPayload`]. Fields are private and there are no setters, so an event never changes after
/// construction. Events serialize for logs and outboxes but cannot be deserialized, so an event
/// with a forged ID or payload cannot be built outside [`Event::new`].
///
/// Payloads only carry identifiers and categories: names, birthdates and other free text stay in
/// the aggregate and never leak into subscribers or read models.
///
/// ```compile_fail
/// let event: mentcare_events::Event = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    payload: EventPayload,
}

impl Event {
    /// Creates a new event with a fresh ID.
    pub fn new(payload: EventPayload, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            payload,
        }
    }

    /// The unique ID of the event.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the fact happened, as supplied by the caller's clock.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// The concrete type of the event, used for routing.
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// The patient this event is about.
    pub fn patient_id(&self) -> &PatientId {
        match &self.payload {
            EventPayload::PatientRegistered { patient_id, .. } => patient_id,
            EventPayload::RiskChanged { patient_id, .. } => patient_id,
        }
    }
}

/// The closed set of facts the patient registry can record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    PatientRegistered {
        patient_id: PatientId,
        risk: RiskLevel,
    },
    RiskChanged {
        patient_id: PatientId,
        old: RiskLevel,
        new: RiskLevel,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::PatientRegistered { .. } => EventType::PatientRegistered,
            EventPayload::RiskChanged { .. } => EventType::RiskChanged,
        }
    }
}

/// Routing keys for the dispatcher, arranged as an explicit hierarchy.
///
/// ```text
/// DomainEvent
/// └── PatientEvent
///     ├── PatientRegistered
///     └── RiskChanged
/// ```
///
/// Subscribing under an abstract key (`DomainEvent`, `PatientEvent`) receives every event
/// below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    DomainEvent,
    PatientEvent,
    PatientRegistered,
    RiskChanged,
}

impl EventType {
    /// The direct supertype, `None` for the root.
    pub fn parent(self) -> Option<EventType> {
        match self {
            EventType::DomainEvent => None,
            EventType::PatientEvent => Some(EventType::DomainEvent),
            EventType::PatientRegistered | EventType::RiskChanged => {
                Some(EventType::PatientEvent)
            }
        }
    }

    /// Returns `true` if `self` is `other` or one of its ancestors.
    pub fn matches(self, other: EventType) -> bool {
        let mut current = Some(other);
        while let Some(t) = current {
            if t == self {
                return true;
            }
            current = t.parent();
        }
        false
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::DomainEvent => "DomainEvent",
            EventType::PatientEvent => "PatientEvent",
            EventType::PatientRegistered => "PatientRegistered",
            EventType::RiskChanged => "RiskChanged",
        };
        f.write_str(name)
    }
}
