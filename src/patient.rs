use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Aggregate, Event, EventPayload, MentcareError, Result};

/// Identity of a patient. Compared and hashed by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PatientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Clinical risk category of a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn is_high(self) -> bool {
        self == RiskLevel::High
    }
}

impl FromStr for RiskLevel {
    type Err = MentcareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(MentcareError::InvalidRiskLevel(s.to_string())),
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Patient aggregate.
///
/// A `Patient` only exists if registration succeeded: [`Patient::register`] checks every
/// invariant before anything is recorded, so a failed registration yields neither an aggregate
/// nor an event. Stored patients come back through [`PatientRecord`], which runs the same checks.
///
/// There is no `Clone`: the pending buffer has a single owner. [`Patient::snapshot`] copies the
/// state without it.
///
/// ```compile_fail
/// let patient: mentcare_events::Patient = serde_json::from_str("{}").unwrap();
/// ```
///
/// ```compile_fail
/// fn copy(patient: &mentcare_events::Patient) -> mentcare_events::Patient {
///     patient.clone()
/// }
/// ```
#[derive(Debug)]
pub struct Patient {
    id: PatientId,
    name: String,
    birthdate: NaiveDate,
    risk: RiskLevel,
    registered_at: DateTime<Utc>,
    pending: Vec<Event>,
}

impl Patient {
    /// Registers a new patient, buffering a single `PatientRegistered` event stamped at `now`.
    ///
    /// Fails with [`MentcareError::Validation`] when the ID is blank or the birthdate is not
    /// strictly before `now`'s date.
    pub fn register(
        id: PatientId,
        name: impl Into<String>,
        birthdate: NaiveDate,
        risk: RiskLevel,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let id = validate(id, birthdate, now)?;

        let event = Event::new(
            EventPayload::PatientRegistered {
                patient_id: id.clone(),
                risk,
            },
            now,
        );

        Ok(Self {
            id,
            name: name.into(),
            birthdate,
            risk,
            registered_at: now,
            pending: vec![event],
        })
    }

    /// Changes the risk level. Setting the current level again records nothing.
    pub fn change_risk(&mut self, new_risk: RiskLevel, now: DateTime<Utc>) {
        let old = self.risk;
        if old == new_risk {
            debug!(patient_id = %self.id, risk = %old, "risk unchanged, nothing recorded");
            return;
        }

        self.risk = new_risk;
        self.pending.push(Event::new(
            EventPayload::RiskChanged {
                patient_id: self.id.clone(),
                old,
                new: new_risk,
            },
            now,
        ));
    }

    pub fn id(&self) -> &PatientId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birthdate(&self) -> NaiveDate {
        self.birthdate
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// A copy of the stored state without the pending buffer.
    pub fn snapshot(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            birthdate: self.birthdate,
            risk: self.risk,
            registered_at: self.registered_at,
            pending: Vec::new(),
        }
    }
}

fn validate(id: PatientId, birthdate: NaiveDate, now: DateTime<Utc>) -> Result<PatientId> {
    if id.as_str().trim().is_empty() {
        return Err(MentcareError::Validation {
            patient_id: id,
            reason: "patient id must not be blank".to_string(),
        });
    }

    let today = now.date_naive();
    if birthdate >= today {
        return Err(MentcareError::Validation {
            patient_id: id,
            reason: format!("birthdate {birthdate} must be before {today}"),
        });
    }

    Ok(id)
}

/// Storage form of a [`Patient`], as written by durable repositories.
///
/// Converting back into a `Patient` re-checks the registration invariants against
/// `registered_at`, so a tampered or corrupt record never yields an aggregate. Restored patients
/// have no pending events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: String,
    pub birthdate: NaiveDate,
    pub risk: RiskLevel,
    pub registered_at: DateTime<Utc>,
}

impl From<&Patient> for PatientRecord {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.clone(),
            name: patient.name.clone(),
            birthdate: patient.birthdate,
            risk: patient.risk,
            registered_at: patient.registered_at,
        }
    }
}

impl TryFrom<PatientRecord> for Patient {
    type Error = MentcareError;

    fn try_from(record: PatientRecord) -> Result<Self> {
        let id = validate(record.id, record.birthdate, record.registered_at)?;

        Ok(Self {
            id,
            name: record.name,
            birthdate: record.birthdate,
            risk: record.risk,
            registered_at: record.registered_at,
            pending: Vec::new(),
        })
    }
}

impl Aggregate for Patient {
    type Id = PatientId;

    fn aggregate_id(&self) -> &PatientId {
        &self.id
    }

    fn pull_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }
}
