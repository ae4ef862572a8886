use std::sync::Arc;

use tracing::warn;

use crate::{Event, EventConsumer, EventPayload};

/// Outbound port for alerts (e-mail, pager, ...).
pub trait AlertSink: Send + Sync {
    fn notify(&self, subject: &str, message: &str) -> anyhow::Result<()>;
}

/// Writes alerts to the log.
#[derive(Clone, Debug)]
pub struct LogAlertSink {
    recipient: String,
}

impl LogAlertSink {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

impl AlertSink for LogAlertSink {
    fn notify(&self, subject: &str, message: &str) -> anyhow::Result<()> {
        warn!(to = %self.recipient, subject, message, "alert");
        Ok(())
    }
}

/// Raises an alert whenever a patient becomes high risk, at registration or via a risk change.
///
/// Alerts name the patient ID only.
pub struct HighRiskAlerter {
    sink: Arc<dyn AlertSink>,
}

impl HighRiskAlerter {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }
}

impl EventConsumer for HighRiskAlerter {
    fn name(&self) -> &str {
        "high_risk_alerter"
    }

    fn process(&self, event: &Event) -> anyhow::Result<()> {
        match event.payload() {
            EventPayload::PatientRegistered { patient_id, risk } if risk.is_high() => self
                .sink
                .notify(
                    &format!("High Risk: {patient_id}"),
                    &format!("Patient {patient_id} registered as HIGH risk"),
                ),
            EventPayload::RiskChanged {
                patient_id,
                old,
                new,
            } if new.is_high() => self.sink.notify(
                &format!("High Risk: {patient_id}"),
                &format!("Patient {patient_id} changed from {old} to HIGH risk"),
            ),
            _ => Ok(()),
        }
    }
}
