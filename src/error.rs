use thiserror::Error;

use crate::{EventType, PatientId};

#[derive(Error, Debug)]
pub enum MentcareError {
    #[error("Validation failed for patient {patient_id}: {reason}")]
    Validation { patient_id: PatientId, reason: String },

    #[error("Patient '{0}' already exists")]
    DuplicateEntity(PatientId),

    #[error("Patient '{0}' not found")]
    PatientNotFound(PatientId),

    #[error("Unknown risk level '{0}', expected one of: low, medium, high")]
    InvalidRiskLevel(String),

    #[error("Event consumer '{consumer}' failed on {event_type} event: {source}")]
    Handler {
        consumer: String,
        event_type: EventType,
        #[source]
        source: anyhow::Error,
    },

    #[error("Repository operation failed: {0}")]
    Repository(#[source] anyhow::Error),

    #[error("Report output failed: {0}")]
    Report(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

// Result alias within the library
pub type Result<T, E = MentcareError> = std::result::Result<T, E>;
