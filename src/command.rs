use chrono::NaiveDate;

use crate::{MentcareError, PatientId, Result, RiskLevel};

/// Request to register a new patient.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterPatient {
    pub patient_id: PatientId,
    pub name: String,
    pub birthdate: NaiveDate,
    pub risk: RiskLevel,
}

impl RegisterPatient {
    pub fn new(
        patient_id: impl Into<PatientId>,
        name: impl Into<String>,
        birthdate: NaiveDate,
        risk: RiskLevel,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: name.into(),
            birthdate,
            risk,
        }
    }

    /// Builds the command from raw input: `birthdate` as `YYYY-MM-DD`, `risk` as
    /// `low`/`medium`/`high`.
    pub fn parse(patient_id: &str, name: &str, birthdate: &str, risk: &str) -> Result<Self> {
        let birthdate = NaiveDate::parse_from_str(birthdate.trim(), "%Y-%m-%d").map_err(|err| {
            MentcareError::Validation {
                patient_id: patient_id.into(),
                reason: format!("invalid birthdate '{birthdate}': {err}"),
            }
        })?;

        Ok(Self::new(patient_id, name, birthdate, risk.parse()?))
    }
}

/// Request to change an existing patient's risk level.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRisk {
    pub patient_id: PatientId,
    pub risk: RiskLevel,
}

impl ChangeRisk {
    pub fn new(patient_id: impl Into<PatientId>, risk: RiskLevel) -> Self {
        Self {
            patient_id: patient_id.into(),
            risk,
        }
    }
}
