use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, info_span};

use crate::{
    Aggregate, ChangeRisk, Dispatcher, MentcareError, MonthlyPatientStats, MonthlyReport, Patient,
    PatientId, PatientRepository, RegisterPatient, ReportWriter, Result,
};

/// Use cases of the patient registry.
///
/// Every mutating operation follows the same sequence: load/guard → change the aggregate →
/// `save` → drain the aggregate's events → publish them in order. Events are only published once
/// the save has returned, so subscribers never hear about state that was not stored.
///
/// Nothing is rolled back if a consumer fails after the save: the record stays stored and the
/// remaining events and consumers are skipped. The duplicate check and the save are also not
/// atomic together, so two concurrent registrations of the same ID can both succeed; callers
/// that register concurrently must serialize per ID.
pub struct PatientService<R>
where
    R: PatientRepository,
{
    repository: Arc<R>,
    dispatcher: Arc<Dispatcher>,
}

impl<R> PatientService<R>
where
    R: PatientRepository,
{
    pub fn new(repository: Arc<R>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Registers a new patient and announces it.
    ///
    /// Fails with [`MentcareError::DuplicateEntity`] before touching anything if the ID is taken,
    /// and with [`MentcareError::Validation`] if the patient is invalid.
    pub fn register(&self, command: RegisterPatient, now: DateTime<Utc>) -> Result<Patient> {
        let span = info_span!("register_patient", patient_id = %command.patient_id);
        let _enter = span.enter();

        if self.repository.get(&command.patient_id)?.is_some() {
            return Err(MentcareError::DuplicateEntity(command.patient_id));
        }

        let mut patient = Patient::register(
            command.patient_id,
            command.name,
            command.birthdate,
            command.risk,
            now,
        )?;

        self.commit(&mut patient)?;
        info!("patient registered");

        Ok(patient)
    }

    /// Changes the risk level of a stored patient.
    ///
    /// Setting the current level again stores the patient but publishes nothing.
    pub fn change_risk(&self, command: ChangeRisk, now: DateTime<Utc>) -> Result<Patient> {
        let span = info_span!("change_risk", patient_id = %command.patient_id);
        let _enter = span.enter();

        let mut patient = self
            .repository
            .get(&command.patient_id)?
            .ok_or(MentcareError::PatientNotFound(command.patient_id))?;

        patient.change_risk(command.risk, now);

        self.commit(&mut patient)?;
        info!(risk = %patient.risk(), "risk updated");

        Ok(patient)
    }

    pub fn find(&self, id: &PatientId) -> Result<Option<Patient>> {
        self.repository.get(id)
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>> {
        self.repository.all()
    }

    fn commit(&self, patient: &mut Patient) -> Result<()> {
        self.repository.save(patient)?;

        for event in patient.pull_events() {
            self.dispatcher.publish(&event)?;
        }

        Ok(())
    }
}

/// Produces monthly reports from the statistics projection.
pub struct ReportService {
    stats: Arc<MonthlyPatientStats>,
    writer: Arc<dyn ReportWriter>,
}

impl ReportService {
    pub fn new(stats: Arc<MonthlyPatientStats>, writer: Arc<dyn ReportWriter>) -> Self {
        Self { stats, writer }
    }

    /// Reads the month from the projection, hands it to the writer and returns it.
    pub fn produce_report(&self, year: i32, month: u32) -> Result<MonthlyReport> {
        let report = MonthlyReport {
            year,
            month,
            counts: self.stats.get_report(year, month),
        };

        self.writer.write(&report).map_err(MentcareError::Report)?;

        Ok(report)
    }
}
