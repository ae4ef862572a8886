use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError, RwLock},
};

use anyhow::Context;
use tracing::debug;

use crate::{Aggregate, MentcareError, Patient, PatientId, PatientRecord, Result};

/// The storage port the [`PatientService`](crate::PatientService) depends on.
///
/// Implementations store snapshots keyed by [`PatientId`]. `save` overwrites whatever is stored
/// under the same ID (last write wins); there are no transactions or versions.
///
/// Adapter failures are reported as [`MentcareError::Repository`](crate::MentcareError::Repository).
pub trait PatientRepository: Send + Sync {
    /// Loads a patient, `None` if nothing is stored under `id`.
    fn get(&self, id: &PatientId) -> Result<Option<Patient>>;

    /// Stores a patient, replacing any previous record with the same ID.
    fn save(&self, patient: &Patient) -> Result<()>;

    /// Lists every stored patient.
    fn all(&self) -> Result<Vec<Patient>>;
}

/// A `HashMap` backed repository.
#[derive(Default)]
pub struct InMemoryPatientRepository {
    patients: RwLock<HashMap<PatientId, Patient>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatientRepository for InMemoryPatientRepository {
    fn get(&self, id: &PatientId) -> Result<Option<Patient>> {
        let patients = self.patients.read().unwrap_or_else(PoisonError::into_inner);
        Ok(patients.get(id).map(Patient::snapshot))
    }

    fn save(&self, patient: &Patient) -> Result<()> {
        debug!(patient_id = %patient.aggregate_id(), "saving patient");
        let mut patients = self.patients.write().unwrap_or_else(PoisonError::into_inner);
        patients.insert(patient.aggregate_id().clone(), patient.snapshot());
        Ok(())
    }

    fn all(&self) -> Result<Vec<Patient>> {
        let patients = self.patients.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Patient> = patients.values().map(Patient::snapshot).collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(all)
    }
}

/// A repository keeping one CSV row per patient in a single file.
///
/// Rows are [`PatientRecord`]s with a header line. Every loaded row goes back through the
/// registration checks, so a hand-edited file with an invalid row fails with
/// [`MentcareError::Validation`] instead of producing a patient. `save` rewrites the whole file
/// through a temporary file and a rename; a missing file reads as empty.
pub struct CsvPatientRepository {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl CsvPatientRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_records(&self) -> anyhow::Result<Vec<PatientRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("failed to open `{}`", self.path.display()))?;

        reader
            .deserialize()
            .collect::<Result<Vec<PatientRecord>, csv::Error>>()
            .with_context(|| format!("failed to parse `{}`", self.path.display()))
    }

    fn write_records(&self, records: &[PatientRecord]) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create `{}`", dir.display()))?;
        }

        let tmp = self.path.with_extension("csv.tmp");
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("failed to create `{}`", tmp.display()))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace `{}`", self.path.display()))?;
        Ok(())
    }
}

impl PatientRepository for CsvPatientRepository {
    fn get(&self, id: &PatientId) -> Result<Option<Patient>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.read_records().map_err(MentcareError::Repository)?;

        records
            .into_iter()
            .find(|r| &r.id == id)
            .map(Patient::try_from)
            .transpose()
    }

    fn save(&self, patient: &Patient) -> Result<()> {
        debug!(patient_id = %patient.aggregate_id(), path = %self.path.display(), "saving patient");
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.read_records().map_err(MentcareError::Repository)?;

        let record = PatientRecord::from(patient);
        match records.iter_mut().find(|r| &r.id == patient.aggregate_id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        self.write_records(&records)
            .map_err(MentcareError::Repository)
    }

    fn all(&self) -> Result<Vec<Patient>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.read_records().map_err(MentcareError::Repository)?;
        records.into_iter().map(Patient::try_from).collect()
    }
}
