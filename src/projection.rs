//! Monthly patient statistics, folded from published events.
//!
//! The read model is keyed by `(year, month)` of each event's `occurred_at`. It only ever sees
//! what events carry (patient IDs and risk categories), so reports cannot contain names or
//! birthdates.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Event, EventConsumer, EventPayload, RiskLevel};

/// Counters for a single month. Unseen months read as all zeroes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounts {
    pub registered: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub risk_changes: u64,
}

impl MonthlyCounts {
    fn record_registration(&mut self, risk: RiskLevel) {
        self.registered += 1;
        match risk {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

/// Period key: `(year, month)`, month in `1..=12`.
pub type Period = (i32, u32);

/// Projection counting registrations (by risk category) and risk changes per month.
///
/// Subscribe it under [`EventType::PatientRegistered`](crate::EventType::PatientRegistered) and
/// [`EventType::RiskChanged`](crate::EventType::RiskChanged). Counters only grow.
#[derive(Default)]
pub struct MonthlyPatientStats {
    periods: RwLock<HashMap<Period, MonthlyCounts>>,
}

impl MonthlyPatientStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for the given month; zeroes when nothing was recorded for it.
    pub fn get_report(&self, year: i32, month: u32) -> MonthlyCounts {
        let periods = self.periods.read().unwrap_or_else(PoisonError::into_inner);
        periods.get(&(year, month)).copied().unwrap_or_default()
    }

    /// Every month with at least one recorded event, in chronological order.
    pub fn periods(&self) -> Vec<Period> {
        let periods = self.periods.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<Period> = periods.keys().copied().collect();
        keys.sort();
        keys
    }

    fn fold(&self, event: &Event) {
        let at = event.occurred_at();
        let period = (at.year(), at.month());

        let mut periods = self.periods.write().unwrap_or_else(PoisonError::into_inner);
        let counts = periods.entry(period).or_default();
        match event.payload() {
            EventPayload::PatientRegistered { risk, .. } => counts.record_registration(*risk),
            EventPayload::RiskChanged { .. } => counts.risk_changes += 1,
        }
        trace!(year = period.0, month = period.1, counts = ?counts, "projection updated");
    }
}

impl EventConsumer for MonthlyPatientStats {
    fn name(&self) -> &str {
        "monthly_patient_stats"
    }

    fn process(&self, event: &Event) -> anyhow::Result<()> {
        self.fold(event);
        Ok(())
    }
}
