//! # mentcare_events
//!
//! An event-driven patient registry built from four pieces:
//!
//! - a [`Patient`] aggregate that validates itself and buffers the [`Event`]s it produces;
//! - a [`Dispatcher`] routing published events to [`EventConsumer`]s by [`EventType`],
//!   including consumers subscribed under an ancestor type;
//! - a [`MonthlyPatientStats`] projection folding events into per-month counters;
//! - a [`PatientService`] that saves aggregates through a [`PatientRepository`] and only then
//!   publishes their events.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use mentcare_events::{
//!     Dispatcher, EventType, InMemoryPatientRepository, MonthlyPatientStats, PatientService,
//!     RegisterPatient, RiskLevel,
//! };
//!
//! let dispatcher = Arc::new(Dispatcher::new());
//! let stats = Arc::new(MonthlyPatientStats::new());
//! dispatcher.subscribe(EventType::PatientRegistered, stats.clone());
//!
//! let service = PatientService::new(Arc::new(InMemoryPatientRepository::new()), dispatcher);
//! let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
//! let birthdate = NaiveDate::from_ymd_opt(1980, 1, 12).unwrap();
//!
//! service
//!     .register(RegisterPatient::new("p1", "Max Mustermann", birthdate, RiskLevel::High), now)
//!     .unwrap();
//!
//! assert_eq!(stats.get_report(2024, 3).registered, 1);
//! assert_eq!(stats.get_report(2024, 4).registered, 0);
//! ```

pub use uuid::Uuid;

mod aggregate;
mod alert;
mod clock;
mod command;
mod config;
mod consumer;
mod dispatcher;
mod error;
mod events;
pub mod logging;
mod patient;
pub mod projection;
mod report;
mod repository;
mod service;

pub use aggregate::Aggregate;
pub use alert::{AlertSink, HighRiskAlerter, LogAlertSink};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{ChangeRisk, RegisterPatient};
pub use config::{ReportFormat, Settings};
pub use consumer::{EventConsumer, FnConsumer};
pub use dispatcher::Dispatcher;
pub use error::{MentcareError, Result};
pub use events::{Event, EventPayload, EventType};
pub use patient::{Patient, PatientId, PatientRecord, RiskLevel};
pub use projection::{MonthlyCounts, MonthlyPatientStats};
pub use report::{CsvReportWriter, JsonReportWriter, MonthlyReport, ReportWriter};
pub use repository::{CsvPatientRepository, InMemoryPatientRepository, PatientRepository};
pub use service::{PatientService, ReportService};
