use std::sync::{Arc, Barrier, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use mentcare_events::{
    AlertSink, ChangeRisk, Clock, Dispatcher, EventType, FixedClock, FnConsumer, HighRiskAlerter,
    InMemoryPatientRepository, JsonReportWriter, MentcareError, MonthlyCounts,
    MonthlyPatientStats, Patient, PatientId, PatientRepository, PatientService, RegisterPatient,
    ReportService, Result, RiskLevel,
};

type CallLog = Arc<Mutex<Vec<String>>>;

/// Repository fake recording every call into a shared log.
struct RecordingRepository {
    inner: InMemoryPatientRepository,
    log: CallLog,
}

impl PatientRepository for RecordingRepository {
    fn get(&self, id: &PatientId) -> Result<Option<Patient>> {
        self.log.lock().unwrap().push(format!("get {id}"));
        self.inner.get(id)
    }

    fn save(&self, patient: &Patient) -> Result<()> {
        self.log.lock().unwrap().push(format!("save {}", patient.id()));
        self.inner.save(patient)
    }

    fn all(&self) -> Result<Vec<Patient>> {
        self.inner.all()
    }
}

struct Registry {
    service: PatientService<RecordingRepository>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<MonthlyPatientStats>,
    log: CallLog,
}

fn registry() -> Registry {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Arc::new(Dispatcher::new());
    let stats = Arc::new(MonthlyPatientStats::new());
    dispatcher.subscribe(EventType::PatientRegistered, stats.clone());
    dispatcher.subscribe(EventType::RiskChanged, stats.clone());

    let publish_log = log.clone();
    dispatcher.subscribe(
        EventType::DomainEvent,
        Arc::new(FnConsumer::new("call_log", move |event| {
            publish_log
                .lock()
                .unwrap()
                .push(format!("publish {} {}", event.event_type(), event.patient_id()));
            Ok(())
        })),
    );

    let repository = Arc::new(RecordingRepository {
        inner: InMemoryPatientRepository::new(),
        log: log.clone(),
    });

    Registry {
        service: PatientService::new(repository, dispatcher.clone()),
        dispatcher,
        stats,
        log,
    }
}

fn march_15() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

fn register_p1(risk: RiskLevel) -> RegisterPatient {
    RegisterPatient::new(
        "p1",
        "Max Mustermann",
        NaiveDate::from_ymd_opt(1980, 1, 12).unwrap(),
        risk,
    )
}

#[test]
fn registration_counts_in_creation_month_only() {
    let registry = registry();

    let patient = registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();

    assert_eq!(patient.id(), &PatientId::new("p1"));
    assert_eq!(registry.stats.get_report(2024, 3).registered, 1);
    assert_eq!(registry.stats.get_report(2024, 4).registered, 0);
}

#[test]
fn returned_patient_has_no_pending_events() {
    use mentcare_events::Aggregate;

    let registry = registry();
    let mut patient = registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();

    assert!(patient.pull_events().is_empty());
}

#[test]
fn duplicate_registration_changes_nothing() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();
    registry.log.lock().unwrap().clear();

    let mut second = register_p1(RiskLevel::High);
    second.name = "Someone Else".to_string();
    let err = registry.service.register(second, march_15()).unwrap_err();

    assert!(matches!(err, MentcareError::DuplicateEntity(ref id) if id.as_str() == "p1"));
    assert_eq!(*registry.log.lock().unwrap(), vec!["get p1"]);
    assert_eq!(registry.stats.get_report(2024, 3).registered, 1);

    let stored = registry.service.find(&"p1".into()).unwrap().unwrap();
    assert_eq!(stored.name(), "Max Mustermann");
    assert_eq!(stored.risk(), RiskLevel::Low);
}

#[test]
fn future_birthdate_fails_without_side_effects() {
    let registry = registry();
    let tomorrow = (march_15() + Duration::days(1)).date_naive();

    let err = registry
        .service
        .register(
            RegisterPatient::new("p1", "Baby", tomorrow, RiskLevel::Low),
            march_15(),
        )
        .unwrap_err();

    assert!(matches!(err, MentcareError::Validation { .. }));
    assert_eq!(registry.stats.get_report(2024, 3), MonthlyCounts::default());
    assert_eq!(*registry.log.lock().unwrap(), vec!["get p1"]);
    assert!(registry.service.find(&"p1".into()).unwrap().is_none());
}

#[test]
fn save_happens_before_publish() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();

    assert_eq!(
        *registry.log.lock().unwrap(),
        vec!["get p1", "save p1", "publish PatientRegistered p1"]
    );
}

#[test]
fn consumer_failure_keeps_saved_record() {
    let registry = registry();
    registry.dispatcher.subscribe(
        EventType::PatientRegistered,
        Arc::new(FnConsumer::new("broken", |_| Err(anyhow!("mail server down")))),
    );

    let err = registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap_err();

    assert!(matches!(err, MentcareError::Handler { ref consumer, .. } if consumer == "broken"));
    // consumers subscribed before the broken one already ran
    assert_eq!(registry.stats.get_report(2024, 3).registered, 1);
    assert!(registry.service.find(&"p1".into()).unwrap().is_some());
}

#[test]
fn risk_change_is_saved_then_published() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();
    registry.log.lock().unwrap().clear();

    let patient = registry
        .service
        .change_risk(ChangeRisk::new("p1", RiskLevel::High), march_15())
        .unwrap();

    assert_eq!(patient.risk(), RiskLevel::High);
    assert_eq!(
        *registry.log.lock().unwrap(),
        vec!["get p1", "save p1", "publish RiskChanged p1"]
    );
    assert_eq!(registry.stats.get_report(2024, 3).risk_changes, 1);
}

#[test]
fn unchanged_risk_publishes_nothing() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();
    registry.log.lock().unwrap().clear();

    registry
        .service
        .change_risk(ChangeRisk::new("p1", RiskLevel::Low), march_15())
        .unwrap();

    assert_eq!(*registry.log.lock().unwrap(), vec!["get p1", "save p1"]);
    assert_eq!(registry.stats.get_report(2024, 3).risk_changes, 0);
}

#[test]
fn risk_change_of_unknown_patient_fails() {
    let registry = registry();
    let err = registry
        .service
        .change_risk(ChangeRisk::new("ghost", RiskLevel::High), march_15())
        .unwrap_err();

    assert!(matches!(err, MentcareError::PatientNotFound(_)));
    assert_eq!(*registry.log.lock().unwrap(), vec!["get ghost"]);
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl AlertSink for RecordingSink {
    fn notify(&self, _subject: &str, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[test]
fn high_risk_alerts_never_contain_names() {
    let registry = registry();
    let sink = Arc::new(RecordingSink::default());
    let alerter = Arc::new(HighRiskAlerter::new(sink.clone()));
    registry
        .dispatcher
        .subscribe(EventType::PatientRegistered, alerter.clone());
    registry.dispatcher.subscribe(EventType::RiskChanged, alerter);

    let clock = FixedClock(march_15());
    registry
        .service
        .register(register_p1(RiskLevel::High), clock.now())
        .unwrap();

    let messages = sink.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("p1"));
    assert!(!messages[0].contains("Mustermann"));
}

#[test]
fn report_service_writes_projection_snapshot() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::High), march_15())
        .unwrap();
    registry
        .service
        .register(
            RegisterPatient::parse("p2", "Erika Musterfrau", "1975-06-30", "medium").unwrap(),
            march_15(),
        )
        .unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let writer = JsonReportWriter::new(tmp.path());
    let reports = ReportService::new(registry.stats.clone(), Arc::new(writer.clone()));

    let report = reports.produce_report(2024, 3).unwrap();
    assert_eq!(report.counts.registered, 2);
    assert_eq!(report.counts.high, 1);
    assert_eq!(report.counts.medium, 1);

    let json = std::fs::read_to_string(writer.path_for(2024, 3)).unwrap();
    assert!(!json.contains("Erika"));

    let empty = reports.produce_report(2024, 4).unwrap();
    assert_eq!(empty.counts, MonthlyCounts::default());
}

#[test]
fn list_patients_returns_stored_snapshots() {
    let registry = registry();
    registry
        .service
        .register(register_p1(RiskLevel::Low), march_15())
        .unwrap();

    let patients = registry.service.list_patients().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].name(), "Max Mustermann");
}

/// Repository whose `get` waits until `parties` callers are inside it.
struct GatedRepository {
    inner: InMemoryPatientRepository,
    gate: Barrier,
}

impl PatientRepository for GatedRepository {
    fn get(&self, id: &PatientId) -> Result<Option<Patient>> {
        let found = self.inner.get(id);
        self.gate.wait();
        found
    }

    fn save(&self, patient: &Patient) -> Result<()> {
        self.inner.save(patient)
    }

    fn all(&self) -> Result<Vec<Patient>> {
        self.inner.all()
    }
}

#[test]
fn concurrent_registrations_of_one_id_are_not_serialized() {
    let dispatcher = Arc::new(Dispatcher::new());
    let stats = Arc::new(MonthlyPatientStats::new());
    dispatcher.subscribe(EventType::PatientRegistered, stats.clone());

    let repository = Arc::new(GatedRepository {
        inner: InMemoryPatientRepository::new(),
        gate: Barrier::new(2),
    });
    let service = Arc::new(PatientService::new(repository.clone(), dispatcher));

    // both callers pass the duplicate check before either saves
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.register(register_p1(RiskLevel::Low), march_15()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(stats.get_report(2024, 3).registered, 2);
    assert_eq!(repository.all().unwrap().len(), 1);
}

#[test]
fn serialized_registrations_of_one_id_yield_one_duplicate() {
    let registry = registry();
    let service = Arc::new(registry.service);
    let lock = Arc::new(Mutex::new(()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            let lock = lock.clone();
            std::thread::spawn(move || {
                let _per_id = lock.lock().unwrap();
                service.register(register_p1(RiskLevel::Low), march_15())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(MentcareError::DuplicateEntity(_))))
            .count(),
        3
    );
    assert_eq!(registry.stats.get_report(2024, 3).registered, 1);
}
