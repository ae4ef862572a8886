/// # Mentcare clinic demo
///
/// Wires the registry together: settings, logging, a repository (CSV file or in memory), the dispatcher with
/// the monthly statistics projection and the high-risk alerter, then registers a few patients,
/// changes a risk level and writes the current month's report.
///
/// ## Usage
///
/// ```sh
/// cargo run --example clinic [settings.json]
/// ```
use std::sync::Arc;

use chrono::Datelike;
use mentcare_events::{
    ChangeRisk, Clock, CsvPatientRepository, CsvReportWriter, Dispatcher, EventType, FnConsumer,
    HighRiskAlerter, InMemoryPatientRepository, JsonReportWriter, LogAlertSink,
    MonthlyPatientStats, PatientRepository, PatientService, RegisterPatient, ReportFormat,
    ReportService, ReportWriter, RiskLevel, Settings, SystemClock, logging,
};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    logging::init_logging(&settings.log_filter);

    let dispatcher = Arc::new(Dispatcher::new());

    let stats = Arc::new(MonthlyPatientStats::new());
    dispatcher.subscribe(EventType::PatientRegistered, stats.clone());
    dispatcher.subscribe(EventType::RiskChanged, stats.clone());

    let alerter = Arc::new(HighRiskAlerter::new(Arc::new(LogAlertSink::new(
        settings.alert_recipient.clone(),
    ))));
    dispatcher.subscribe(EventType::PatientRegistered, alerter.clone());
    dispatcher.subscribe(EventType::RiskChanged, alerter);

    dispatcher.subscribe(
        EventType::DomainEvent,
        Arc::new(FnConsumer::new("audit", |event| {
            info!(
                event_id = %event.id(),
                event_type = %event.event_type(),
                patient_id = %event.patient_id(),
                "audit"
            );
            Ok(())
        })),
    );

    match settings.data_file.clone() {
        Some(path) => run(&settings, Arc::new(CsvPatientRepository::new(path)), dispatcher, stats),
        None => run(&settings, Arc::new(InMemoryPatientRepository::new()), dispatcher, stats),
    }
}

fn run<R: PatientRepository>(
    settings: &Settings,
    repository: Arc<R>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<MonthlyPatientStats>,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock;
    let service = PatientService::new(repository, dispatcher);

    let registrations = [
        ("p001", "Max Mustermann", "1980-01-12", "high"),
        ("p002", "Erika Musterfrau", "1972-05-03", "low"),
        ("p003", "Sabine Schulz", "1985-02-14", "medium"),
        ("p001", "Max Mustermann", "1980-01-12", "high"),
        ("p004", "Not Born Yet", "2999-01-01", "low"),
    ];

    for (id, name, birthdate, risk) in registrations {
        let result = RegisterPatient::parse(id, name, birthdate, risk)
            .and_then(|cmd| service.register(cmd, clock.now()));
        match result {
            Ok(patient) => info!(patient_id = %patient.id(), "registered"),
            Err(err) => error!(patient_id = id, error = %err, "registration rejected"),
        }
    }

    service.change_risk(ChangeRisk::new("p002", RiskLevel::High), clock.now())?;

    let now = clock.now();
    let writer: Arc<dyn ReportWriter> = match settings.report_format {
        ReportFormat::Json => Arc::new(JsonReportWriter::new(&settings.report_dir)),
        ReportFormat::Csv => Arc::new(CsvReportWriter::new(&settings.report_dir)),
    };
    let reports = ReportService::new(stats, writer);
    let report = reports.produce_report(now.year(), now.month())?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    for patient in service.list_patients()? {
        println!("{} ({})", patient.id(), patient.risk());
    }

    Ok(())
}
