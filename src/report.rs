use std::{fs, path::PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::MonthlyCounts;

/// A monthly statistics report, as handed to a [`ReportWriter`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub counts: MonthlyCounts,
}

/// Outbound port for report output.
pub trait ReportWriter: Send + Sync {
    fn write(&self, report: &MonthlyReport) -> anyhow::Result<()>;
}

/// Writes each report as pretty-printed JSON to `<dir>/report-YYYY-MM.json`.
#[derive(Clone, Debug)]
pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, year: i32, month: u32) -> PathBuf {
        self.dir.join(format!("report-{year:04}-{month:02}.json"))
    }
}

impl ReportWriter for JsonReportWriter {
    fn write(&self, report: &MonthlyReport) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create report dir `{}`", self.dir.display()))?;

        let path = self.path_for(report.year, report.month);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write report `{}`", path.display()))?;

        info!(path = %path.display(), "report written");
        Ok(())
    }
}

/// Writes each report as a two-line CSV (header and values) to `<dir>/report-YYYY-MM.csv`.
#[derive(Clone, Debug)]
pub struct CsvReportWriter {
    dir: PathBuf,
}

impl CsvReportWriter {
    const HEADER: [&'static str; 7] = [
        "year",
        "month",
        "registered",
        "high",
        "medium",
        "low",
        "risk_changes",
    ];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, year: i32, month: u32) -> PathBuf {
        self.dir.join(format!("report-{year:04}-{month:02}.csv"))
    }
}

impl ReportWriter for CsvReportWriter {
    fn write(&self, report: &MonthlyReport) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create report dir `{}`", self.dir.display()))?;

        let path = self.path_for(report.year, report.month);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to write report `{}`", path.display()))?;

        let counts = &report.counts;
        writer.write_record(Self::HEADER)?;
        writer.write_record([
            report.year.to_string(),
            report.month.to_string(),
            counts.registered.to_string(),
            counts.high.to_string(),
            counts.medium.to_string(),
            counts.low.to_string(),
            counts.risk_changes.to_string(),
        ])?;
        writer.flush()?;

        info!(path = %path.display(), "report written");
        Ok(())
    }
}
