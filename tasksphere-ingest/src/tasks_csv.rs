//! Parse task seed CSVs into typed seeds.
//!
//! Expected header:
//!   title,description,priority,status,estimated_hours,due_date,assigned_to
//!
//! Seed files are authored, not scraped, so bad rows are errors (with row
//! numbers) rather than silently skipped.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use tasksphere_core::{Priority, TaskStatus};

use crate::types::TaskSeed;

const EXPECTED_HEADER: [&str; 7] = [
    "title",
    "description",
    "priority",
    "status",
    "estimated_hours",
    "due_date",
    "assigned_to",
];

/// Parse a task CSV file, returning all seeds or the first row error.
pub fn parse_tasks_csv(path: impl AsRef<Path>) -> Result<Vec<TaskSeed>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;

    let header = rdr.headers().context("reading CSV header")?.clone();
    let got: Vec<&str> = header.iter().collect();
    if got != EXPECTED_HEADER {
        bail!(
            "unexpected CSV header {:?} (expected {:?})",
            got,
            EXPECTED_HEADER
        );
    }

    let mut seeds = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // Row 1 is the header; data rows start at 2.
        let row = i + 2;
        let record = result.with_context(|| format!("row {row}"))?;
        seeds.push(parse_record(&record, row)?);
    }
    Ok(seeds)
}

fn parse_record(record: &csv::StringRecord, row: usize) -> Result<TaskSeed> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let title = field(0);
    if title.is_empty() {
        bail!("row {row}: title is required");
    }

    let priority_raw = field(2);
    let Some(priority) = Priority::parse(priority_raw) else {
        bail!("row {row}: unknown priority `{priority_raw}`");
    };

    let status_raw = field(3);
    let Some(status) = TaskStatus::parse(status_raw) else {
        bail!("row {row}: unknown status `{status_raw}`");
    };

    let estimated_hours = match field(4) {
        "" => None,
        raw => {
            let hours: f64 = raw
                .parse()
                .with_context(|| format!("row {row}: bad estimated_hours `{raw}`"))?;
            if hours <= 0.0 {
                bail!("row {row}: estimated_hours must be positive, got `{raw}`");
            }
            Some(hours)
        }
    };

    let due_date = match field(5) {
        "" => None,
        raw => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("row {row}: bad due_date `{raw}` (expected YYYY-MM-DD)"))?,
        ),
    };

    let assigned_to = match field(6) {
        "" => None,
        uid => Some(uid.to_string()),
    };

    Ok(TaskSeed {
        title: title.to_string(),
        description: field(1).to_string(),
        priority,
        status,
        estimated_hours,
        due_date,
        assigned_to,
    })
}
