//! Output module for tagstat
//!
//! Two kinds of output leave a run:
//! - the count table, written as CSV with the header
//!   `date,tag,questions_count` and rows sorted by date, then tag
//! - the run summary on stdout, either human-readable lines plus a table or
//!   a single JSON document
//!
//! # Examples
//!
//! ```no_run
//! use tagstat::output::write_counts;
//! use tagstat::types::{BucketDate, CountTable, Tag};
//! use chrono::NaiveDate;
//!
//! let mut table = CountTable::new();
//! let day = BucketDate::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//! table.increment(day, &Tag::new("rust").unwrap());
//!
//! let rows = write_counts("data/questions_by_date.csv".as_ref(), &table).unwrap();
//! assert_eq!(rows, 1);
//! ```

use crate::aggregation::{TagOutcome, TagReport};
use crate::error::Result;
use crate::types::{CountRow, CountTable, Granularity};
use crate::window::QueryWindow;
use colored::Colorize;
use csv::WriterBuilder;
use prettytable::{Table, format, row};
use serde_json::json;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;

/// Column names of the output table
pub const HEADER: [&str; 3] = ["date", "tag", "questions_count"];

/// Sort rows by date, then tag
pub fn sort_rows(rows: &mut [CountRow]) {
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.tag.cmp(&b.tag)));
}

/// Write the header and `rows` as CSV, returning the number of data rows
///
/// The header is written even when there are no rows.
pub fn write_rows<W: io::Write>(writer: W, rows: &[CountRow]) -> Result<usize> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(rows.len())
}

/// Write a finished table to `path`, creating missing parent directories
pub fn write_counts(path: &Path, table: &CountTable) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut rows = table.rows();
    sort_rows(&mut rows);

    let file = File::create(path)?;
    let written = write_rows(file, &rows)?;
    debug!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

/// Everything the final summary reports about a run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub window: &'a QueryWindow,
    pub granularity: Granularity,
    pub reports: &'a [TagReport],
    pub output: &'a Path,
    pub rows: usize,
}

impl RunSummary<'_> {
    /// Questions counted over all tags
    pub fn total_questions(&self) -> u64 {
        self.reports.iter().map(|r| r.fetched).sum()
    }
}

/// Trait for run summary formatters
pub trait SummaryFormatter {
    /// Line printed as soon as a tag is done, if any
    fn format_tag(&self, report: &TagReport) -> Option<String>;

    /// Final summary of the run
    fn format_run(&self, summary: &RunSummary<'_>) -> String;
}

/// Human-readable summary
pub struct HumanFormatter {
    color: bool,
}

impl HumanFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    fn status_label(outcome: &TagOutcome) -> &'static str {
        match outcome {
            TagOutcome::Exhausted => "complete",
            TagOutcome::PageCapReached => "page cap",
            TagOutcome::Failed { .. } => "failed",
        }
    }

    fn paint_ok(&self, text: String) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text
        }
    }

    fn paint_err(&self, text: String) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text
        }
    }
}

impl SummaryFormatter for HumanFormatter {
    fn format_tag(&self, report: &TagReport) -> Option<String> {
        if let TagOutcome::Failed { error } = &report.outcome {
            return Some(format!(
                "{}\n{}",
                self.paint_err(format!("ERROR: {error}")),
                self.paint_err(format!(
                    "Stopped: tag={} | fetched={}",
                    report.tag, report.fetched
                ))
            ));
        }

        let mut line = format!("Done: tag={} | fetched={}", report.tag, report.fetched);
        if let Some(last) = report.last_created {
            line.push_str(&format!(" | last_created_utc={}", last.to_rfc3339()));
        }
        if report.skipped > 0 {
            line.push_str(&format!(" | skipped={}", report.skipped));
        }
        if report.outcome == TagOutcome::PageCapReached {
            line.push_str(&format!(" | page cap reached after {} pages", report.pages));
        }

        Some(self.paint_ok(line))
    }

    fn format_run(&self, summary: &RunSummary<'_>) -> String {
        let mut output = format!(
            "period_utc: {} | grain={}\n",
            summary.window, summary.granularity
        );

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![
            b -> "Tag",
            b -> "Questions",
            b -> "Skipped",
            b -> "Pages",
            b -> "Last Created (UTC)",
            b -> "Status"
        ]);

        for report in summary.reports {
            let last_created = report
                .last_created
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(row![
                report.tag,
                r -> Self::format_number(report.fetched),
                r -> Self::format_number(report.skipped),
                r -> report.pages,
                last_created,
                Self::status_label(&report.outcome)
            ]);
        }

        table.add_row(row![
            b -> "TOTAL",
            rb -> Self::format_number(summary.total_questions()),
            "",
            "",
            "",
            ""
        ]);

        output.push_str(&table.to_string());
        output.push_str(&self.paint_ok(format!(
            "Saved: {} | rows={}",
            summary.output.display(),
            summary.rows
        )));
        output
    }
}

/// JSON summary, printed once at the end
pub struct JsonFormatter;

impl SummaryFormatter for JsonFormatter {
    fn format_tag(&self, _report: &TagReport) -> Option<String> {
        None
    }

    fn format_run(&self, summary: &RunSummary<'_>) -> String {
        let output = json!({
            "window": {
                "start": summary.window.start().to_rfc3339(),
                "end": summary.window.end().to_rfc3339(),
                "first_day": summary.window.first_day().to_string(),
                "last_day": summary.window.last_day().to_string(),
            },
            "granularity": summary.granularity,
            "tags": summary.reports,
            "total_questions": summary.total_questions(),
            "output": summary.output.display().to_string(),
            "rows": summary.rows,
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
    }
}

/// Get formatter based on output preference
pub fn get_formatter(json: bool, color: bool) -> Box<dyn SummaryFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter::new(color))
    }
}
