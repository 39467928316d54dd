use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{DueQa, DueStatus};
use crate::query::ProspectiveRow;

pub fn build_report(
    as_of: NaiveDate,
    within_days: i64,
    due: &[DueQa],
    prospective: &[ProspectiveRow],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Scribe QA Report");
    let _ = writeln!(
        output,
        "Generated {} (due window {} days)",
        as_of, within_days
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Due QAs");

    if due.is_empty() {
        let _ = writeln!(output, "No QAs due in this window.");
    } else {
        let overdue = due.iter().filter(|d| d.status == DueStatus::Overdue).count();
        let _ = writeln!(output, "{} due, {} overdue.", due.len(), overdue);
        for entry in due {
            let _ = writeln!(
                output,
                "- {} ({}) due {}: {}",
                entry.scribe,
                division_label(&entry.divisions),
                entry.next_qa_date,
                status_label(entry)
            );
        }
    }

    let mut recent = prospective.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Prospective QAs");

    if recent.is_empty() {
        let _ = writeln!(output, "No prospective QAs recorded.");
    } else {
        for row in recent.iter().take(5) {
            let _ = write!(
                output,
                "- {} on {} ({}) with {}, assessed by {}",
                row.scribe, row.date, row.division, row.provider, row.assessor
            );
            if row.comments.is_empty() {
                let _ = writeln!(output);
            } else {
                let _ = writeln!(output, ": {}", row.comments);
            }
        }
    }

    output
}

fn division_label(divisions: &[String]) -> String {
    if divisions.is_empty() {
        "no division".to_string()
    } else {
        divisions.join("/")
    }
}

fn status_label(entry: &DueQa) -> String {
    match entry.status {
        DueStatus::Overdue => format!("overdue by {} days", -entry.days_until_due),
        DueStatus::DueSoon if entry.days_until_due == 0 => "due today".to_string(),
        DueStatus::DueSoon => format!("in {} days", entry.days_until_due),
    }
}
