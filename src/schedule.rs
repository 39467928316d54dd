use chrono::{Days, Months, NaiveDate, Utc};

use crate::error::{QaError, QaResult};
use crate::models::DueStatus;

/// Adds whole months, clamping to the last day of shorter months.
pub fn add_months(date: NaiveDate, months: i64) -> QaResult<NaiveDate> {
    let months = u32::try_from(months)
        .map_err(|_| QaError::Validation(format!("invalid QA interval: {months} months")))?;

    date.checked_add_months(Months::new(months))
        .ok_or_else(|| QaError::Validation(format!("{date} plus {months} months is out of range")))
}

/// Next evaluation date anchored on the solo start date.
pub fn derive_next_qa(solo_date: Option<NaiveDate>, interval_months: i64) -> QaResult<Option<NaiveDate>> {
    solo_date
        .map(|date| add_months(date, interval_months))
        .transpose()
}

pub fn parse_interval(raw: &str) -> QaResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(months) if months >= 0 => Ok(months),
        _ => Err(QaError::Validation(format!(
            "QA track must be a non-negative whole number of months, got '{raw}'"
        ))),
    }
}

pub fn classify_due(next_qa_date: NaiveDate, as_of: NaiveDate) -> DueStatus {
    if next_qa_date < as_of {
        DueStatus::Overdue
    } else {
        DueStatus::DueSoon
    }
}

/// Last date inside a due window. Negative windows collapse to `as_of`.
pub fn horizon_date(as_of: NaiveDate, within_days: i64) -> QaResult<NaiveDate> {
    let days = u64::try_from(within_days).unwrap_or(0);
    as_of
        .checked_add_days(Days::new(days))
        .ok_or_else(|| QaError::Validation(format!("a {within_days}-day window from {as_of} is out of range")))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Title-cases a name: the first letter of every alphabetic run is upper-cased
/// and the rest lower-cased. Surrounding whitespace is dropped and inner runs
/// collapse to a single space.
pub fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut previous_is_letter = false;

    for (index, word) in raw.split_whitespace().enumerate() {
        if index > 0 {
            normalized.push(' ');
            previous_is_letter = false;
        }

        for ch in word.chars() {
            if ch.is_alphabetic() {
                if previous_is_letter {
                    normalized.extend(ch.to_lowercase());
                } else {
                    normalized.extend(ch.to_uppercase());
                }
                previous_is_letter = true;
            } else {
                normalized.push(ch);
                previous_is_letter = false;
            }
        }
    }

    normalized
}
