use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::QaError;

/// Interval used for scribes that are not yet on a QA track.
pub const DEFAULT_QA_INTERVAL_MONTHS: i64 = 9;

/// Deserializes through `FromStr`, so CSV rows and CLI flags accept the
/// same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AbbreviationKind {
    #[serde(rename = "DIV")]
    Division,
    #[serde(rename = "QAT")]
    QaTrack,
}

impl AbbreviationKind {
    pub fn tag(self) -> &'static str {
        match self {
            AbbreviationKind::Division => "DIV",
            AbbreviationKind::QaTrack => "QAT",
        }
    }
}

impl fmt::Display for AbbreviationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AbbreviationKind {
    type Err = QaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DIV" | "DIVISION" => Ok(AbbreviationKind::Division),
            "QAT" | "QA_TRACK" => Ok(AbbreviationKind::QaTrack),
            other => Err(QaError::Validation(format!(
                "unknown abbreviation kind '{other}' (expected DIV or QAT)"
            ))),
        }
    }
}

impl TryFrom<String> for AbbreviationKind {
    type Error = QaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Abbreviation {
    pub uid: String,
    pub long_name: String,
    pub short_code: String,
    pub kind: AbbreviationKind,
}

/// Registration input for a scribe. Division and QA track are long names.
#[derive(Debug, Clone, Default)]
pub struct NewScribe {
    pub name: String,
    pub division: String,
    pub qa_track: Option<String>,
    pub solo_date: Option<NaiveDate>,
    pub training_score: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScribeProfile {
    pub name: String,
    pub solo_start_date: Option<NaiveDate>,
    pub qa_interval_months: i64,
    pub last_qa_date: Option<NaiveDate>,
    pub next_qa_date: Option<NaiveDate>,
    pub total_qa_count: i64,
    pub final_training_score: Option<String>,
    pub divisions: Vec<String>,
    pub average_qa_eval_score: Option<f64>,
    pub qa_form_score: Option<f64>,
    pub qa_rating: Option<f64>,
    pub qa_track_score: Option<f64>,
    pub provider_eval_score: Option<f64>,
    pub is_assessor: bool,
}

/// Input for a prospective QA session. Division is a long name.
#[derive(Debug, Clone)]
pub struct NewProspective {
    pub scribe: String,
    pub date: NaiveDate,
    pub division: String,
    pub assessor: String,
    pub provider: String,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectiveRecord {
    pub uid: String,
    pub date: NaiveDate,
    pub scribe: String,
    pub division: String,
    pub assessor: String,
    pub provider: String,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRecord {
    pub name: String,
    pub division: String,
    pub subspecialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DivisionRoster {
    pub scribes: Vec<String>,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueStatus {
    Overdue,
    DueSoon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueQa {
    pub scribe: String,
    pub next_qa_date: NaiveDate,
    pub divisions: Vec<String>,
    pub status: DueStatus,
    pub days_until_due: i64,
}
