use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::error::{QaError, QaResult};

/// Months between evaluations, keyed by QA-track short code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct QaTrackIntervals(HashMap<String, i64>);

impl Default for QaTrackIntervals {
    fn default() -> Self {
        Self(
            [("M", 1), ("Q", 3), ("S", 6), ("A", 12)]
                .into_iter()
                .map(|(code, months)| (code.to_string(), months))
                .collect(),
        )
    }
}

impl QaTrackIntervals {
    pub fn from_path(path: &Path) -> QaResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let intervals: Self = serde_json::from_str(&raw)?;

        if let Some((code, months)) = intervals.0.iter().find(|(_, months)| **months < 0) {
            return Err(QaError::Validation(format!(
                "QA track {code} has a negative interval ({months})"
            )));
        }

        Ok(intervals)
    }

    /// Converts a QA-track short code to its interval. Codes missing from the
    /// mapping must themselves be a month count.
    pub fn months_for(&self, short_code: &str) -> QaResult<i64> {
        if let Some(months) = self.0.get(short_code) {
            return Ok(*months);
        }

        match short_code.trim().parse::<i64>() {
            Ok(months) if months >= 0 => Ok(months),
            _ => Err(QaError::Validation(format!(
                "QA track code '{short_code}' does not map to a month interval"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub qa_tracks_path: Option<PathBuf>,
    pub enforce_division_membership: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set, e.g. sqlite://qa_data.db?mode=rwc")?;
        let qa_tracks_path = std::env::var("QA_TRACKS_PATH").ok().map(PathBuf::from);
        let enforce_division_membership = match std::env::var("QA_ENFORCE_DIVISION") {
            Ok(raw) => parse_flag(&raw)
                .with_context(|| format!("QA_ENFORCE_DIVISION has invalid value '{raw}'"))?,
            Err(_) => true,
        };

        Ok(Self {
            database_url,
            qa_tracks_path,
            enforce_division_membership,
        })
    }

    pub fn qa_tracks(&self) -> anyhow::Result<QaTrackIntervals> {
        match &self.qa_tracks_path {
            Some(path) => QaTrackIntervals::from_path(path)
                .with_context(|| format!("failed to load QA tracks from {}", path.display())),
            None => Ok(QaTrackIntervals::default()),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
