//! Scribe QA tracker: scribe profiles, prospective QA sessions, providers and
//! the division/QA-track abbreviations that tie them together, persisted in
//! SQLite.

pub mod abbreviations;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod prospective;
pub mod providers;
pub mod query;
pub mod report;
pub mod schedule;
pub mod scribes;

pub use crate::error::{QaError, QaResult};
