use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::abbreviations::AbbreviationRegistry;
use crate::config::QaTrackIntervals;
use crate::error::{QaError, QaResult};
use crate::models::{AbbreviationKind, NewScribe, ScribeProfile, DEFAULT_QA_INTERVAL_MONTHS};
use crate::schedule;

const UNSET_TRAINING_SCORE: &str = "0.0";

#[derive(Debug, Clone)]
pub struct ScribeStore {
    pool: SqlitePool,
    registry: AbbreviationRegistry,
    intervals: QaTrackIntervals,
    write_lock: Arc<Mutex<()>>,
}

impl ScribeStore {
    pub fn new(pool: SqlitePool, registry: AbbreviationRegistry, intervals: QaTrackIntervals) -> Self {
        Self {
            pool,
            registry,
            intervals,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn register(&self, scribe: NewScribe) -> QaResult<ScribeProfile> {
        let name = schedule::normalize_name(&scribe.name);
        if name.is_empty() {
            return Err(QaError::Validation("scribe name is required".to_string()));
        }

        let division = self
            .registry
            .resolve_to_short(&scribe.division, AbbreviationKind::Division)
            .await?;
        let qa_interval_months = self.resolve_interval(scribe.qa_track.as_deref()).await?;
        let next_qa_date = schedule::derive_next_qa(scribe.solo_date, qa_interval_months)?;
        let final_training_score = scribe
            .training_score
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(normalize_score)
            .transpose()?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO scribe_profiles
            (name, solo_start_date, qa_interval_months, next_qa_date, final_training_score)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(scribe.solo_date)
        .bind(qa_interval_months)
        .bind(next_qa_date)
        .bind(&final_training_score)
        .execute(&mut *tx)
        .await
        .map_err(|err| QaError::from_insert(err, format!("scribe {name}")))?;

        sqlx::query("INSERT INTO scribe_divisions (scribe_name, division, position) VALUES (?, ?, 0)")
            .bind(&name)
            .bind(&division)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(scribe = %name, %division, qa_interval_months, "registered scribe");

        Ok(ScribeProfile {
            name,
            solo_start_date: scribe.solo_date,
            qa_interval_months,
            last_qa_date: None,
            next_qa_date,
            total_qa_count: 0,
            final_training_score,
            divisions: vec![division],
            average_qa_eval_score: None,
            qa_form_score: None,
            qa_rating: None,
            qa_track_score: None,
            provider_eval_score: None,
            is_assessor: false,
        })
    }

    pub async fn remove(&self, name: &str) -> QaResult<()> {
        let name = schedule::normalize_name(name);
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM scribe_divisions WHERE scribe_name = ?")
            .bind(&name)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM scribe_profiles WHERE name = ?")
            .bind(&name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(QaError::NotFound(format!("scribe {name}")));
        }

        tx.commit().await?;
        tracing::info!(scribe = %name, "removed scribe");
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> QaResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM scribe_profiles WHERE name = ?")
            .bind(schedule::normalize_name(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Division short codes of a scribe, in membership order.
    pub async fn divisions_of(&self, name: &str) -> QaResult<Vec<String>> {
        let name = schedule::normalize_name(name);
        if !self.exists(&name).await? {
            return Err(QaError::NotFound(format!("scribe {name}")));
        }
        fetch_divisions(&self.pool, &name).await
    }

    /// Fetches a working copy of the profile. Changes made through the handle
    /// are only persisted by [`ScribeStore::save`].
    pub async fn load(&self, name: &str) -> QaResult<ScribeProfileHandle> {
        let name = schedule::normalize_name(name);
        let row = sqlx::query(
            r#"
            SELECT name, solo_start_date, qa_interval_months, last_qa_date, next_qa_date,
                   total_qa_count, final_training_score, average_qa_eval_score, qa_form_score,
                   qa_rating, qa_track_score, provider_eval_score, is_assessor
            FROM scribe_profiles
            WHERE name = ?
            "#,
        )
        .bind(&name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| QaError::NotFound(format!("scribe {name}")))?;

        let divisions = fetch_divisions(&self.pool, &name).await?;
        tracing::debug!(scribe = %name, "loaded scribe profile");

        Ok(ScribeProfileHandle {
            profile: profile_from_row(&row, divisions),
            registry: self.registry.clone(),
        })
    }

    /// Writes the full mutable field set and membership list in one transaction.
    pub async fn save(&self, handle: &ScribeProfileHandle) -> QaResult<()> {
        let profile = &handle.profile;
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE scribe_profiles
            SET solo_start_date = ?, qa_interval_months = ?, last_qa_date = ?, next_qa_date = ?,
                total_qa_count = ?, final_training_score = ?, average_qa_eval_score = ?,
                qa_form_score = ?, qa_rating = ?, qa_track_score = ?, provider_eval_score = ?,
                is_assessor = ?
            WHERE name = ?
            "#,
        )
        .bind(profile.solo_start_date)
        .bind(profile.qa_interval_months)
        .bind(profile.last_qa_date)
        .bind(profile.next_qa_date)
        .bind(profile.total_qa_count)
        .bind(&profile.final_training_score)
        .bind(profile.average_qa_eval_score)
        .bind(profile.qa_form_score)
        .bind(profile.qa_rating)
        .bind(profile.qa_track_score)
        .bind(profile.provider_eval_score)
        .bind(profile.is_assessor)
        .bind(&profile.name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(QaError::NotFound(format!("scribe {}", profile.name)));
        }

        sqlx::query("DELETE FROM scribe_divisions WHERE scribe_name = ?")
            .bind(&profile.name)
            .execute(&mut *tx)
            .await?;

        for (position, division) in profile.divisions.iter().enumerate() {
            sqlx::query("INSERT INTO scribe_divisions (scribe_name, division, position) VALUES (?, ?, ?)")
                .bind(&profile.name)
                .bind(division)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(scribe = %profile.name, "saved scribe profile");
        Ok(())
    }

    async fn resolve_interval(&self, qa_track: Option<&str>) -> QaResult<i64> {
        let Some(track) = qa_track.map(str::trim).filter(|track| !track.is_empty()) else {
            return Ok(DEFAULT_QA_INTERVAL_MONTHS);
        };

        match self
            .registry
            .resolve_to_short(track, AbbreviationKind::QaTrack)
            .await
        {
            Ok(code) => self.intervals.months_for(&code),
            Err(QaError::NotFound(_)) => {
                tracing::warn!(qa_track = track, "unknown QA track, using default interval");
                Ok(DEFAULT_QA_INTERVAL_MONTHS)
            }
            Err(err) => Err(err),
        }
    }
}

async fn fetch_divisions(pool: &SqlitePool, name: &str) -> QaResult<Vec<String>> {
    let divisions: Vec<String> = sqlx::query_scalar(
        "SELECT division FROM scribe_divisions WHERE scribe_name = ? ORDER BY position",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;
    Ok(divisions)
}

fn profile_from_row(row: &SqliteRow, divisions: Vec<String>) -> ScribeProfile {
    ScribeProfile {
        name: row.get("name"),
        solo_start_date: row.get("solo_start_date"),
        qa_interval_months: row.get("qa_interval_months"),
        last_qa_date: row.get("last_qa_date"),
        next_qa_date: row.get("next_qa_date"),
        total_qa_count: row.get("total_qa_count"),
        final_training_score: row.get("final_training_score"),
        divisions,
        average_qa_eval_score: row.get("average_qa_eval_score"),
        qa_form_score: row.get("qa_form_score"),
        qa_rating: row.get("qa_rating"),
        qa_track_score: row.get("qa_track_score"),
        provider_eval_score: row.get("provider_eval_score"),
        is_assessor: row.get("is_assessor"),
    }
}

fn parse_score(raw: &str, field: &str) -> QaResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(QaError::Validation(format!("{field} must be numeric, got '{raw}'"))),
    }
}

/// Numeric scores are kept as plain decimal strings: `85` becomes `"85.0"`.
fn normalize_score(raw: &str) -> QaResult<String> {
    let text = parse_score(raw, "training score")?.to_string();
    if text.contains('.') {
        Ok(text)
    } else {
        Ok(format!("{text}.0"))
    }
}

/// Snapshot of one scribe profile with staged mutations.
#[derive(Debug, Clone)]
pub struct ScribeProfileHandle {
    profile: ScribeProfile,
    registry: AbbreviationRegistry,
}

impl ScribeProfileHandle {
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn solo_date(&self) -> Option<NaiveDate> {
        self.profile.solo_start_date
    }

    pub fn qa_interval_months(&self) -> i64 {
        self.profile.qa_interval_months
    }

    pub fn last_qa_date(&self) -> Option<NaiveDate> {
        self.profile.last_qa_date
    }

    pub fn next_qa_date(&self) -> Option<NaiveDate> {
        self.profile.next_qa_date
    }

    pub fn total_qa_count(&self) -> i64 {
        self.profile.total_qa_count
    }

    /// Final training score, `"0.0"` until one is recorded.
    pub fn final_training_score(&self) -> &str {
        self.profile
            .final_training_score
            .as_deref()
            .unwrap_or(UNSET_TRAINING_SCORE)
    }

    pub fn divisions(&self) -> &[String] {
        &self.profile.divisions
    }

    pub fn average_qa_eval_score(&self) -> Option<f64> {
        self.profile.average_qa_eval_score
    }

    pub fn qa_form_score(&self) -> Option<f64> {
        self.profile.qa_form_score
    }

    pub fn qa_rating(&self) -> Option<f64> {
        self.profile.qa_rating
    }

    pub fn qa_track_score(&self) -> Option<f64> {
        self.profile.qa_track_score
    }

    pub fn provider_eval_score(&self) -> Option<f64> {
        self.profile.provider_eval_score
    }

    pub fn is_assessor(&self) -> bool {
        self.profile.is_assessor
    }

    pub fn profile(&self) -> &ScribeProfile {
        &self.profile
    }

    pub fn update_solo_date(&mut self, solo_date: NaiveDate) -> QaResult<()> {
        self.profile.solo_start_date = Some(solo_date);
        self.refresh_next_qa()
    }

    pub fn update_qa_track(&mut self, raw: &str) -> QaResult<()> {
        self.profile.qa_interval_months = schedule::parse_interval(raw)?;
        self.refresh_next_qa()
    }

    pub fn update_provider_eval_score(&mut self, raw: &str) -> QaResult<()> {
        self.profile.provider_eval_score = Some(parse_score(raw, "provider evaluation score")?);
        Ok(())
    }

    pub fn set_assessor(&mut self, is_assessor: bool) {
        self.profile.is_assessor = is_assessor;
    }

    pub async fn add_division(&mut self, long_name: &str) -> QaResult<()> {
        let code = self
            .registry
            .resolve_to_short(long_name, AbbreviationKind::Division)
            .await?;

        if self.profile.divisions.contains(&code) {
            return Err(QaError::AlreadyMember {
                scribe: self.profile.name.clone(),
                division: code,
            });
        }

        self.profile.divisions.push(code);
        Ok(())
    }

    pub async fn remove_division(&mut self, long_name: &str) -> QaResult<()> {
        let code = self
            .registry
            .resolve_to_short(long_name, AbbreviationKind::Division)
            .await?;

        let Some(index) = self.profile.divisions.iter().position(|d| *d == code) else {
            return Err(QaError::NotMember {
                scribe: self.profile.name.clone(),
                division: code,
            });
        };

        self.profile.divisions.remove(index);
        Ok(())
    }

    /// Records the FFTS once; later attempts fail without touching the value.
    pub fn set_final_training_score(&mut self, raw: &str) -> QaResult<()> {
        if self.profile.final_training_score.is_some() {
            return Err(QaError::AlreadyFinalized {
                scribe: self.profile.name.clone(),
                field: "final training score",
            });
        }

        self.profile.final_training_score = Some(normalize_score(raw)?);
        Ok(())
    }

    /// Counts a completed evaluation and schedules the next one from its date.
    pub fn record_completed_qa(&mut self, qa_date: NaiveDate, form_score: f64) -> QaResult<()> {
        if !form_score.is_finite() {
            return Err(QaError::Validation("QA form score must be numeric".to_string()));
        }

        let previous = self.profile.total_qa_count;
        let average = match self.profile.average_qa_eval_score {
            Some(avg) if previous > 0 => (avg * previous as f64 + form_score) / (previous + 1) as f64,
            _ => form_score,
        };

        self.profile.total_qa_count = previous + 1;
        self.profile.last_qa_date = Some(qa_date);
        self.profile.qa_form_score = Some(form_score);
        self.profile.average_qa_eval_score = Some(average);
        self.refresh_next_qa()
    }

    fn refresh_next_qa(&mut self) -> QaResult<()> {
        let anchor = self.profile.last_qa_date.or(self.profile.solo_start_date);
        self.profile.next_qa_date = schedule::derive_next_qa(anchor, self.profile.qa_interval_months)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn store() -> ScribeStore {
        let pool = test_pool().await;
        let registry = AbbreviationRegistry::new(pool.clone());
        for (long_name, code, kind) in [
            ("Endocrinology", "END", AbbreviationKind::Division),
            ("Cardiology", "CAR", AbbreviationKind::Division),
            ("Semiannual", "S", AbbreviationKind::QaTrack),
            ("Weekly", "W", AbbreviationKind::QaTrack),
            ("Four Month", "4", AbbreviationKind::QaTrack),
        ] {
            registry.register(long_name, code, kind).await.unwrap();
        }
        ScribeStore::new(pool, registry, QaTrackIntervals::default())
    }

    fn jane() -> NewScribe {
        NewScribe {
            name: "jane doe".to_string(),
            division: "Endocrinology".to_string(),
            ..NewScribe::default()
        }
    }

    #[tokio::test]
    async fn registration_normalizes_the_name() {
        let store = store().await;
        let profile = store.register(jane()).await.unwrap();
        assert_eq!(profile.name, "Jane Doe");

        let handle = store.load("Jane Doe").await.unwrap();
        assert_eq!(handle.name(), "Jane Doe");
        assert_eq!(handle.divisions(), ["END".to_string()]);
        assert!(store.exists("JANE DOE").await.unwrap());
    }

    #[tokio::test]
    async fn next_qa_follows_the_track_interval() {
        let store = store().await;
        let profile = store
            .register(NewScribe {
                qa_track: Some("Semiannual".to_string()),
                solo_date: Some(date(2021, 3, 15)),
                ..jane()
            })
            .await
            .unwrap();

        assert_eq!(profile.qa_interval_months, 6);
        assert_eq!(profile.next_qa_date, Some(date(2021, 9, 15)));
    }

    #[tokio::test]
    async fn numeric_track_codes_are_used_directly() {
        let store = store().await;
        let profile = store
            .register(NewScribe {
                qa_track: Some("Four Month".to_string()),
                solo_date: Some(date(2021, 1, 10)),
                ..jane()
            })
            .await
            .unwrap();

        assert_eq!(profile.qa_interval_months, 4);
        assert_eq!(profile.next_qa_date, Some(date(2021, 5, 10)));
    }

    #[tokio::test]
    async fn missing_or_unknown_track_uses_default_interval() {
        let store = store().await;
        let untracked = store
            .register(NewScribe {
                solo_date: Some(date(2021, 1, 1)),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(untracked.qa_interval_months, DEFAULT_QA_INTERVAL_MONTHS);
        assert_eq!(untracked.next_qa_date, Some(date(2021, 10, 1)));

        let unknown = store
            .register(NewScribe {
                name: "sam roe".to_string(),
                qa_track: Some("Fortnightly".to_string()),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(unknown.qa_interval_months, DEFAULT_QA_INTERVAL_MONTHS);
        assert_eq!(unknown.next_qa_date, None);
    }

    #[tokio::test]
    async fn non_numeric_track_code_is_rejected() {
        let store = store().await;
        let result = store
            .register(NewScribe {
                qa_track: Some("Weekly".to_string()),
                ..jane()
            })
            .await;

        assert!(matches!(result, Err(QaError::Validation(_))));
        assert!(!store.exists("Jane Doe").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let again = store
            .register(NewScribe {
                name: "JANE DOE".to_string(),
                ..jane()
            })
            .await;

        assert!(matches!(again, Err(QaError::DuplicateEntry(_))));
    }

    #[tokio::test]
    async fn unknown_division_is_not_found() {
        let store = store().await;
        let result = store
            .register(NewScribe {
                division: "Neurology".to_string(),
                ..jane()
            })
            .await;

        assert!(matches!(result, Err(QaError::NotFound(_))));
    }

    #[tokio::test]
    async fn training_score_is_coerced_to_decimal_text() {
        let store = store().await;
        let profile = store
            .register(NewScribe {
                training_score: Some("85".to_string()),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(profile.final_training_score.as_deref(), Some("85.0"));

        let large = store
            .register(NewScribe {
                name: "lee park".to_string(),
                training_score: Some("1e16".to_string()),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(large.final_training_score.as_deref(), Some("10000000000000000.0"));

        let tiny = store
            .register(NewScribe {
                name: "ana ruiz".to_string(),
                training_score: Some("0.0000001".to_string()),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(tiny.final_training_score.as_deref(), Some("0.0000001"));

        let unscored = store
            .register(NewScribe {
                name: "sam roe".to_string(),
                ..jane()
            })
            .await
            .unwrap();
        assert_eq!(unscored.final_training_score, None);
        assert_eq!(store.load("sam roe").await.unwrap().final_training_score(), "0.0");

        let bad = store
            .register(NewScribe {
                name: "kim poe".to_string(),
                training_score: Some("great".to_string()),
                ..jane()
            })
            .await;
        assert!(matches!(bad, Err(QaError::Validation(_))));
    }

    #[tokio::test]
    async fn removal_is_not_silent() {
        let store = store().await;
        store.register(jane()).await.unwrap();

        store.remove("jane doe").await.unwrap();
        assert!(matches!(store.load("Jane Doe").await, Err(QaError::NotFound(_))));
        assert!(matches!(store.remove("Jane Doe").await, Err(QaError::NotFound(_))));
    }

    #[tokio::test]
    async fn division_round_trip_restores_membership() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();
        let original = handle.divisions().to_vec();

        handle.add_division("Cardiology").await.unwrap();
        assert_eq!(handle.divisions(), ["END".to_string(), "CAR".to_string()]);
        handle.remove_division("Cardiology").await.unwrap();

        assert_eq!(handle.divisions(), original.as_slice());
    }

    #[tokio::test]
    async fn membership_conflicts_are_reported() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();

        assert!(matches!(
            handle.add_division("Endocrinology").await,
            Err(QaError::AlreadyMember { .. })
        ));
        assert!(matches!(
            handle.remove_division("Cardiology").await,
            Err(QaError::NotMember { .. })
        ));
        assert!(matches!(
            handle.add_division("Neurology").await,
            Err(QaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn final_training_score_is_write_once() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();

        handle.set_final_training_score("91.5").unwrap();
        let second = handle.set_final_training_score("70");
        assert!(matches!(second, Err(QaError::AlreadyFinalized { .. })));
        assert_eq!(handle.final_training_score(), "91.5");

        store.save(&handle).await.unwrap();
        let mut reloaded = store.load("Jane Doe").await.unwrap();
        assert!(reloaded.set_final_training_score("60").is_err());
        assert_eq!(reloaded.final_training_score(), "91.5");
    }

    #[tokio::test]
    async fn typed_mutators_validate_input() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();

        assert!(matches!(handle.update_qa_track("six"), Err(QaError::Validation(_))));
        assert!(matches!(handle.update_qa_track("2.5"), Err(QaError::Validation(_))));
        assert!(matches!(
            handle.update_provider_eval_score("n/a"),
            Err(QaError::Validation(_))
        ));
        assert_eq!(handle.qa_interval_months(), DEFAULT_QA_INTERVAL_MONTHS);
        assert_eq!(handle.provider_eval_score(), None);
    }

    #[tokio::test]
    async fn save_persists_the_whole_field_set() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();

        handle.update_solo_date(date(2022, 1, 15)).unwrap();
        handle.update_qa_track("3").unwrap();
        handle.update_provider_eval_score("4.5").unwrap();
        handle.set_assessor(true);
        handle.add_division("Cardiology").await.unwrap();
        handle.set_final_training_score("88").unwrap();
        store.save(&handle).await.unwrap();

        let reloaded = store.load("jane doe").await.unwrap();
        assert_eq!(reloaded.solo_date(), Some(date(2022, 1, 15)));
        assert_eq!(reloaded.qa_interval_months(), 3);
        assert_eq!(reloaded.next_qa_date(), Some(date(2022, 4, 15)));
        assert_eq!(reloaded.provider_eval_score(), Some(4.5));
        assert!(reloaded.is_assessor());
        assert_eq!(reloaded.divisions(), ["END".to_string(), "CAR".to_string()]);
        assert_eq!(reloaded.final_training_score(), "88.0");
    }

    #[tokio::test]
    async fn staged_changes_are_not_persisted_without_save() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();
        handle.set_assessor(true);
        handle.add_division("Cardiology").await.unwrap();

        let fresh = store.load("Jane Doe").await.unwrap();
        assert!(!fresh.is_assessor());
        assert_eq!(fresh.divisions(), ["END".to_string()]);
    }

    #[tokio::test]
    async fn completed_qa_moves_the_schedule() {
        let store = store().await;
        store
            .register(NewScribe {
                qa_track: Some("Semiannual".to_string()),
                solo_date: Some(date(2021, 3, 15)),
                ..jane()
            })
            .await
            .unwrap();
        let mut handle = store.load("Jane Doe").await.unwrap();

        handle.record_completed_qa(date(2021, 9, 20), 4.0).unwrap();
        handle.record_completed_qa(date(2022, 3, 18), 5.0).unwrap();
        store.save(&handle).await.unwrap();

        let reloaded = store.load("Jane Doe").await.unwrap();
        assert_eq!(reloaded.total_qa_count(), 2);
        assert_eq!(reloaded.last_qa_date(), Some(date(2022, 3, 18)));
        assert_eq!(reloaded.next_qa_date(), Some(date(2022, 9, 18)));
        assert_eq!(reloaded.qa_form_score(), Some(5.0));
        assert_eq!(reloaded.average_qa_eval_score(), Some(4.5));
    }

    #[tokio::test]
    async fn saving_a_removed_profile_fails() {
        let store = store().await;
        store.register(jane()).await.unwrap();
        let handle = store.load("Jane Doe").await.unwrap();
        store.remove("Jane Doe").await.unwrap();

        assert!(matches!(store.save(&handle).await, Err(QaError::NotFound(_))));
    }
}
