use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::abbreviations::AbbreviationRegistry;
use crate::error::QaResult;
use crate::models::{AbbreviationKind, DivisionRoster, DueQa};
use crate::schedule;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectiveRow {
    pub date: NaiveDate,
    pub scribe: String,
    pub division: String,
    pub assessor: String,
    pub provider: String,
    pub comments: String,
}

/// Everything the dashboard page needs in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub prospective: Vec<ProspectiveRow>,
    pub divisions: Vec<String>,
    pub qa_tracks: Vec<String>,
    pub assessors: Vec<String>,
}

/// Read-only projections over the stores.
#[derive(Debug, Clone)]
pub struct QueryLayer {
    pool: SqlitePool,
    registry: AbbreviationRegistry,
}

impl QueryLayer {
    pub fn new(pool: SqlitePool, registry: AbbreviationRegistry) -> Self {
        Self { pool, registry }
    }

    pub async fn prospective_rows(&self) -> QaResult<Vec<ProspectiveRow>> {
        let rows = sqlx::query(
            "SELECT qa_date, scribe, division, assessor, provider, comments FROM prospective_qas ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ProspectiveRow {
                date: row.get("qa_date"),
                scribe: row.get("scribe"),
                division: row.get("division"),
                assessor: row.get("assessor"),
                provider: row.get("provider"),
                comments: row.get("comments"),
            })
            .collect())
    }

    pub async fn division_names(&self) -> QaResult<Vec<String>> {
        self.registry.list_by_kind(AbbreviationKind::Division).await
    }

    pub async fn qa_track_names(&self) -> QaResult<Vec<String>> {
        self.registry.list_by_kind(AbbreviationKind::QaTrack).await
    }

    pub async fn assessors(&self) -> QaResult<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM scribe_profiles WHERE is_assessor = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    /// Scribes and providers attached to a division short code, in
    /// registration order.
    pub async fn roster_for_division(&self, short_code: &str) -> QaResult<DivisionRoster> {
        let scribes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT sp.name
            FROM scribe_profiles sp
            JOIN scribe_divisions sd ON sd.scribe_name = sp.name
            WHERE sd.division = ?
            ORDER BY sp.id
            "#,
        )
        .bind(short_code)
        .fetch_all(&self.pool)
        .await?;

        let providers: Vec<String> =
            sqlx::query_scalar("SELECT name FROM providers WHERE division = ? ORDER BY id")
                .bind(short_code)
                .fetch_all(&self.pool)
                .await?;

        tracing::debug!(short_code, scribes = scribes.len(), providers = providers.len(), "division roster");
        Ok(DivisionRoster { scribes, providers })
    }

    pub async fn dashboard(&self) -> QaResult<Dashboard> {
        Ok(Dashboard {
            prospective: self.prospective_rows().await?,
            divisions: self.division_names().await?,
            qa_tracks: self.qa_track_names().await?,
            assessors: self.assessors().await?,
        })
    }

    /// Scribes due on or before `as_of + within_days`, earliest first.
    pub async fn due_qas(&self, as_of: NaiveDate, within_days: i64) -> QaResult<Vec<DueQa>> {
        let horizon = schedule::horizon_date(as_of, within_days)?;
        let rows = sqlx::query(
            r#"
            SELECT name, next_qa_date
            FROM scribe_profiles
            WHERE next_qa_date IS NOT NULL AND next_qa_date <= ?
            ORDER BY next_qa_date, id
            "#,
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        let mut due = Vec::with_capacity(rows.len());
        for row in rows {
            let scribe: String = row.get("name");
            let next_qa_date: NaiveDate = row.get("next_qa_date");
            let divisions: Vec<String> = sqlx::query_scalar(
                "SELECT division FROM scribe_divisions WHERE scribe_name = ? ORDER BY position",
            )
            .bind(&scribe)
            .fetch_all(&self.pool)
            .await?;

            due.push(DueQa {
                scribe,
                next_qa_date,
                divisions,
                status: schedule::classify_due(next_qa_date, as_of),
                days_until_due: (next_qa_date - as_of).num_days(),
            });
        }

        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QaTrackIntervals;
    use crate::db::test_pool;
    use crate::models::{DueStatus, NewProspective, NewScribe};
    use crate::prospective::ProspectiveStore;
    use crate::providers::ProviderDirectory;
    use crate::scribes::ScribeStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        query: QueryLayer,
        scribes: ScribeStore,
        providers: ProviderDirectory,
        prospective: ProspectiveStore,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let registry = AbbreviationRegistry::new(pool.clone());
        for (long_name, code, kind) in [
            ("Endocrinology", "END", AbbreviationKind::Division),
            ("Cardiology", "CAR", AbbreviationKind::Division),
            ("Quarterly", "Q", AbbreviationKind::QaTrack),
        ] {
            registry.register(long_name, code, kind).await.unwrap();
        }
        let scribes = ScribeStore::new(pool.clone(), registry.clone(), QaTrackIntervals::default());
        Fixture {
            query: QueryLayer::new(pool.clone(), registry.clone()),
            providers: ProviderDirectory::new(pool.clone(), registry.clone()),
            prospective: ProspectiveStore::new(pool, registry, scribes.clone(), true),
            scribes,
        }
    }

    fn scribe(name: &str, division: &str) -> NewScribe {
        NewScribe {
            name: name.to_string(),
            division: division.to_string(),
            ..NewScribe::default()
        }
    }

    #[tokio::test]
    async fn roster_lists_division_members_in_registration_order() {
        let f = fixture().await;
        f.scribes.register(scribe("Avery Lee", "Endocrinology")).await.unwrap();
        f.scribes.register(scribe("Jules Moreno", "Cardiology")).await.unwrap();
        f.scribes.register(scribe("Kiara Patel", "Endocrinology")).await.unwrap();
        f.providers.add("Dr. Zaki", "Endocrinology", None).await.unwrap();
        f.providers.add("Dr. Okafor", "Cardiology", None).await.unwrap();

        let roster = f.query.roster_for_division("END").await.unwrap();
        assert_eq!(roster.scribes, vec!["Avery Lee".to_string(), "Kiara Patel".to_string()]);
        assert_eq!(roster.providers, vec!["Dr. Zaki".to_string()]);
    }

    #[tokio::test]
    async fn roster_follows_added_divisions() {
        let f = fixture().await;
        f.scribes.register(scribe("Avery Lee", "Cardiology")).await.unwrap();
        let mut handle = f.scribes.load("Avery Lee").await.unwrap();
        handle.add_division("Endocrinology").await.unwrap();
        f.scribes.save(&handle).await.unwrap();

        let roster = f.query.roster_for_division("END").await.unwrap();
        assert_eq!(roster.scribes, vec!["Avery Lee".to_string()]);
    }

    #[tokio::test]
    async fn assessors_are_flagged_scribes_only() {
        let f = fixture().await;
        f.scribes.register(scribe("Avery Lee", "Endocrinology")).await.unwrap();
        f.scribes.register(scribe("Kiara Patel", "Endocrinology")).await.unwrap();
        let mut handle = f.scribes.load("Kiara Patel").await.unwrap();
        handle.set_assessor(true);
        f.scribes.save(&handle).await.unwrap();

        assert_eq!(f.query.assessors().await.unwrap(), vec!["Kiara Patel".to_string()]);
    }

    #[tokio::test]
    async fn dashboard_bundles_every_projection() {
        let f = fixture().await;
        f.scribes.register(scribe("Avery Lee", "Endocrinology")).await.unwrap();
        f.prospective
            .add(NewProspective {
                scribe: "Avery Lee".to_string(),
                date: date(2026, 3, 2),
                division: "Endocrinology".to_string(),
                assessor: "Kiara Patel".to_string(),
                provider: "Dr. Zaki".to_string(),
                comments: String::new(),
            })
            .await
            .unwrap();

        let dashboard = f.query.dashboard().await.unwrap();
        assert_eq!(dashboard.divisions, vec!["Endocrinology".to_string(), "Cardiology".to_string()]);
        assert_eq!(dashboard.qa_tracks, vec!["Quarterly".to_string()]);
        assert!(dashboard.assessors.is_empty());
        assert_eq!(
            dashboard.prospective,
            vec![ProspectiveRow {
                date: date(2026, 3, 2),
                scribe: "Avery Lee".to_string(),
                division: "END".to_string(),
                assessor: "Kiara Patel".to_string(),
                provider: "Dr. Zaki".to_string(),
                comments: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn due_qas_are_ordered_and_classified() {
        let f = fixture().await;
        f.scribes
            .register(NewScribe {
                qa_track: Some("Quarterly".to_string()),
                solo_date: Some(date(2025, 12, 20)),
                ..scribe("Avery Lee", "Endocrinology")
            })
            .await
            .unwrap();
        f.scribes
            .register(NewScribe {
                qa_track: Some("Quarterly".to_string()),
                solo_date: Some(date(2025, 11, 1)),
                ..scribe("Kiara Patel", "Cardiology")
            })
            .await
            .unwrap();
        f.scribes
            .register(NewScribe {
                solo_date: Some(date(2025, 11, 1)),
                ..scribe("Jules Moreno", "Cardiology")
            })
            .await
            .unwrap();

        let due = f.query.due_qas(date(2026, 2, 15), 45).await.unwrap();
        let names: Vec<&str> = due.iter().map(|d| d.scribe.as_str()).collect();
        assert_eq!(names, vec!["Kiara Patel", "Avery Lee"]);
        assert_eq!(due[0].status, DueStatus::Overdue);
        assert_eq!(due[0].days_until_due, -14);
        assert_eq!(due[1].status, DueStatus::DueSoon);
        assert_eq!(due[1].next_qa_date, date(2026, 3, 20));
        assert_eq!(due[1].divisions, vec!["END".to_string()]);
    }
}
