use std::sync::Arc;

use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::abbreviations::AbbreviationRegistry;
use crate::error::{QaError, QaResult};
use crate::models::{AbbreviationKind, NewProspective, ProspectiveRecord};
use crate::schedule;
use crate::scribes::ScribeStore;

#[derive(Debug, Clone)]
pub struct ProspectiveStore {
    pool: SqlitePool,
    registry: AbbreviationRegistry,
    scribes: ScribeStore,
    enforce_division_membership: bool,
    write_lock: Arc<Mutex<()>>,
}

impl ProspectiveStore {
    pub fn new(
        pool: SqlitePool,
        registry: AbbreviationRegistry,
        scribes: ScribeStore,
        enforce_division_membership: bool,
    ) -> Self {
        Self {
            pool,
            registry,
            scribes,
            enforce_division_membership,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn add(&self, new: NewProspective) -> QaResult<ProspectiveRecord> {
        let scribe = schedule::normalize_name(&new.scribe);
        if scribe.is_empty() {
            return Err(QaError::Validation("scribe is required".to_string()));
        }

        let division = self
            .registry
            .resolve_to_short(&new.division, AbbreviationKind::Division)
            .await?;

        if self.enforce_division_membership {
            let memberships = self.scribes.divisions_of(&scribe).await?;
            if !memberships.contains(&division) {
                return Err(QaError::UnassociatedDivision { scribe, division });
            }
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let seq = sqlx::query(
            r#"
            INSERT INTO prospective_qas (qa_date, scribe, division, assessor, provider, comments)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.date)
        .bind(&scribe)
        .bind(&division)
        .bind(new.assessor.trim())
        .bind(new.provider.trim())
        .bind(new.comments.trim())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let uid = record_uid(seq, &scribe, new.date, &division);
        sqlx::query("UPDATE prospective_qas SET uid = ? WHERE seq = ?")
            .bind(&uid)
            .bind(seq)
            .execute(&mut *tx)
            .await
            .map_err(|err| QaError::from_insert(err, format!("prospective QA {uid}")))?;

        tx.commit().await?;
        tracing::info!(%uid, %scribe, %division, "recorded prospective QA");

        Ok(ProspectiveRecord {
            uid,
            date: new.date,
            scribe,
            division,
            assessor: new.assessor.trim().to_string(),
            provider: new.provider.trim().to_string(),
            comments: new.comments.trim().to_string(),
        })
    }

    /// Every stored session, oldest insertion first.
    pub async fn list(&self) -> QaResult<Vec<ProspectiveRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT uid, qa_date, scribe, division, assessor, provider, comments
            FROM prospective_qas
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(ProspectiveRecord {
                uid: row.get::<Option<String>, _>("uid").unwrap_or_default(),
                date: row.get("qa_date"),
                scribe: row.get("scribe"),
                division: row.get("division"),
                assessor: row.get("assessor"),
                provider: row.get("provider"),
                comments: row.get("comments"),
            });
        }

        Ok(records)
    }
}

/// `{seq}.{initials}.{yyyymmdd}.{division}`; `seq` is never reused, which
/// keeps identifiers unique when the other parts repeat.
pub fn record_uid(seq: i64, scribe: &str, date: chrono::NaiveDate, division: &str) -> String {
    format!(
        "{seq}.{}.{}.{division}",
        scribe_initials(scribe),
        date.format("%Y%m%d")
    )
}

/// First three characters of every whitespace-separated token.
pub fn scribe_initials(name: &str) -> String {
    name.split_whitespace()
        .flat_map(|token| token.chars().take(3))
        .collect()
}
