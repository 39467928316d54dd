use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::error::{QaError, QaResult};
use crate::models::{Abbreviation, AbbreviationKind};

/// Long-name to short-code mappings for divisions and QA tracks.
#[derive(Debug, Clone)]
pub struct AbbreviationRegistry {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    long_name: String,
    short_code: String,
    kind: AbbreviationKind,
}

impl AbbreviationRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stores a new mapping. The identifier takes the form
    /// `{id}.{same_kind_count}.{tag}`; `id` is never reused.
    pub async fn register(
        &self,
        long_name: &str,
        short_code: &str,
        kind: AbbreviationKind,
    ) -> QaResult<Abbreviation> {
        let long_name = long_name.trim();
        let short_code = short_code.trim();
        if long_name.is_empty() || short_code.is_empty() {
            return Err(QaError::Validation(
                "abbreviations need both a long name and a short code".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let same_kind: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM abbreviations WHERE kind = ?")
            .bind(kind.tag())
            .fetch_one(&mut *tx)
            .await?;

        let id = sqlx::query("INSERT INTO abbreviations (long_name, short_code, kind) VALUES (?, ?, ?)")
            .bind(long_name)
            .bind(short_code)
            .bind(kind.tag())
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                QaError::from_insert(err, format!("{kind} abbreviation {long_name} ({short_code})"))
            })?
            .last_insert_rowid();

        let uid = format!("{id}.{same_kind}.{}", kind.tag());
        sqlx::query("UPDATE abbreviations SET uid = ? WHERE id = ?")
            .bind(&uid)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(%uid, long_name, short_code, "registered abbreviation");

        Ok(Abbreviation {
            uid,
            long_name: long_name.to_string(),
            short_code: short_code.to_string(),
            kind,
        })
    }

    pub async fn resolve_to_short(&self, long_name: &str, kind: AbbreviationKind) -> QaResult<String> {
        sqlx::query_scalar("SELECT short_code FROM abbreviations WHERE long_name = ? AND kind = ?")
            .bind(long_name.trim())
            .bind(kind.tag())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| QaError::NotFound(format!("{kind} named '{}'", long_name.trim())))
    }

    pub async fn resolve_to_long(&self, short_code: &str, kind: AbbreviationKind) -> QaResult<String> {
        sqlx::query_scalar("SELECT long_name FROM abbreviations WHERE short_code = ? AND kind = ?")
            .bind(short_code.trim())
            .bind(kind.tag())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| QaError::NotFound(format!("{kind} with code '{}'", short_code.trim())))
    }

    pub async fn get(&self, long_name: &str) -> QaResult<Abbreviation> {
        let row = sqlx::query("SELECT uid, long_name, short_code, kind FROM abbreviations WHERE long_name = ?")
            .bind(long_name.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| QaError::NotFound(format!("abbreviation '{}'", long_name.trim())))?;

        abbreviation_from_row(&row)
    }

    /// Long names of one kind, in registration order.
    pub async fn list_by_kind(&self, kind: AbbreviationKind) -> QaResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT long_name FROM abbreviations WHERE kind = ? ORDER BY id")
            .bind(kind.tag())
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    pub async fn import_csv(&self, csv_path: &Path) -> QaResult<ImportSummary> {
        let reader = csv::Reader::from_path(csv_path)?;
        self.import_from(reader).await
    }

    /// Registers every `long_name,short_code,kind` row. Rows clashing with an
    /// existing entry are skipped and reported; any other failure aborts.
    pub async fn import_from<R: Read>(&self, mut reader: csv::Reader<R>) -> QaResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            match self.register(&row.long_name, &row.short_code, row.kind).await {
                Ok(_) => summary.inserted += 1,
                Err(QaError::DuplicateEntry(what)) => {
                    tracing::warn!(%what, "skipping duplicate abbreviation row");
                    summary.skipped.push(row.long_name);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(summary)
    }
}

fn abbreviation_from_row(row: &SqliteRow) -> QaResult<Abbreviation> {
    let kind: String = row.get("kind");
    Ok(Abbreviation {
        uid: row.get::<Option<String>, _>("uid").unwrap_or_default(),
        long_name: row.get("long_name"),
        short_code: row.get("short_code"),
        kind: kind.parse()?,
    })
}
