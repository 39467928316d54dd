use anyhow::Context;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::abbreviations::AbbreviationRegistry;
use crate::error::{QaError, QaResult};
use crate::models::{AbbreviationKind, NewScribe};
use crate::providers::ProviderDirectory;
use crate::scribes::ScribeStore;

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .with_context(|| format!("failed to open database at {database_url}"))
}

pub async fn init_db(pool: &SqlitePool) -> QaResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads a small realistic roster. Rows that already exist are left alone so
/// the command can be re-run.
pub async fn seed(
    registry: &AbbreviationRegistry,
    scribes: &ScribeStore,
    providers: &ProviderDirectory,
) -> anyhow::Result<()> {
    let abbreviations = [
        ("Endocrinology", "END", AbbreviationKind::Division),
        ("Cardiology", "CAR", AbbreviationKind::Division),
        ("Internal Medicine", "MED", AbbreviationKind::Division),
        ("Monthly", "M", AbbreviationKind::QaTrack),
        ("Quarterly", "Q", AbbreviationKind::QaTrack),
        ("Semiannual", "S", AbbreviationKind::QaTrack),
        ("Annual", "A", AbbreviationKind::QaTrack),
    ];

    for (long_name, short_code, kind) in abbreviations {
        tolerate_duplicate(registry.register(long_name, short_code, kind).await.map(|_| ()))?;
    }

    let roster = [
        ("therry malone", "Internal Medicine", Some("Quarterly"), Some((2025, 11, 3)), Some("92")),
        ("avery lee", "Endocrinology", Some("Semiannual"), Some((2025, 6, 16)), Some("88.5")),
        ("jules moreno", "Cardiology", None, None, None),
    ];

    for (name, division, qa_track, solo, score) in roster {
        let solo_date = match solo {
            Some((y, m, d)) => Some(NaiveDate::from_ymd_opt(y, m, d).context("invalid seed date")?),
            None => None,
        };
        let scribe = NewScribe {
            name: name.to_string(),
            division: division.to_string(),
            qa_track: qa_track.map(str::to_string),
            solo_date,
            training_score: score.map(str::to_string),
        };
        tolerate_duplicate(scribes.register(scribe).await.map(|_| ()))?;
    }

    let mut lead = scribes.load("Therry Malone").await?;
    if !lead.is_assessor() {
        lead.set_assessor(true);
        scribes.save(&lead).await?;
    }

    let provider_rows = [
        ("Dr. Lerty", "Internal Medicine", None),
        ("Dr. Zaki", "Endocrinology", Some("Thyroid")),
        ("Dr. Okafor", "Cardiology", Some("Electrophysiology")),
    ];

    for (name, division, subspecialty) in provider_rows {
        tolerate_duplicate(providers.add(name, division, subspecialty).await.map(|_| ()))?;
    }

    Ok(())
}

fn tolerate_duplicate(result: QaResult<()>) -> QaResult<()> {
    match result {
        Err(QaError::DuplicateEntry(what)) => {
            tracing::debug!(%what, "seed row already present");
            Ok(())
        }
        other => other,
    }
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_db(&pool).await.unwrap();
    pool
}
