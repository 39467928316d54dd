use sqlx::{Row, SqlitePool};

use crate::abbreviations::AbbreviationRegistry;
use crate::error::{QaError, QaResult};
use crate::models::{AbbreviationKind, ProviderRecord};

/// Providers and the division they work in.
#[derive(Debug, Clone)]
pub struct ProviderDirectory {
    pool: SqlitePool,
    registry: AbbreviationRegistry,
}

impl ProviderDirectory {
    pub fn new(pool: SqlitePool, registry: AbbreviationRegistry) -> Self {
        Self { pool, registry }
    }

    pub async fn add(
        &self,
        name: &str,
        division_long_name: &str,
        subspecialty: Option<&str>,
    ) -> QaResult<ProviderRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QaError::Validation("provider name is required".to_string()));
        }

        let division = self
            .registry
            .resolve_to_short(division_long_name, AbbreviationKind::Division)
            .await?;
        let subspecialty = subspecialty
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        sqlx::query("INSERT INTO providers (name, division, subspecialty) VALUES (?, ?, ?)")
            .bind(name)
            .bind(&division)
            .bind(&subspecialty)
            .execute(&self.pool)
            .await
            .map_err(|err| QaError::from_insert(err, format!("provider {name}")))?;

        tracing::info!(provider = name, %division, "added provider");

        Ok(ProviderRecord {
            name: name.to_string(),
            division,
            subspecialty,
        })
    }

    pub async fn list(&self) -> QaResult<Vec<ProviderRecord>> {
        let rows = sqlx::query("SELECT name, division, subspecialty FROM providers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| ProviderRecord {
                name: row.get("name"),
                division: row.get("division"),
                subspecialty: row.get("subspecialty"),
            })
            .collect())
    }
}
