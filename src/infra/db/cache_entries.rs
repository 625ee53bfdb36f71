use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    application::repos::{CacheEntriesRepo, RepoError},
    domain::{
        entry::CacheEntry,
        error::DomainError,
        keys::{CacheKey, DataType, SubjectKey, SubjectKind},
        season::Season,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

/// Storage value standing in for "no season".
const SEASON_AGNOSTIC: i32 = 0;

#[derive(sqlx::FromRow)]
struct CacheEntryRow {
    subject_kind: String,
    subject_id: i64,
    data_type: String,
    season: i32,
    data: Json<Value>,
    updated_at: OffsetDateTime,
}

impl TryFrom<CacheEntryRow> for CacheEntry {
    type Error = DomainError;

    fn try_from(row: CacheEntryRow) -> Result<Self, Self::Error> {
        let kind: SubjectKind = row.subject_kind.parse()?;
        let data_type: DataType = row.data_type.parse()?;
        let season = (row.season != SEASON_AGNOSTIC).then(|| Season::new(row.season));
        let key = CacheKey::new(SubjectKey::new(kind, row.subject_id), data_type, season)?;
        Ok(CacheEntry::new(key, row.data.0, row.updated_at))
    }
}

fn season_column(key: &CacheKey) -> i32 {
    key.season().map_or(SEASON_AGNOSTIC, Season::year)
}

#[async_trait]
impl CacheEntriesRepo for PostgresRepositories {
    async fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RepoError> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT subject_kind, subject_id, data_type, season, data, updated_at
            FROM api_cache
            WHERE subject_kind = $1
              AND subject_id = $2
              AND data_type = $3
              AND season = $4
            "#,
        )
        .bind(key.subject().kind.as_str())
        .bind(key.subject().id)
        .bind(key.data_type().as_str())
        .bind(season_column(key))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        match CacheEntry::try_from(row) {
            Ok(entry) => Ok(Some(entry)),
            Err(err) => {
                warn!(
                    target = "touchline::infra::db::cache_entries",
                    key = %key,
                    error = %err,
                    "Skipping cache row that does not decode to a valid key"
                );
                Ok(None)
            }
        }
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO api_cache (subject_kind, subject_id, data_type, season, data, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (subject_kind, subject_id, data_type, season) DO UPDATE
            SET data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(entry.key.subject().kind.as_str())
        .bind(entry.key.subject().id)
        .bind(entry.key.data_type().as_str())
        .bind(season_column(&entry.key))
        .bind(Json(&entry.data))
        .bind(entry.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
