use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::flows::{ReadingKind, ReadingResult};
use crate::readings::models::{ReadingSummaryRow, StoredReadingRow, ZodiacProfileRow};
use crate::translation::store::TranslationStore;

/// Only the name column changes; the reading body and its translations stay as they are.
const RENAME_SQL: &str = r#"
    UPDATE readings
    SET display_name = $3
    WHERE id = $1 AND owner_id = $2
    RETURNING *
"#;

/// `"Palm Reading from July 15, 2024 3:05 PM"`
pub fn default_display_name(kind: ReadingKind, now: DateTime<Utc>) -> String {
    format!("{} from {}", kind.label(), now.format("%B %-d, %Y %-I:%M %p"))
}

/// Saves a finished reading under a generated id.
pub async fn insert_reading(
    pool: &PgPool,
    owner_id: &str,
    reading: &ReadingResult,
    now: DateTime<Utc>,
) -> Result<StoredReadingRow, sqlx::Error> {
    let kind = reading.kind();
    let row = sqlx::query_as::<_, StoredReadingRow>(
        r#"
        INSERT INTO readings (id, owner_id, kind, display_name, result, translations, created_at)
        VALUES ($1, $2, $3, $4, $5, '{}'::jsonb, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(kind.as_str())
    .bind(default_display_name(kind, now))
    .bind(reading.payload())
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!("Saved {} {} for owner {}", kind, row.id, owner_id);
    Ok(row)
}

/// Newest first.
pub async fn list_readings(
    pool: &PgPool,
    owner_id: &str,
) -> Result<Vec<ReadingSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ReadingSummaryRow>(
        r#"
        SELECT id, kind, display_name, created_at
        FROM readings
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn get_reading(
    pool: &PgPool,
    owner_id: &str,
    id: Uuid,
) -> Result<Option<StoredReadingRow>, sqlx::Error> {
    sqlx::query_as::<_, StoredReadingRow>("SELECT * FROM readings WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

pub async fn rename_reading(
    pool: &PgPool,
    owner_id: &str,
    id: Uuid,
    display_name: &str,
) -> Result<Option<StoredReadingRow>, sqlx::Error> {
    sqlx::query_as::<_, StoredReadingRow>(RENAME_SQL)
        .bind(id)
        .bind(owner_id)
        .bind(display_name)
        .fetch_optional(pool)
        .await
}

/// Returns false when the caller owns no reading with that id.
pub async fn delete_reading(pool: &PgPool, owner_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM readings WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!("Deleted reading {id} for owner {owner_id}");
    }
    Ok(result.rows_affected() > 0)
}

/// Owner-scoped access to saved readings. Every lookup is filtered by `owner_id`.
#[async_trait]
pub trait ReadingHistory: Send + Sync {
    async fn insert(
        &self,
        owner_id: &str,
        reading: &ReadingResult,
        now: DateTime<Utc>,
    ) -> Result<StoredReadingRow, sqlx::Error>;

    async fn list(&self, owner_id: &str) -> Result<Vec<ReadingSummaryRow>, sqlx::Error>;

    async fn get(&self, owner_id: &str, id: Uuid)
        -> Result<Option<StoredReadingRow>, sqlx::Error>;

    /// Changes only the display name. `None` when the caller owns no such reading.
    async fn rename(
        &self,
        owner_id: &str,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<StoredReadingRow>, sqlx::Error>;

    async fn delete(&self, owner_id: &str, id: Uuid) -> Result<bool, sqlx::Error>;
}

/// Reading history in the `readings` table.
#[derive(Clone)]
pub struct PgReadingHistory {
    pool: PgPool,
}

impl PgReadingHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingHistory for PgReadingHistory {
    async fn insert(
        &self,
        owner_id: &str,
        reading: &ReadingResult,
        now: DateTime<Utc>,
    ) -> Result<StoredReadingRow, sqlx::Error> {
        insert_reading(&self.pool, owner_id, reading, now).await
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<ReadingSummaryRow>, sqlx::Error> {
        list_readings(&self.pool, owner_id).await
    }

    async fn get(
        &self,
        owner_id: &str,
        id: Uuid,
    ) -> Result<Option<StoredReadingRow>, sqlx::Error> {
        get_reading(&self.pool, owner_id, id).await
    }

    async fn rename(
        &self,
        owner_id: &str,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<StoredReadingRow>, sqlx::Error> {
        rename_reading(&self.pool, owner_id, id, display_name).await
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        delete_reading(&self.pool, owner_id, id).await
    }
}

pub async fn get_zodiac_profile(
    pool: &PgPool,
    sign: &str,
) -> Result<Option<ZodiacProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ZodiacProfileRow>("SELECT * FROM zodiac_profiles WHERE sign = $1")
        .bind(sign)
        .fetch_optional(pool)
        .await
}

/// Stores a generated profile. When two requests race, the first stored profile wins and
/// is returned to both.
pub async fn save_zodiac_profile(
    pool: &PgPool,
    sign: &str,
    details: &Value,
) -> Result<ZodiacProfileRow, sqlx::Error> {
    let row = sqlx::query_as::<_, ZodiacProfileRow>(
        r#"
        INSERT INTO zodiac_profiles (sign, details, translations)
        VALUES ($1, $2, '{}'::jsonb)
        ON CONFLICT (sign) DO UPDATE SET details = zodiac_profiles.details
        RETURNING *
        "#,
    )
    .bind(sign)
    .bind(details)
    .fetch_one(pool)
    .await?;

    info!("Stored zodiac profile for {sign}");
    Ok(row)
}

/// Translations of a saved reading, kept in `readings.translations.<language>`.
#[derive(Clone)]
pub struct ReadingTranslationStore {
    pool: PgPool,
}

impl ReadingTranslationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn reading_id(entity: &str) -> Result<Uuid> {
    entity
        .parse::<Uuid>()
        .with_context(|| format!("'{entity}' is not a reading id"))
}

#[async_trait]
impl TranslationStore for ReadingTranslationStore {
    async fn load(&self, entity: &str, language: &str) -> Result<Option<Value>> {
        let translated: Option<Option<Value>> =
            sqlx::query_scalar("SELECT translations -> $2 FROM readings WHERE id = $1")
                .bind(reading_id(entity)?)
                .bind(language)
                .fetch_optional(&self.pool)
                .await
                .context("loading reading translation")?;
        Ok(translated.flatten())
    }

    async fn save(&self, entity: &str, language: &str, value: &Value) -> Result<()> {
        sqlx::query(
            "UPDATE readings SET translations = jsonb_set(translations, ARRAY[$2::text], $3, true) WHERE id = $1",
        )
        .bind(reading_id(entity)?)
        .bind(language)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("saving reading translation")?;
        Ok(())
    }
}

/// Translations of a zodiac profile, kept in `zodiac_profiles.translations.<language>`.
#[derive(Clone)]
pub struct ZodiacTranslationStore {
    pool: PgPool,
}

impl ZodiacTranslationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TranslationStore for ZodiacTranslationStore {
    async fn load(&self, entity: &str, language: &str) -> Result<Option<Value>> {
        let translated: Option<Option<Value>> =
            sqlx::query_scalar("SELECT translations -> $2 FROM zodiac_profiles WHERE sign = $1")
                .bind(entity)
                .bind(language)
                .fetch_optional(&self.pool)
                .await
                .context("loading zodiac translation")?;
        Ok(translated.flatten())
    }

    async fn save(&self, entity: &str, language: &str, value: &Value) -> Result<()> {
        sqlx::query(
            "UPDATE zodiac_profiles SET translations = jsonb_set(translations, ARRAY[$2::text], $3, true) WHERE sign = $1",
        )
        .bind(entity)
        .bind(language)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("saving zodiac translation")?;
        Ok(())
    }
}
