use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredReadingRow {
    pub id: Uuid,
    pub owner_id: String,
    /// `ReadingKind::as_str()`
    pub kind: String,
    pub display_name: String,
    /// The English reading payload.
    pub result: Value,
    /// Language name → translated payload.
    pub translations: Value,
    pub created_at: DateTime<Utc>,
}

/// A history entry without the reading body.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSummaryRow {
    pub id: Uuid,
    pub kind: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ZodiacProfileRow {
    pub sign: String,
    pub details: Value,
    pub translations: Value,
    pub created_at: DateTime<Utc>,
}

impl From<StoredReadingRow> for ReadingSummaryRow {
    fn from(row: StoredReadingRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}
