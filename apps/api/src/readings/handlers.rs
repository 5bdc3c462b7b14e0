use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{AuthContext, LanguageContext};
use crate::flows::validation::ValidationError;
use crate::flows::zodiac_details::{ZodiacDetailsFlow, ZodiacDetailsInput};
use crate::flows::{run, ReadingResult};
use crate::readings::models::{ReadingSummaryRow, StoredReadingRow};
use crate::readings::repository;
use crate::state::AppState;
use crate::translation::language;
use crate::translation::TranslationOutcome;
use crate::zodiac::{UnknownSign, ZodiacSign};

const MAX_DISPLAY_NAME_CHARS: usize = 100;

/// A saved reading rendered in the caller's language.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReadingView {
    pub id: Uuid,
    pub kind: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub translation: TranslationOutcome,
}

impl SavedReadingView {
    fn new(row: StoredReadingRow, translation: TranslationOutcome) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            display_name: row.display_name,
            created_at: row.created_at,
            translation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZodiacProfileView {
    pub sign: ZodiacSign,
    pub date_range: &'static str,
    #[serde(flatten)]
    pub translation: TranslationOutcome,
}

fn validate_display_name(raw: &str) -> Result<&str, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::single("displayName", "Name cannot be empty."));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(ValidationError::single(
            "displayName",
            format!("Name must be at most {MAX_DISPLAY_NAME_CHARS} characters."),
        ));
    }
    Ok(name)
}

async fn find_reading(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> Result<StoredReadingRow, AppError> {
    state
        .history
        .get(&auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading {id} not found")))
}

/// GET /api/v1/readings
pub async fn handle_list_readings(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<ReadingSummaryRow>>, AppError> {
    let readings = state.history.list(&auth.user_id).await?;
    Ok(Json(readings))
}

/// GET /api/v1/readings/:id
pub async fn handle_get_reading(
    State(state): State<AppState>,
    auth: AuthContext,
    lang: LanguageContext,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedReadingView>, AppError> {
    let row = find_reading(&state, &auth, id).await?;
    let translation = state
        .reading_translations
        .get_translated(&row.id.to_string(), &row.result, lang.language)
        .await;
    Ok(Json(SavedReadingView::new(row, translation)))
}

/// GET /api/v1/readings/:id/translations/:language
pub async fn handle_get_reading_translation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, requested)): Path<(Uuid, String)>,
) -> Result<Json<SavedReadingView>, AppError> {
    let target = language::lookup(&requested).ok_or_else(|| {
        AppError::validation(
            "language",
            format!("'{requested}' is not a supported language."),
        )
    })?;
    let row = find_reading(&state, &auth, id).await?;
    let translation = state
        .reading_translations
        .get_translated(&row.id.to_string(), &row.result, target.value)
        .await;
    Ok(Json(SavedReadingView::new(row, translation)))
}

/// PATCH /api/v1/readings/:id
pub async fn handle_rename_reading(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ReadingSummaryRow>, AppError> {
    let name = validate_display_name(&req.display_name)?;
    let row = state
        .history
        .rename(&auth.user_id, id, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading {id} not found")))?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/readings/:id
pub async fn handle_delete_reading(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.history.delete(&auth.user_id, id).await? {
        return Err(AppError::NotFound(format!("Reading {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/zodiac/:sign
///
/// Profiles are generated once per sign and then served from the database.
pub async fn handle_get_zodiac_profile(
    State(state): State<AppState>,
    lang: LanguageContext,
    Path(sign): Path<String>,
) -> Result<Json<ZodiacProfileView>, AppError> {
    let sign: ZodiacSign = sign
        .parse()
        .map_err(|e: UnknownSign| AppError::validation("sign", e.to_string()))?;

    let row = match repository::get_zodiac_profile(&state.db, sign.name()).await? {
        Some(row) => row,
        None => {
            let input = ZodiacDetailsInput {
                sign: sign.name().to_string(),
            };
            let profile = run::<ZodiacDetailsFlow>(state.llm.as_ref(), &input).await?;
            let details = ReadingResult::ZodiacDetails(profile).payload();
            repository::save_zodiac_profile(&state.db, sign.name(), &details).await?
        }
    };

    let translation = state
        .zodiac_translations
        .get_translated(&row.sign, &row.details, lang.language)
        .await;

    Ok(Json(ZodiacProfileView {
        sign,
        date_range: sign.date_range(),
        translation,
    }))
}
