use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::flows::validation::Checks;
use crate::state::AppState;
use crate::translation::language::{self, Language, LANGUAGES};
use crate::translation::ui_text::{english_bundle, UI_TEXT_ENTITY};
use crate::translation::{content_entity, TranslationOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub object_to_translate: Value,
    pub target_language: String,
}

fn supported_language(requested: &str) -> Result<&'static Language, AppError> {
    language::lookup(requested).ok_or_else(|| {
        AppError::validation(
            "language",
            format!("'{}' is not a supported language.", requested.trim()),
        )
    })
}

/// GET /api/v1/languages
pub async fn handle_list_languages() -> Json<&'static [Language]> {
    Json(LANGUAGES)
}

/// GET /api/v1/i18n/:language
pub async fn handle_get_ui_text(
    State(state): State<AppState>,
    Path(requested): Path<String>,
) -> Result<Json<TranslationOutcome>, AppError> {
    let target = supported_language(&requested)?;
    let bundle = english_bundle().map_err(|e| AppError::Internal(e.into()))?;
    let outcome = state
        .ui_text_translations
        .get_translated(UI_TEXT_ENTITY, &bundle, target.value)
        .await;
    Ok(Json(outcome))
}

/// POST /api/v1/translate
///
/// Ad-hoc objects share the in-memory cache across callers.
pub async fn handle_translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslationOutcome>, AppError> {
    let mut checks = Checks::new();
    if !matches!(req.object_to_translate, Value::Object(_) | Value::Array(_)) {
        checks.fail(
            "objectToTranslate",
            "Only JSON objects and arrays can be translated.",
        );
    }
    let target = checks.check(
        "targetLanguage",
        language::lookup(&req.target_language).ok_or_else(|| {
            format!("'{}' is not a supported language.", req.target_language.trim())
        }),
    );
    let target = checks.finish_with(target)?;

    // Keyed by content alone, so a cached entry only ever answers the same object.
    let entity = content_entity(&req.object_to_translate);
    let outcome = state
        .transient_translations
        .get_translated(&entity, &req.object_to_translate, target.value)
        .await;
    Ok(Json(outcome))
}
