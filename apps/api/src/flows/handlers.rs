use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extract::{AuthContext, LanguageContext};
use crate::flows::astrology::AstrologyChartInput;
use crate::flows::chat::ChatTurnInput;
use crate::flows::face::FaceReadingInput;
use crate::flows::forecast::CombinedForecastInput;
use crate::flows::lifetime::LifetimeHoroscopeInput;
use crate::flows::palm::PalmReadingInput;
use crate::flows::validation::{parse_birth_date, Checks};
use crate::flows::{invoke, BirthDetails, ReadingKind, ReadingRequest, ReadingResult};
use crate::readings::models::ReadingSummaryRow;
use crate::state::AppState;
use crate::translation::{content_entity, TranslationSource};
use crate::wizard::{replay_chart_answer, WizardAnswer, WizardEvent, WizardStep};
use crate::zodiac::{sign_for_date, ZodiacSign};

const SAVE_FAILED_NOTICE: &str =
    "Your reading is ready, but it could not be saved to your history.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignCheckRequest {
    pub birth_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignCheckResponse {
    pub wizard: WizardStep,
    pub sign: ZodiacSign,
    pub date_range: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(flatten)]
    pub chart: AstrologyChartInput,
    /// The user's reply to the sign confirmation prompt.
    #[serde(default)]
    pub answer: WizardAnswer,
}

/// A freshly generated reading, in the caller's language.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub kind: ReadingKind,
    pub data: Value,
    pub language: String,
    pub source: TranslationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard: Option<WizardStep>,
    /// The sign the chart was requested under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<ZodiacSign>,
    /// Present when the reading was stored in the caller's history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<ReadingSummaryRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

fn is_persisted(kind: ReadingKind) -> bool {
    matches!(
        kind,
        ReadingKind::AstrologyChart
            | ReadingKind::PalmReading
            | ReadingKind::FaceReading
            | ReadingKind::CombinedForecast
            | ReadingKind::LifetimeHoroscope
    )
}

/// Runs the flow behind `request`, moving the wizard to `Result` or back to `Input`.
async fn generate(
    state: &AppState,
    wizard: Option<WizardStep>,
    request: &ReadingRequest,
) -> Result<(ReadingResult, Option<WizardStep>), AppError> {
    match invoke(state.llm.as_ref(), request).await {
        Ok(reading) => {
            let wizard = wizard
                .map(|step| step.apply(WizardEvent::Generated))
                .transpose()?;
            Ok((reading, wizard))
        }
        Err(e) => {
            if let Some(step) = wizard {
                let step = step.apply(WizardEvent::Failed)?;
                info!(kind = %request.kind(), step = step.name(), "reading failed, wizard reset");
            }
            Err(e.into())
        }
    }
}

/// Saves the reading for signed-in callers and renders it in the caller's language.
///
/// A failed save never costs the caller the reading; it comes back with a notice instead.
async fn complete_reading(
    state: &AppState,
    auth: Option<&AuthContext>,
    lang: LanguageContext,
    reading: ReadingResult,
    wizard: Option<WizardStep>,
) -> ReadingResponse {
    let kind = reading.kind();
    let mut notices = Vec::new();

    let saved = match auth {
        Some(auth) if is_persisted(kind) => {
            match state.history.insert(&auth.user_id, &reading, Utc::now()).await {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(%kind, owner = %auth.user_id, error = %e, "failed to save reading");
                    notices.push(SAVE_FAILED_NOTICE.to_string());
                    None
                }
            }
        }
        _ => None,
    };

    let payload = reading.payload();
    let translation = match &saved {
        Some(row) => {
            state
                .reading_translations
                .get_translated(&row.id.to_string(), &payload, lang.language)
                .await
        }
        None => {
            state
                .transient_translations
                .get_translated(&content_entity(&payload), &payload, lang.language)
                .await
        }
    };
    notices.extend(translation.notice);

    ReadingResponse {
        kind,
        data: translation.value,
        language: translation.language,
        source: translation.source,
        wizard,
        sign: None,
        saved: saved.map(ReadingSummaryRow::from),
        notices,
    }
}

/// POST /api/v1/zodiac/sign
///
/// The quick tropical check that opens the chart wizard's confirmation step.
pub async fn handle_zodiac_sign(
    Json(req): Json<SignCheckRequest>,
) -> Result<Json<SignCheckResponse>, AppError> {
    let mut checks = Checks::new();
    let date = checks.check("birthDate", parse_birth_date(&req.birth_date));
    let date = checks.finish_with(date)?;

    let sign = sign_for_date(date);
    let wizard = WizardStep::Input.apply(WizardEvent::SignDerived(sign))?;

    Ok(Json(SignCheckResponse {
        wizard,
        sign,
        date_range: sign.date_range(),
    }))
}

/// POST /api/v1/readings/astrology
pub async fn handle_astrology_chart(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    lang: LanguageContext,
    Json(req): Json<ChartRequest>,
) -> Result<Json<ReadingResponse>, AppError> {
    let mut checks = Checks::new();
    let birth_date = req.chart.birth.check(&mut checks);
    let birth_date = checks.finish_with(birth_date)?;

    let step = replay_chart_answer(sign_for_date(birth_date), req.answer)?;
    let chosen = match step {
        WizardStep::Generating { chosen, .. } => chosen,
        _ => None,
    };

    let request = ReadingRequest::AstrologyChart(req.chart);
    let (reading, wizard) = generate(&state, Some(step), &request).await?;

    let mut response = complete_reading(&state, auth.as_ref(), lang, reading, wizard).await;
    response.sign = chosen;
    Ok(Json(response))
}

/// POST /api/v1/readings/palm
pub async fn handle_palm_reading(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    lang: LanguageContext,
    Json(input): Json<PalmReadingInput>,
) -> Result<Json<ReadingResponse>, AppError> {
    let step = WizardStep::Input.apply(WizardEvent::Submitted)?;
    let request = ReadingRequest::PalmReading(input);
    let (reading, wizard) = generate(&state, Some(step), &request).await?;
    Ok(Json(
        complete_reading(&state, auth.as_ref(), lang, reading, wizard).await,
    ))
}

/// POST /api/v1/readings/face
pub async fn handle_face_reading(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    lang: LanguageContext,
    Json(input): Json<FaceReadingInput>,
) -> Result<Json<ReadingResponse>, AppError> {
    let step = WizardStep::Input.apply(WizardEvent::Submitted)?;
    let request = ReadingRequest::FaceReading(input);
    let (reading, wizard) = generate(&state, Some(step), &request).await?;
    Ok(Json(
        complete_reading(&state, auth.as_ref(), lang, reading, wizard).await,
    ))
}

/// POST /api/v1/readings/forecast
///
/// Monthly and yearly forecasts as of today, generated concurrently.
pub async fn handle_forecast(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    lang: LanguageContext,
    Json(birth): Json<BirthDetails>,
) -> Result<Json<ReadingResponse>, AppError> {
    let request = ReadingRequest::CombinedForecast(CombinedForecastInput {
        birth,
        as_of: Utc::now().date_naive(),
    });
    let (reading, _) = generate(&state, None, &request).await?;
    Ok(Json(
        complete_reading(&state, auth.as_ref(), lang, reading, None).await,
    ))
}

/// POST /api/v1/readings/lifetime
pub async fn handle_lifetime_horoscope(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    lang: LanguageContext,
    Json(input): Json<LifetimeHoroscopeInput>,
) -> Result<Json<ReadingResponse>, AppError> {
    let request = ReadingRequest::LifetimeHoroscope(input);
    let (reading, _) = generate(&state, None, &request).await?;
    Ok(Json(
        complete_reading(&state, auth.as_ref(), lang, reading, None).await,
    ))
}

/// POST /api/v1/chat
///
/// Chat replies are never saved; only the reply text is translated.
pub async fn handle_chat(
    State(state): State<AppState>,
    lang: LanguageContext,
    Json(input): Json<ChatTurnInput>,
) -> Result<Json<ReadingResponse>, AppError> {
    let request = ReadingRequest::ChatTurn(input);
    let (reading, _) = generate(&state, None, &request).await?;
    Ok(Json(complete_reading(&state, None, lang, reading, None).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reports_are_persisted() {
        assert!(is_persisted(ReadingKind::AstrologyChart));
        assert!(is_persisted(ReadingKind::PalmReading));
        assert!(is_persisted(ReadingKind::FaceReading));
        assert!(is_persisted(ReadingKind::CombinedForecast));
        assert!(is_persisted(ReadingKind::LifetimeHoroscope));
        assert!(!is_persisted(ReadingKind::ChatTurn));
        assert!(!is_persisted(ReadingKind::ObjectTranslation));
        assert!(!is_persisted(ReadingKind::ZodiacDetails));
    }
}
