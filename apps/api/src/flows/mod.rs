//! Reading flows: one typed request/response contract per reading kind.
//!
//! Every flow validates its input, renders a deterministic prompt, hands it to the
//! `ModelBackend` together with a declared output schema and checks the answer. Expected
//! failures (empty, incomplete or model-declined output) come back as `GenerationError`
//! values so callers can show a friendly message instead of a 500.

pub mod astrology;
pub mod chat;
pub mod error;
pub mod face;
pub mod forecast;
pub mod handlers;
pub mod lifetime;
pub mod palm;
pub mod prompts;
pub mod translate;
pub mod validation;
pub mod zodiac_details;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm_client::{LlmError, ModelBackend, ModelRequest};

pub use error::{FlowError, GenerationError};
use validation::{check_birth_time, check_location, parse_birth_date, Checks, ValidationError};

// ────────────────────────────────────────────────────────────────────────────
// Reading kinds
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKind {
    AstrologyChart,
    PalmReading,
    FaceReading,
    MonthlyForecast,
    YearlyPredictions,
    LifetimeHoroscope,
    CombinedForecast,
    ZodiacDetails,
    ChatTurn,
    ObjectTranslation,
}

const ALL_KINDS: [ReadingKind; 10] = [
    ReadingKind::AstrologyChart,
    ReadingKind::PalmReading,
    ReadingKind::FaceReading,
    ReadingKind::MonthlyForecast,
    ReadingKind::YearlyPredictions,
    ReadingKind::LifetimeHoroscope,
    ReadingKind::CombinedForecast,
    ReadingKind::ZodiacDetails,
    ReadingKind::ChatTurn,
    ReadingKind::ObjectTranslation,
];

impl ReadingKind {
    /// Stable identifier used on the wire and in the `readings.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingKind::AstrologyChart => "astrology_chart",
            ReadingKind::PalmReading => "palm_reading",
            ReadingKind::FaceReading => "face_reading",
            ReadingKind::MonthlyForecast => "monthly_forecast",
            ReadingKind::YearlyPredictions => "yearly_predictions",
            ReadingKind::LifetimeHoroscope => "lifetime_horoscope",
            ReadingKind::CombinedForecast => "combined_forecast",
            ReadingKind::ZodiacDetails => "zodiac_details",
            ReadingKind::ChatTurn => "chat_turn",
            ReadingKind::ObjectTranslation => "object_translation",
        }
    }

    /// Human label, used in default display names.
    pub fn label(self) -> &'static str {
        match self {
            ReadingKind::AstrologyChart => "Astrology Chart",
            ReadingKind::PalmReading => "Palm Reading",
            ReadingKind::FaceReading => "Face Reading",
            ReadingKind::MonthlyForecast => "Monthly Forecast",
            ReadingKind::YearlyPredictions => "Yearly Predictions",
            ReadingKind::LifetimeHoroscope => "Lifetime Horoscope",
            ReadingKind::CombinedForecast => "Astrology Forecast",
            ReadingKind::ZodiacDetails => "Zodiac Profile",
            ReadingKind::ChatTurn => "Chat Reply",
            ReadingKind::ObjectTranslation => "Translation",
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for ReadingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown reading kind '{s}'"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requests and results
// ────────────────────────────────────────────────────────────────────────────

/// One reading request of any kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "snake_case")]
pub enum ReadingRequest {
    AstrologyChart(astrology::AstrologyChartInput),
    PalmReading(palm::PalmReadingInput),
    FaceReading(face::FaceReadingInput),
    MonthlyForecast(forecast::MonthlyForecastInput),
    YearlyPredictions(forecast::YearlyPredictionsInput),
    LifetimeHoroscope(lifetime::LifetimeHoroscopeInput),
    CombinedForecast(forecast::CombinedForecastInput),
    ZodiacDetails(zodiac_details::ZodiacDetailsInput),
    ChatTurn(chat::ChatTurnInput),
    ObjectTranslation(translate::ObjectTranslationInput),
}

impl ReadingRequest {
    pub fn kind(&self) -> ReadingKind {
        match self {
            ReadingRequest::AstrologyChart(_) => ReadingKind::AstrologyChart,
            ReadingRequest::PalmReading(_) => ReadingKind::PalmReading,
            ReadingRequest::FaceReading(_) => ReadingKind::FaceReading,
            ReadingRequest::MonthlyForecast(_) => ReadingKind::MonthlyForecast,
            ReadingRequest::YearlyPredictions(_) => ReadingKind::YearlyPredictions,
            ReadingRequest::LifetimeHoroscope(_) => ReadingKind::LifetimeHoroscope,
            ReadingRequest::CombinedForecast(_) => ReadingKind::CombinedForecast,
            ReadingRequest::ZodiacDetails(_) => ReadingKind::ZodiacDetails,
            ReadingRequest::ChatTurn(_) => ReadingKind::ChatTurn,
            ReadingRequest::ObjectTranslation(_) => ReadingKind::ObjectTranslation,
        }
    }
}

/// A completed reading. Serialized as `{"kind": .., "data": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ReadingResult {
    AstrologyChart(astrology::AstrologyChart),
    PalmReading(palm::PalmReading),
    FaceReading(face::FaceReading),
    MonthlyForecast(forecast::MonthlyForecast),
    YearlyPredictions(forecast::YearlyPredictions),
    LifetimeHoroscope(lifetime::LifetimeHoroscope),
    CombinedForecast(forecast::CombinedForecast),
    ZodiacDetails(zodiac_details::ZodiacProfile),
    ChatTurn(chat::ChatReply),
    ObjectTranslation(translate::TranslatedObject),
}

impl ReadingResult {
    pub fn kind(&self) -> ReadingKind {
        match self {
            ReadingResult::AstrologyChart(_) => ReadingKind::AstrologyChart,
            ReadingResult::PalmReading(_) => ReadingKind::PalmReading,
            ReadingResult::FaceReading(_) => ReadingKind::FaceReading,
            ReadingResult::MonthlyForecast(_) => ReadingKind::MonthlyForecast,
            ReadingResult::YearlyPredictions(_) => ReadingKind::YearlyPredictions,
            ReadingResult::LifetimeHoroscope(_) => ReadingKind::LifetimeHoroscope,
            ReadingResult::CombinedForecast(_) => ReadingKind::CombinedForecast,
            ReadingResult::ZodiacDetails(_) => ReadingKind::ZodiacDetails,
            ReadingResult::ChatTurn(_) => ReadingKind::ChatTurn,
            ReadingResult::ObjectTranslation(_) => ReadingKind::ObjectTranslation,
        }
    }

    /// The bare output object, without the kind tag. This is what gets stored and translated.
    pub fn payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Rebuilds a typed result from a stored or translated payload.
    pub fn from_payload(kind: ReadingKind, payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({ "kind": kind, "data": payload }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// The flow contract
// ────────────────────────────────────────────────────────────────────────────

/// A model output contract.
pub trait FlowOutput {
    /// True when every substantive field is empty.
    fn is_incomplete(&self) -> bool;

    /// Set when the model declined the request itself (unreadable image and the like).
    fn reported_error(&self) -> Option<&str> {
        None
    }
}

pub trait Flow {
    const NAME: &'static str;
    const KIND: ReadingKind;
    type Input: Sync;
    type Output: DeserializeOwned + FlowOutput + Send;

    /// Validates the input and renders the model request. No model call happens when
    /// this fails.
    fn prepare(input: &Self::Input) -> Result<ModelRequest, ValidationError>;
}

/// Runs one flow end to end against the given backend.
pub async fn run<F: Flow>(
    backend: &dyn ModelBackend,
    input: &F::Input,
) -> Result<F::Output, FlowError> {
    let request = F::prepare(input)?;

    let raw = backend
        .generate(&request)
        .await
        .map_err(GenerationError::Transport)?
        .ok_or(GenerationError::EmptyOutput)?;

    let output: F::Output = serde_json::from_value(raw)
        .map_err(|e| GenerationError::Transport(LlmError::Parse(e)))?;

    if let Some(message) = output.reported_error() {
        warn!(flow = F::NAME, error = message, "model declined the request");
        return Err(GenerationError::ModelReportedError(message.to_string()).into());
    }

    if output.is_incomplete() {
        warn!(flow = F::NAME, "model returned an empty reading");
        return Err(GenerationError::IncompleteOutput(F::KIND).into());
    }

    debug!(flow = F::NAME, "reading generated");
    Ok(output)
}

/// Dispatches a request of any kind to its flow.
pub async fn invoke(
    backend: &dyn ModelBackend,
    request: &ReadingRequest,
) -> Result<ReadingResult, FlowError> {
    use ReadingRequest as Req;
    use ReadingResult as Res;

    let result = match request {
        Req::AstrologyChart(input) => {
            Res::AstrologyChart(run::<astrology::AstrologyChartFlow>(backend, input).await?)
        }
        Req::PalmReading(input) => {
            Res::PalmReading(run::<palm::PalmReadingFlow>(backend, input).await?)
        }
        Req::FaceReading(input) => {
            Res::FaceReading(run::<face::FaceReadingFlow>(backend, input).await?)
        }
        Req::MonthlyForecast(input) => {
            Res::MonthlyForecast(run::<forecast::MonthlyForecastFlow>(backend, input).await?)
        }
        Req::YearlyPredictions(input) => {
            Res::YearlyPredictions(run::<forecast::YearlyPredictionsFlow>(backend, input).await?)
        }
        Req::LifetimeHoroscope(input) => {
            Res::LifetimeHoroscope(run::<lifetime::LifetimeHoroscopeFlow>(backend, input).await?)
        }
        Req::CombinedForecast(input) => {
            Res::CombinedForecast(forecast::combined_forecast(backend, input).await?)
        }
        Req::ZodiacDetails(input) => {
            Res::ZodiacDetails(run::<zodiac_details::ZodiacDetailsFlow>(backend, input).await?)
        }
        Req::ChatTurn(input) => Res::ChatTurn(run::<chat::ChatFlow>(backend, input).await?),
        Req::ObjectTranslation(input) => {
            Res::ObjectTranslation(run::<translate::ObjectTranslationFlow>(backend, input).await?)
        }
    };
    Ok(result)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared input pieces
// ────────────────────────────────────────────────────────────────────────────

/// Birth details shared by every astrology flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthDetails {
    /// `YYYY-MM-DD`
    pub birth_date: String,
    /// 24-hour `HH:MM`
    pub birth_time: String,
    pub birth_location: String,
}

impl BirthDetails {
    /// Runs the form checks and returns the parsed birth date when it is valid.
    pub fn check(&self, checks: &mut Checks) -> Option<NaiveDate> {
        let date = checks.check("birthDate", parse_birth_date(&self.birth_date));
        checks.check("birthTime", check_birth_time(&self.birth_time));
        checks.check("birthLocation", check_location(&self.birth_location));
        date
    }

    /// Fills the `{birth_date}`, `{birth_time}` and `{birth_location}` placeholders
    /// together with the flow's own `extra` values.
    pub fn fill(&self, template: &str, extra: &[(&str, &str)]) -> String {
        let mut values = vec![
            ("birth_date", self.birth_date.trim()),
            ("birth_time", self.birth_time.trim()),
            ("birth_location", self.birth_location.trim()),
        ];
        values.extend_from_slice(extra);
        render_prompt(template, &values)
    }
}

/// Replaces each `{name}` in `template` with its value in one pass over the template.
///
/// Substituted text is never rescanned, so user input that happens to contain a
/// placeholder stays literal. Unknown `{...}` spans are copied through unchanged.
pub(crate) fn render_prompt(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match filled {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers for output contracts
// ────────────────────────────────────────────────────────────────────────────

/// Deserializes JSON `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treats a missing, null or whitespace-only string as absent.
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn all_blank(fields: &[&str]) -> bool {
    fields.iter().all(|f| f.trim().is_empty())
}

pub(crate) fn no_text(items: &[String]) -> bool {
    items.iter().all(|s| s.trim().is_empty())
}

/// JSON schema for an object whose listed properties are all plain strings.
pub(crate) fn string_object_schema(fields: &[&str], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;

    fn mumbai() -> BirthDetails {
        BirthDetails {
            birth_date: "1990-07-15".to_string(),
            birth_time: "14:30".to_string(),
            birth_location: "Mumbai, India".to_string(),
        }
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ALL_KINDS {
            assert_eq!(kind.as_str().parse::<ReadingKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                Value::String(kind.as_str().to_string())
            );
        }
        assert!("tarot".parse::<ReadingKind>().is_err());
    }

    #[test]
    fn test_birth_details_fill_placeholders() {
        let text = mumbai().fill("{birth_date} at {birth_time} in {birth_location}", &[]);
        assert_eq!(text, "1990-07-15 at 14:30 in Mumbai, India");
    }

    #[test]
    fn test_render_prompt_never_rescans_substituted_text() {
        let text = render_prompt(
            "Q: {message} H: {history}",
            &[("message", "what does {history} mean?"), ("history", "none")],
        );
        assert_eq!(text, "Q: what does {history} mean? H: none");
    }

    #[test]
    fn test_render_prompt_keeps_unknown_braces() {
        let text = render_prompt(r#"{"type": "object"} for {sign} {"#, &[("sign", "Leo")]);
        assert_eq!(text, r#"{"type": "object"} for Leo {"#);
    }

    #[test]
    fn test_payload_strips_the_kind_tag() {
        let result = ReadingResult::ChatTurn(chat::ChatReply {
            response: "Saturn is watching.".to_string(),
        });
        assert_eq!(result.payload(), json!({"response": "Saturn is watching."}));

        let rebuilt =
            ReadingResult::from_payload(ReadingKind::ChatTurn, result.payload()).unwrap();
        assert_eq!(rebuilt, result);
    }

    #[test]
    fn test_string_object_schema_lists_required_fields() {
        let schema = string_object_schema(&["a", "b"], &["a"]);
        assert_eq!(schema["properties"]["b"]["type"], "string");
        assert_eq!(schema["required"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_invoke_dispatches_by_kind() {
        let backend = ScriptedBackend::replying(vec![json!({
            "thisMonthForecast": "Venus favours quiet plans.",
            "nextMonthForecast": "Mars brings momentum."
        })]);
        let request = ReadingRequest::MonthlyForecast(forecast::MonthlyForecastInput {
            birth: mumbai(),
            current_date: "2024-07-26".to_string(),
        });

        let result = invoke(&backend, &request).await.unwrap();

        assert_eq!(result.kind(), ReadingKind::MonthlyForecast);
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.requests()[0].flow, forecast::MonthlyForecastFlow::NAME);
    }

    #[tokio::test]
    async fn test_null_output_is_empty_output() {
        let backend = ScriptedBackend::new(vec![Ok(None)]);
        let request = ReadingRequest::ZodiacDetails(zodiac_details::ZodiacDetailsInput {
            sign: "Leo".to_string(),
        });

        let err = invoke(&backend, &request).await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Generation(GenerationError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn test_wrong_output_type_is_a_transport_parse_error() {
        let backend = ScriptedBackend::replying(vec![json!({"response": 42})]);
        let request = ReadingRequest::ChatTurn(chat::ChatTurnInput {
            message: "Will I travel?".to_string(),
            history: vec![],
            astrology_reading: None,
        });

        let err = invoke(&backend, &request).await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Generation(GenerationError::Transport(LlmError::Parse(_)))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let backend = ScriptedBackend::new(vec![Err(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })]);
        let request = ReadingRequest::ZodiacDetails(zodiac_details::ZodiacDetailsInput {
            sign: "Leo".to_string(),
        });

        let err = invoke(&backend, &request).await.unwrap_err();

        match err {
            FlowError::Generation(GenerationError::Transport(e)) => assert!(e.is_overloaded()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    /// Every kind rejects a response whose substantive fields are all empty.
    #[tokio::test]
    async fn test_all_empty_output_is_incomplete_for_every_kind() {
        let cases: Vec<(ReadingRequest, Value)> = vec![
            (
                ReadingRequest::AstrologyChart(astrology::AstrologyChartInput {
                    birth: mumbai(),
                    astrology_system: Default::default(),
                }),
                json!({
                    "personalityTraits": "", "lifeTendencies": "", "keyInsights": "",
                    "nextMonthForecast": "", "nextThreeYearsForecast": "", "significantEvents": ""
                }),
            ),
            (
                ReadingRequest::PalmReading(palm::PalmReadingInput {
                    palm_image_data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                }),
                json!({"summary": "", "keyPredictions": [], "detailedAnalysis": null}),
            ),
            (
                ReadingRequest::FaceReading(face::FaceReadingInput {
                    face_image_url: "https://cdn.example.com/face-images/a.jpg".to_string(),
                }),
                json!({"overallImpression": "", "prominentFeatures": [], "personalityInsights": []}),
            ),
            (
                ReadingRequest::MonthlyForecast(forecast::MonthlyForecastInput {
                    birth: mumbai(),
                    current_date: "2024-07-26".to_string(),
                }),
                json!({"thisMonthForecast": "", "nextMonthForecast": " "}),
            ),
            (
                ReadingRequest::YearlyPredictions(forecast::YearlyPredictionsInput {
                    birth: mumbai(),
                    current_full_date: "July 26, 2024".to_string(),
                    current_year: 2024,
                    next_year: 2025,
                    year_after_next: 2026,
                }),
                json!({"thisYearOutlook": "", "nextYearOutlook": "", "yearAfterNextOutlook": ""}),
            ),
            (
                ReadingRequest::LifetimeHoroscope(lifetime::LifetimeHoroscopeInput {
                    birth: mumbai(),
                    start_year: None,
                    number_of_years: 5,
                }),
                json!({"forecasts": []}),
            ),
            (
                ReadingRequest::ZodiacDetails(zodiac_details::ZodiacDetailsInput {
                    sign: "Leo".to_string(),
                }),
                json!({"sign": "Leo", "strengths": [], "weaknesses": []}),
            ),
            (
                ReadingRequest::ChatTurn(chat::ChatTurnInput {
                    message: "Hello".to_string(),
                    history: vec![],
                    astrology_reading: None,
                }),
                json!({"response": ""}),
            ),
            (
                ReadingRequest::ObjectTranslation(translate::ObjectTranslationInput {
                    object_to_translate: json!({"summary": "Hello"}),
                    target_language: "Spanish".to_string(),
                }),
                json!({"translatedObject": null}),
            ),
        ];

        for (request, response) in cases {
            let backend = ScriptedBackend::replying(vec![response]);
            let err = invoke(&backend, &request).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    FlowError::Generation(GenerationError::IncompleteOutput(_))
                ),
                "{request:?} gave {err:?}"
            );
        }
    }
}
