//! Palm reading from an inline photo.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::flows::prompts::{PALM_PROMPT, PALM_SYSTEM};
use crate::flows::validation::{parse_data_uri, Checks, ValidationError};
use crate::flows::{all_blank, blank_as_none, no_text, null_as_default, Flow, FlowOutput, ReadingKind};
use crate::llm_client::ModelRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalmReadingInput {
    /// `data:image/<jpeg|png|webp>;base64,...`
    pub palm_image_data_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PalmReading {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_predictions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detailed_analysis: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowOutput for PalmReading {
    fn is_incomplete(&self) -> bool {
        all_blank(&[&self.summary, &self.detailed_analysis]) && no_text(&self.key_predictions)
    }

    fn reported_error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct PalmReadingFlow;

impl Flow for PalmReadingFlow {
    const NAME: &'static str = "palmReading";
    const KIND: ReadingKind = ReadingKind::PalmReading;
    type Input = PalmReadingInput;
    type Output = PalmReading;

    fn prepare(input: &PalmReadingInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        let media = checks.check("palmImageDataUri", parse_data_uri(&input.palm_image_data_uri));
        let media = checks.finish_with(media)?;

        Ok(ModelRequest {
            flow: Self::NAME,
            system: PALM_SYSTEM.to_string(),
            prompt: PALM_PROMPT.to_string(),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "summary": { "type": "string" },
                    "keyPredictions": { "type": "array", "items": { "type": "string" } },
                    "detailedAnalysis": { "type": "string" },
                    "error": { "type": "string" }
                }
            }),
            media: Some(media),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{run, FlowError, GenerationError};
    use crate::llm_client::MediaRef;
    use crate::test_support::ScriptedBackend;

    fn png_input() -> PalmReadingInput {
        PalmReadingInput {
            palm_image_data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        }
    }

    #[test]
    fn test_image_travels_as_media_not_prompt_text() {
        let request = PalmReadingFlow::prepare(&png_input()).unwrap();
        assert!(!request.prompt.contains("iVBORw0KGgo"));
        assert!(matches!(request.media, Some(MediaRef::Inline { .. })));
    }

    #[test]
    fn test_gif_is_rejected_before_the_model() {
        let input = PalmReadingInput {
            palm_image_data_uri: "data:image/gif;base64,R0lGODlh".to_string(),
        };
        let err = PalmReadingFlow::prepare(&input).unwrap_err();
        assert_eq!(
            err.message_for("palmImageDataUri"),
            Some("Invalid file type. Only JPG, PNG, or WEBP images are accepted.")
        );
    }

    #[tokio::test]
    async fn test_blurry_image_error_is_surfaced_verbatim() {
        let backend = ScriptedBackend::replying(vec![json!({"error": "blurry image"})]);

        let err = run::<PalmReadingFlow>(&backend, &png_input()).await.unwrap_err();

        match err {
            FlowError::Generation(GenerationError::ModelReportedError(message)) => {
                assert_eq!(message, "blurry image");
            }
            other => panic!("expected model-reported error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reported_error_wins_over_partial_sections() {
        let backend = ScriptedBackend::replying(vec![json!({
            "summary": "Partial",
            "error": "Only half the palm is visible."
        })]);

        let err = run::<PalmReadingFlow>(&backend, &png_input()).await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Generation(GenerationError::ModelReportedError(_))
        ));
    }

    #[tokio::test]
    async fn test_full_reading_has_no_error_field() {
        let backend = ScriptedBackend::replying(vec![json!({
            "summary": "A practical hand with a long head line.",
            "keyPredictions": ["Steady career growth", "A late but lasting partnership", "Good health"],
            "detailedAnalysis": "The heart line curves upward...",
            "error": ""
        })]);

        let reading = run::<PalmReadingFlow>(&backend, &png_input()).await.unwrap();

        assert_eq!(reading.key_predictions.len(), 3);
        assert!(reading.error.is_none());
        assert!(serde_json::to_value(&reading).unwrap().get("error").is_none());
    }
}
