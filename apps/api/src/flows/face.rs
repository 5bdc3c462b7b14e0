//! Face reading from an uploaded photo. The model fetches the image by URL.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::flows::prompts::{FACE_PROMPT, FACE_SYSTEM};
use crate::flows::validation::{check_public_url, Checks, ValidationError};
use crate::flows::{all_blank, blank_as_none, no_text, null_as_default, Flow, FlowOutput, ReadingKind};
use crate::llm_client::{MediaRef, ModelRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceReadingInput {
    pub face_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProminentFeature {
    #[serde(default, deserialize_with = "null_as_default")]
    pub feature: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceReading {
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_impression: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prominent_features: Vec<ProminentFeature>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personality_insights: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub potential_life_aspects: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowOutput for FaceReading {
    fn is_incomplete(&self) -> bool {
        all_blank(&[&self.overall_impression, &self.potential_life_aspects])
            && self.prominent_features.is_empty()
            && no_text(&self.personality_insights)
    }

    fn reported_error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct FaceReadingFlow;

impl Flow for FaceReadingFlow {
    const NAME: &'static str = "faceReading";
    const KIND: ReadingKind = ReadingKind::FaceReading;
    type Input = FaceReadingInput;
    type Output = FaceReading;

    fn prepare(input: &FaceReadingInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        let url = checks.check("faceImageUrl", check_public_url(&input.face_image_url));
        let url = checks.finish_with(url)?;

        Ok(ModelRequest {
            flow: Self::NAME,
            system: FACE_SYSTEM.to_string(),
            prompt: FACE_PROMPT.to_string(),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "overallImpression": { "type": "string" },
                    "prominentFeatures": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "feature": { "type": "string" },
                                "interpretation": { "type": "string" }
                            },
                            "required": ["feature", "interpretation"]
                        }
                    },
                    "personalityInsights": { "type": "array", "items": { "type": "string" } },
                    "potentialLifeAspects": { "type": "string" },
                    "error": { "type": "string" }
                }
            }),
            media: Some(MediaRef::Url(url.to_string())),
        })
    }
}
