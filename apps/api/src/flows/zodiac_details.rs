//! Profile of a single zodiac sign.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::flows::prompts::{ASTROLOGER_SYSTEM, ZODIAC_DETAILS_PROMPT_TEMPLATE};
use crate::flows::validation::ValidationError;
use crate::flows::{
    all_blank, no_text, null_as_default, render_prompt, Flow, FlowOutput, ReadingKind,
};
use crate::llm_client::ModelRequest;
use crate::zodiac::{UnknownSign, ZodiacSign};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZodiacDetailsInput {
    pub sign: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZodiacProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sign: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub element: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modality: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ruling_planet: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weaknesses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personality: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub love_and_relationships: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub career: String,
}

impl FlowOutput for ZodiacProfile {
    // The sign name is echoed back from the input and does not count as content.
    fn is_incomplete(&self) -> bool {
        all_blank(&[
            &self.symbol,
            &self.element,
            &self.modality,
            &self.ruling_planet,
            &self.personality,
            &self.love_and_relationships,
            &self.career,
        ]) && no_text(&self.strengths)
            && no_text(&self.weaknesses)
    }
}

pub struct ZodiacDetailsFlow;

impl Flow for ZodiacDetailsFlow {
    const NAME: &'static str = "getZodiacDetails";
    const KIND: ReadingKind = ReadingKind::ZodiacDetails;
    type Input = ZodiacDetailsInput;
    type Output = ZodiacProfile;

    fn prepare(input: &ZodiacDetailsInput) -> Result<ModelRequest, ValidationError> {
        let sign: ZodiacSign = input
            .sign
            .parse()
            .map_err(|e: UnknownSign| ValidationError::single("sign", e.to_string()))?;

        let list = json!({ "type": "array", "items": { "type": "string" } });
        let text = json!({ "type": "string" });
        Ok(ModelRequest {
            flow: Self::NAME,
            system: ASTROLOGER_SYSTEM.to_string(),
            prompt: render_prompt(ZODIAC_DETAILS_PROMPT_TEMPLATE, &[("sign", sign.name())]),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "sign": text,
                    "symbol": text,
                    "element": text,
                    "modality": text,
                    "rulingPlanet": text,
                    "strengths": list,
                    "weaknesses": list,
                    "personality": text,
                    "loveAndRelationships": text,
                    "career": text
                },
                "required": [
                    "sign", "symbol", "element", "modality", "rulingPlanet", "strengths",
                    "weaknesses", "personality", "loveAndRelationships", "career"
                ]
            }),
            media: None,
        })
    }
}
