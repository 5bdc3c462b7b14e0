//! Structure-preserving translation of arbitrary JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::flows::prompts::{OBJECT_TRANSLATION_PROMPT_TEMPLATE, TRANSLATOR_SYSTEM};
use crate::flows::validation::{Checks, ValidationError};
use crate::flows::{render_prompt, Flow, FlowOutput, ReadingKind};
use crate::llm_client::ModelRequest;
use crate::translation::language;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTranslationInput {
    pub object_to_translate: Value,
    pub target_language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedObject {
    #[serde(default)]
    pub translated_object: Value,
}

impl FlowOutput for TranslatedObject {
    fn is_incomplete(&self) -> bool {
        self.translated_object.is_null()
    }
}

pub struct ObjectTranslationFlow;

impl Flow for ObjectTranslationFlow {
    const NAME: &'static str = "translateObject";
    const KIND: ReadingKind = ReadingKind::ObjectTranslation;
    type Input = ObjectTranslationInput;
    type Output = TranslatedObject;

    fn prepare(input: &ObjectTranslationInput) -> Result<ModelRequest, ValidationError> {
        let mut checks = Checks::new();
        if !matches!(input.object_to_translate, Value::Object(_) | Value::Array(_)) {
            checks.fail(
                "objectToTranslate",
                "Only JSON objects and arrays can be translated.",
            );
        }
        let target = match language::lookup(&input.target_language) {
            Some(lang) if language::is_english(lang.value) => {
                checks.fail("targetLanguage", "English content needs no translation.");
                None
            }
            Some(lang) => Some(lang),
            None => {
                checks.fail(
                    "targetLanguage",
                    format!("'{}' is not a supported language.", input.target_language.trim()),
                );
                None
            }
        };
        let target = checks.finish_with(target)?;

        let pretty = serde_json::to_string_pretty(&input.object_to_translate)
            .map_err(|e| ValidationError::single("objectToTranslate", e.to_string()))?;
        let prompt = render_prompt(
            OBJECT_TRANSLATION_PROMPT_TEMPLATE,
            &[("target_language", target.value), ("json", pretty.as_str())],
        );

        Ok(ModelRequest {
            flow: Self::NAME,
            system: TRANSLATOR_SYSTEM.to_string(),
            prompt,
            output_schema: json!({
                "type": "object",
                "properties": { "translatedObject": {} },
                "required": ["translatedObject"]
            }),
            media: None,
        })
    }
}
