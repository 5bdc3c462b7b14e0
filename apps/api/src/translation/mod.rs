//! Translation cache layer.
//!
//! `TranslationCache::get_translated` returns a copy of a structured value with its string
//! leaves in the requested language. Translations are produced by the object translation
//! flow, checked against the original's shape, and cached per `(entity, language)` in a
//! `TranslationStore`. Concurrent misses for the same key share one model call.
//!
//! Failures never block the caller: the original English value comes back with a notice.

pub mod handlers;
pub mod language;
pub mod shape;
pub mod store;
pub mod ui_text;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::flows::translate::{ObjectTranslationFlow, ObjectTranslationInput};
use crate::flows::{run, FlowError, GenerationError};
use crate::llm_client::ModelBackend;
use shape::verify_same_shape;
use store::TranslationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    /// English requested; the original is returned untouched.
    Identity,
    Cache,
    Model,
    /// Translation failed; the original is returned with a notice.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationOutcome {
    pub language: String,
    pub source: TranslationSource,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl TranslationOutcome {
    fn new(language: &str, source: TranslationSource, value: Value) -> Self {
        Self {
            language: language.to_string(),
            source,
            value,
            notice: None,
        }
    }
}

/// Cache entity for values that have no id of their own, derived from their content.
pub fn content_entity(value: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    format!("content:{:016x}", hasher.finish())
}

type FlightKey = (String, String);
type InFlight = Mutex<HashMap<FlightKey, Arc<AsyncMutex<()>>>>;

/// A caller's membership in the single-flight group for one key.
///
/// Dropping it leaves the group, including when the caller's future is cancelled
/// mid-translation. The last member out removes the key.
struct Flight<'a> {
    in_flight: &'a InFlight,
    key: FlightKey,
    gate: Arc<AsyncMutex<()>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // This member's reference goes while the map is locked.
        drop(std::mem::take(&mut self.gate));
        if in_flight
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            in_flight.remove(&self.key);
        }
    }
}

pub struct TranslationCache {
    backend: Arc<dyn ModelBackend>,
    store: Arc<dyn TranslationStore>,
    in_flight: InFlight,
}

impl TranslationCache {
    pub fn new(backend: Arc<dyn ModelBackend>, store: Arc<dyn TranslationStore>) -> Self {
        Self {
            backend,
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_translated(
        &self,
        entity: &str,
        original: &Value,
        language: &str,
    ) -> TranslationOutcome {
        if language::is_english(language) {
            return TranslationOutcome::new(
                language::ENGLISH,
                TranslationSource::Identity,
                original.clone(),
            );
        }
        let language = language::lookup(language)
            .map(|l| l.value)
            .unwrap_or_else(|| language.trim());

        if let Some(hit) = self.cached(entity, original, language).await {
            return TranslationOutcome::new(language, TranslationSource::Cache, hit);
        }

        let flight = self.join_flight(entity, language);
        let _turn = flight.gate.lock().await;
        // Another caller may have filled the entry while this one waited.
        match self.cached(entity, original, language).await {
            Some(hit) => TranslationOutcome::new(language, TranslationSource::Cache, hit),
            None => self.translate_and_store(entity, original, language).await,
        }
    }

    /// Translates without touching the store.
    pub async fn translate(&self, original: &Value, language: &str) -> Result<Value, FlowError> {
        let input = ObjectTranslationInput {
            object_to_translate: original.clone(),
            target_language: language.to_string(),
        };
        let output = run::<ObjectTranslationFlow>(self.backend.as_ref(), &input).await?;
        verify_same_shape(original, &output.translated_object)
            .map_err(GenerationError::ShapeMismatch)?;
        Ok(output.translated_object)
    }

    async fn translate_and_store(
        &self,
        entity: &str,
        original: &Value,
        language: &str,
    ) -> TranslationOutcome {
        match self.translate(original, language).await {
            Ok(translated) => {
                if let Err(e) = self.store.save(entity, language, &translated).await {
                    warn!(entity, language, error = %e, "failed to cache translation");
                } else {
                    info!(entity, language, "translation cached");
                }
                TranslationOutcome::new(language, TranslationSource::Model, translated)
            }
            Err(e) => {
                warn!(entity, language, error = %e, "translation failed, serving original");
                TranslationOutcome {
                    notice: Some(format!(
                        "Could not translate to {language}. Showing the original English text."
                    )),
                    ..TranslationOutcome::new(language, TranslationSource::Fallback, original.clone())
                }
            }
        }
    }

    /// A stored value only counts as a hit when it still matches the original's shape.
    async fn cached(&self, entity: &str, original: &Value, language: &str) -> Option<Value> {
        match self.store.load(entity, language).await {
            Ok(Some(value)) => match verify_same_shape(original, &value) {
                Ok(()) => {
                    debug!(entity, language, "translation cache hit");
                    Some(value)
                }
                Err(path) => {
                    warn!(entity, language, path, "cached translation is stale");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(entity, language, error = %e, "translation store unavailable");
                None
            }
        }
    }

    fn join_flight(&self, entity: &str, language: &str) -> Flight<'_> {
        let key = (entity.to_string(), language.to_string());
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = in_flight.entry(key.clone()).or_default().clone();
        Flight {
            in_flight: &self.in_flight,
            key,
            gate,
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
