use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::ModelBackend;
use crate::readings::repository::{
    PgReadingHistory, ReadingHistory, ReadingTranslationStore, ZodiacTranslationStore,
};
use crate::translation::store::{MemoryTranslationStore, RedisTranslationStore, TranslationStore};
use crate::translation::TranslationCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Every flow and translation goes through this backend.
    pub llm: Arc<dyn ModelBackend>,
    pub config: Config,
    /// Signed-in users' saved readings.
    pub history: Arc<dyn ReadingHistory>,
    /// Translations of saved readings, stored on the reading row.
    pub reading_translations: Arc<TranslationCache>,
    /// Translations of zodiac profiles, stored on the profile row.
    pub zodiac_translations: Arc<TranslationCache>,
    /// Translated UI text bundles, cached in Redis.
    pub ui_text_translations: Arc<TranslationCache>,
    /// Results that are never persisted: guest readings, chat replies, ad-hoc objects.
    pub transient_translations: Arc<TranslationCache>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        redis: RedisClient,
        s3: S3Client,
        llm: Arc<dyn ModelBackend>,
        config: Config,
    ) -> Self {
        let reading_translations =
            translation_cache(&llm, ReadingTranslationStore::new(db.clone()));
        let zodiac_translations = translation_cache(&llm, ZodiacTranslationStore::new(db.clone()));
        let ui_text_translations = translation_cache(
            &llm,
            RedisTranslationStore::new(redis, "ui-text", config.ui_text_cache_ttl_secs),
        );
        let transient_translations = translation_cache(
            &llm,
            MemoryTranslationStore::new(
                config.transient_cache_capacity,
                Duration::from_secs(config.transient_cache_ttl_secs),
            ),
        );

        let history: Arc<dyn ReadingHistory> = Arc::new(PgReadingHistory::new(db.clone()));

        Self {
            db,
            s3,
            llm,
            config,
            history,
            reading_translations,
            zodiac_translations,
            ui_text_translations,
            transient_translations,
        }
    }
}

fn translation_cache(
    llm: &Arc<dyn ModelBackend>,
    store: impl TranslationStore + 'static,
) -> Arc<TranslationCache> {
    Arc::new(TranslationCache::new(llm.clone(), Arc::new(store)))
}
