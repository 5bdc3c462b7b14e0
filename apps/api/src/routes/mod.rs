pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::flows::handlers as readings_api;
use crate::readings::handlers as history;
use crate::state::AppState;
use crate::translation::handlers as i18n;
use crate::uploads::handlers as uploads;

/// Room for a 5 MB image, base64-encoded inside JSON or wrapped in a multipart form.
const IMAGE_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Languages and translation
        .route("/api/v1/languages", get(i18n::handle_list_languages))
        .route("/api/v1/i18n/:language", get(i18n::handle_get_ui_text))
        .route("/api/v1/translate", post(i18n::handle_translate))
        // Zodiac
        .route("/api/v1/zodiac/sign", post(readings_api::handle_zodiac_sign))
        .route("/api/v1/zodiac/:sign", get(history::handle_get_zodiac_profile))
        // Readings
        .route(
            "/api/v1/readings/astrology",
            post(readings_api::handle_astrology_chart),
        )
        .route(
            "/api/v1/readings/palm",
            post(readings_api::handle_palm_reading)
                .layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT_BYTES)),
        )
        .route("/api/v1/readings/face", post(readings_api::handle_face_reading))
        .route("/api/v1/readings/forecast", post(readings_api::handle_forecast))
        .route(
            "/api/v1/readings/lifetime",
            post(readings_api::handle_lifetime_horoscope),
        )
        .route("/api/v1/chat", post(readings_api::handle_chat))
        // History
        .route("/api/v1/readings", get(history::handle_list_readings))
        .route(
            "/api/v1/readings/:id",
            get(history::handle_get_reading)
                .patch(history::handle_rename_reading)
                .delete(history::handle_delete_reading),
        )
        .route(
            "/api/v1/readings/:id/translations/:language",
            get(history::handle_get_reading_translation),
        )
        // Uploads
        .route(
            "/api/v1/uploads/face",
            post(uploads::handle_upload_face).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}
