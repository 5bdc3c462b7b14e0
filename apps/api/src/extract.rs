//! Per-request context extractors.
//!
//! Identity and display language arrive as headers and are handed to handlers as explicit
//! values. Nothing downstream reads them from ambient state.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::translation::language::{self, ENGLISH};

/// Set by the upstream identity service once the caller is signed in.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const LANGUAGE_HEADER: &str = "x-language";

/// The signed-in caller. Use `Option<AuthContext>` for routes that also serve guests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthContext {
            user_id: user_id.to_string(),
        })
    }
}

/// The caller's display language, canonicalised. Defaults to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageContext {
    pub language: &'static str,
}

impl Default for LanguageContext {
    fn default() -> Self {
        Self { language: ENGLISH }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for LanguageContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(LANGUAGE_HEADER) else {
            return Ok(LanguageContext::default());
        };
        let requested = raw.to_str().unwrap_or_default().trim();
        if requested.is_empty() {
            return Ok(LanguageContext::default());
        }

        language::lookup(requested)
            .map(|l| LanguageContext { language: l.value })
            .ok_or_else(|| {
                AppError::validation(
                    "language",
                    format!("'{requested}' is not a supported language."),
                )
            })
    }
}
