//! The English UI text bundle shipped with the binary.

use serde_json::Value;

const UI_TEXT_JSON: &str = include_str!("ui_text.json");

/// Cache entity for the bundle. Tied to the crate version so edited wording is retranslated.
pub const UI_TEXT_ENTITY: &str = concat!("ui-text@", env!("CARGO_PKG_VERSION"));

pub fn english_bundle() -> Result<Value, serde_json::Error> {
    serde_json::from_str(UI_TEXT_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_strings(value: &Value) -> bool {
        match value {
            Value::String(_) => true,
            Value::Object(map) => map.values().all(only_strings),
            _ => false,
        }
    }

    #[test]
    fn test_bundle_parses_and_holds_only_text() {
        let bundle = english_bundle().unwrap();
        assert!(only_strings(&bundle));
        assert_eq!(bundle["language_modal"]["continue"], "Continue");
        assert!(bundle["astrology"]["confirmation_title"]
            .as_str()
            .unwrap()
            .contains("{sign}"));
    }
}
