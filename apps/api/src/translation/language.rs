//! Supported display languages.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// Canonical English name; this is what prompts and cache keys use.
    pub value: &'static str,
    /// Name of the language in its own script.
    pub label: &'static str,
}

pub const ENGLISH: &str = "English";

pub const LANGUAGES: &[Language] = &[
    Language { value: "English", label: "English" },
    Language { value: "Spanish", label: "Español" },
    Language { value: "French", label: "Français" },
    Language { value: "German", label: "Deutsch" },
    Language { value: "Japanese", label: "日本語" },
    Language { value: "Chinese (Simplified)", label: "简体中文" },
    Language { value: "Russian", label: "Русский" },
    Language { value: "Arabic", label: "العربية" },
    Language { value: "Hindi", label: "हिन्दी" },
    Language { value: "Bengali", label: "বাংলা" },
    Language { value: "Marathi", label: "मराठी" },
    Language { value: "Telugu", label: "తెలుగు" },
    Language { value: "Tamil", label: "தமிழ்" },
    Language { value: "Gujarati", label: "ગુજરાતી" },
    Language { value: "Urdu", label: "اردو" },
    Language { value: "Kannada", label: "ಕನ್ನಡ" },
    Language { value: "Odia", label: "ଓଡ଼ିଆ" },
    Language { value: "Malayalam", label: "മലയാളം" },
    Language { value: "Punjabi", label: "ਪੰਜਾਬੀ" },
    Language { value: "Assamese", label: "অসমীয়া" },
];

pub fn is_english(language: &str) -> bool {
    language.trim().eq_ignore_ascii_case(ENGLISH)
}

/// Finds a supported language by its English name (case-insensitive) or native label.
pub fn lookup(name: &str) -> Option<&'static Language> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .find(|l| l.value.eq_ignore_ascii_case(name) || l.label == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_detection_ignores_case() {
        assert!(is_english("English"));
        assert!(is_english(" english "));
        assert!(!is_english("Englisch"));
    }

    #[test]
    fn test_lookup_by_value_or_label() {
        assert_eq!(lookup("spanish").unwrap().value, "Spanish");
        assert_eq!(lookup("हिन्दी").unwrap().value, "Hindi");
        assert_eq!(lookup("chinese (simplified)").unwrap().label, "简体中文");
        assert!(lookup("Klingon").is_none());
    }

    #[test]
    fn test_catalogue_has_twenty_languages() {
        assert_eq!(LANGUAGES.len(), 20);
        assert_eq!(LANGUAGES[0].value, ENGLISH);
    }
}
