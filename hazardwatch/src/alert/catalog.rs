//! Alert message catalog.
//!
//! Maps (language, category) to a spoken title and body. The catalog is data:
//! the built-in English/Arabic table can be replaced by a JSON file of the
//! same shape:
//!
//! ```json
//! {
//!   "en": { "pothole": { "title": "Pothole ahead", "body": "Pothole in {distance} metres" } },
//!   "ar": { "pothole": { "title": "...", "body": "..." } }
//! }
//! ```
//!
//! `{distance}` in a body is replaced with the distance in whole metres.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Meters;
use crate::hazard::HazardCategory;

/// Language every catalog must carry; used when the requested one is missing.
pub const FALLBACK_LANGUAGE: &str = "en";

const DISTANCE_PLACEHOLDER: &str = "{distance}";

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid JSON of the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catalog has no entries for the fallback language.
    #[error("Catalog is missing the 'en' fallback language")]
    MissingFallbackLanguage,
}

/// Title and body spoken for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    /// Text to speak, with the distance filled in.
    pub fn render(&self, distance: Meters) -> String {
        let metres = format!("{:.0}", distance.value());
        format!(
            "{}. {}",
            self.title,
            self.body.replace(DISTANCE_PLACEHOLDER, &metres)
        )
    }
}

/// Per-language, per-category alert messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertCatalog {
    languages: BTreeMap<String, BTreeMap<HazardCategory, AlertMessage>>,
}

impl Default for AlertCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AlertCatalog {
    /// Built-in English and Arabic messages.
    pub fn builtin() -> Self {
        use HazardCategory::*;

        let en = BTreeMap::from([
            (
                Pothole,
                AlertMessage::new("Pothole ahead", "A pothole was reported {distance} metres ahead"),
            ),
            (
                Accident,
                AlertMessage::new("Accident ahead", "An accident was reported {distance} metres ahead"),
            ),
            (
                SpeedCamera,
                AlertMessage::new("Speed camera", "Speed camera {distance} metres ahead"),
            ),
            (
                PublicService,
                AlertMessage::new(
                    "Public service report",
                    "A public service issue was reported {distance} metres ahead",
                ),
            ),
            (
                Other,
                AlertMessage::new("Road hazard", "A hazard was reported {distance} metres ahead"),
            ),
        ]);

        let ar = BTreeMap::from([
            (
                Pothole,
                AlertMessage::new("تنبيه: حفرة", "توجد حفرة على بعد {distance} متر"),
            ),
            (
                Accident,
                AlertMessage::new("تنبيه: حادث", "يوجد حادث على بعد {distance} متر"),
            ),
            (
                SpeedCamera,
                AlertMessage::new("تنبيه: كاميرا سرعة", "كاميرا سرعة على بعد {distance} متر"),
            ),
            (
                PublicService,
                AlertMessage::new("تنبيه: خدمة عامة", "بلاغ خدمة عامة على بعد {distance} متر"),
            ),
            (
                Other,
                AlertMessage::new("تنبيه", "بلاغ على الطريق على بعد {distance} متر"),
            ),
        ]);

        Self {
            languages: BTreeMap::from([("en".to_string(), en), ("ar".to_string(), ar)]),
        }
    }

    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(self) -> Result<Self, CatalogError> {
        if !self.languages.contains_key(FALLBACK_LANGUAGE) {
            return Err(CatalogError::MissingFallbackLanguage);
        }
        Ok(self)
    }

    /// Languages present in the catalog.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Message for a category in `language`, falling back to English.
    pub fn message(&self, category: HazardCategory, language: &str) -> Option<&AlertMessage> {
        self.languages
            .get(language)
            .and_then(|m| m.get(&category))
            .or_else(|| {
                self.languages
                    .get(FALLBACK_LANGUAGE)
                    .and_then(|m| m.get(&category))
            })
    }

    /// Spoken text for a hazard at `distance`.
    pub fn render(&self, category: HazardCategory, language: &str, distance: Meters) -> String {
        match self.message(category, language) {
            Some(message) => message.render(distance),
            None => format!("{} {:.0} m", category, distance.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_category() {
        let catalog = AlertCatalog::builtin();
        for language in ["en", "ar"] {
            for category in HazardCategory::ALL {
                assert!(
                    catalog.languages.get(language).unwrap().contains_key(&category),
                    "{} missing {}",
                    language,
                    category
                );
            }
        }
    }

    #[test]
    fn test_render_fills_distance() {
        let catalog = AlertCatalog::builtin();
        let text = catalog.render(HazardCategory::SpeedCamera, "en", Meters(149.6));
        assert_eq!(text, "Speed camera. Speed camera 150 metres ahead");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let catalog = AlertCatalog::builtin();
        let text = catalog.render(HazardCategory::Pothole, "fr", Meters(80.0));
        assert!(text.starts_with("Pothole ahead."));
    }

    #[test]
    fn test_arabic_message() {
        let catalog = AlertCatalog::builtin();
        let text = catalog.render(HazardCategory::Accident, "ar", Meters(75.0));
        assert!(text.contains("75"));
        assert!(text.starts_with("تنبيه: حادث"));
    }

    #[test]
    fn test_from_json_with_partial_language() {
        let json = r#"{
            "en": {"pothole": {"title": "Hole", "body": "in {distance} m"}},
            "de": {"pothole": {"title": "Schlagloch", "body": "in {distance} m"}}
        }"#;
        let catalog = AlertCatalog::from_json(json).unwrap();
        assert_eq!(
            catalog.render(HazardCategory::Pothole, "de", Meters(10.0)),
            "Schlagloch. in 10 m"
        );
        // Category missing everywhere
        assert_eq!(
            catalog.render(HazardCategory::Accident, "de", Meters(10.0)),
            "accident 10 m"
        );
    }

    #[test]
    fn test_from_json_requires_fallback() {
        let json = r#"{"ar": {"pothole": {"title": "t", "body": "b"}}}"#;
        assert!(matches!(
            AlertCatalog::from_json(json),
            Err(CatalogError::MissingFallbackLanguage)
        ));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            AlertCatalog::from_json("not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
