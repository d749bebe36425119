use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a browser tab that originated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

/// Identifier of a frame within a tab. Frame 0 is the top-level frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u32);

impl FrameId {
    pub const TOP: FrameId = FrameId(0);
}

/// Which optional result sections are requested from the endpoint and
/// rendered in the overlay. Only `meanings` drives prompt construction;
/// `synonyms` and `examples` are carried so the enhanced directive can echo
/// the full toggle set to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConfig {
    #[serde(default)]
    pub meanings: bool,
    #[serde(default)]
    pub synonyms: bool,
    #[serde(default)]
    pub examples: bool,
}

/// Per-word explanation, in English and in the target language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub english: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized: Option<String>,
}

// Model output is loose: a meaning may arrive as a bare string or as an
// object with english/localized keys. Accept both.
impl<'de> Deserialize<'de> for Meaning {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(Meaning {
                english: s,
                localized: None,
            }),
            serde_json::Value::Object(obj) => {
                let english = obj
                    .get("english")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let localized = obj
                    .get("localized")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                Ok(Meaning { english, localized })
            }
            other => Err(serde::de::Error::custom(format!(
                "expected string or object for meaning, got {}",
                other
            ))),
        }
    }
}

/// A single translation request. Consumed exactly once by the dispatcher.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub source_text: String,
    pub target_language: Option<String>,
    pub origin_tab: TabId,
    pub features: FeatureConfig,
}

/// Structured outcome of a translation. Immutable once constructed; its
/// lifetime ends when delivered to the page or discarded on parse failure.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    pub detected_language: Option<String>,
    pub meanings: Option<BTreeMap<String, Meaning>>,
}
