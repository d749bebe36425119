use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::settings::SettingsPatch;
use crate::types::{FeatureConfig, Meaning};

/// Page agent -> dispatcher. Fire-and-forget; at most one directive comes
/// back per request, delivered asynchronously through the frame transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    #[serde(rename_all = "camelCase")]
    TranslateSelection {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_language: Option<String>,
    },
    /// Liveness probe. Successful delivery is the acknowledgement.
    Ping,
    /// No-op sent after a reconnect to give the dispatcher a reason to wake.
    Wakeup { timestamp: i64 },
}

impl PageRequest {
    pub fn wakeup_now() -> Self {
        PageRequest::Wakeup {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Structured payload of an enhanced translation directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedResult {
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meanings: Option<BTreeMap<String, Meaning>>,
}

/// Dispatcher -> page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageDirective {
    #[serde(rename_all = "camelCase")]
    ShowTranslation {
        original: String,
        translation: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detected_language: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ShowEnhancedTranslation {
        original: String,
        result: EnhancedResult,
        features: FeatureConfig,
    },
    ShowError { error: String },
    #[serde(rename_all = "camelCase")]
    UpdateSettings {
        #[serde(skip_serializing_if = "Option::is_none")]
        target_language: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hotkeys_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hotkey_modifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hotkey_key: Option<String>,
    },
}

/// Preferences surface -> dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlRequest {
    SettingsUpdated { settings: SettingsPatch },
}
