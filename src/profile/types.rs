//! Serializable types that mirror the Configuration Profile payload schema.
//!
//! These types are the on-disk representation. They are assembled by
//! [`super::builder::ProfileBuilder`] and written by
//! [`super::serialization::save`]. Key names are fixed by the external schema
//! and must not change.

use std::str::FromStr;

use plist::{Dictionary, Value};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `PayloadType` of the top-level document.
pub const PROFILE_PAYLOAD_TYPE: &str = "Configuration";

/// `PayloadScope` of the top-level document.
pub const PROFILE_PAYLOAD_SCOPE: &str = "System";

/// `PayloadType` of every payload entry.
pub const PREFERENCES_PAYLOAD_TYPE: &str = "com.apple.ManagedClient.preferences";

/// Key holding the preference tree inside a settings wrapper.
pub const PREFERENCE_SETTINGS_KEY: &str = "mcx_preference_settings";

/// Key holding the "Set-Once" timestamp inside a settings wrapper.
pub const DATA_TIMESTAMP_KEY: &str = "mcx_data_timestamp";

/// Mapping from preference-domain name to its management record.
///
/// A domain name ending in `.ByHost` is scoped per machine.
pub type PayloadContentBody = Dictionary;

/// Top-level Configuration Profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProfileDocument {
    /// Format version; always `1`.
    pub payload_version: u32,
    /// Cosmetic name of the deploying organization.
    pub payload_organization: String,
    #[serde(rename = "PayloadUUID")]
    pub payload_uuid: String,
    pub payload_removal_disallowed: bool,
    pub payload_type: String,
    pub payload_scope: String,
    pub payload_description: String,
    pub payload_display_name: String,
    pub payload_identifier: String,
    /// Payload entries in the order they were added.
    pub payload_content: Vec<PayloadEntry>,
}

/// One managed-preferences payload inside [`ProfileDocument::payload_content`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadEntry {
    pub payload_version: u32,
    #[serde(rename = "PayloadUUID")]
    pub payload_uuid: String,
    pub payload_enabled: bool,
    pub payload_type: String,
    pub payload_identifier: String,
    pub payload_content: PayloadContentBody,
}

/// How often managed settings are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManageMode {
    /// Applied once, stamped with the time the profile was built.
    Once,
    /// Applied at every login, then left alone.
    Often,
    /// Continuously enforced.
    #[default]
    Always,
}

impl ManageMode {
    /// Management-mode tag used as the key of a management record.
    pub fn state_tag(self) -> &'static str {
        match self {
            Self::Always => "Forced",
            Self::Once | Self::Often => "Set-Once",
        }
    }
}

impl FromStr for ManageMode {
    type Err = AppError;

    /// Parse `Once`, `Often` or `Always`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "often" => Ok(Self::Often),
            "always" => Ok(Self::Always),
            _ => Err(AppError::Validation(format!(
                "invalid management mode '{s}'; expected Once, Often or Always"
            ))),
        }
    }
}

/// Preference tree plus its optional "Set-Once" timestamp.
#[derive(Debug, Clone)]
pub struct SettingsWrapper {
    pub settings: Value,
    pub timestamp: Option<plist::Date>,
}

impl From<SettingsWrapper> for Value {
    fn from(wrapper: SettingsWrapper) -> Self {
        let mut dict = Dictionary::new();
        dict.insert(PREFERENCE_SETTINGS_KEY.to_string(), wrapper.settings);
        if let Some(ts) = wrapper.timestamp {
            dict.insert(DATA_TIMESTAMP_KEY.to_string(), Value::Date(ts));
        }
        Value::Dictionary(dict)
    }
}

/// Build the management record `{ <state tag>: [ <wrapper> ] }`.
pub fn management_record(mode: ManageMode, wrapper: SettingsWrapper) -> Value {
    let mut record = Dictionary::new();
    record.insert(
        mode.state_tag().to_string(),
        Value::Array(vec![Value::from(wrapper)]),
    );
    Value::Dictionary(record)
}
