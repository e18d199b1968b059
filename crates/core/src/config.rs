use crate::error::BridgeError;
use crate::models::{UNKNOWN_ARTISTS, UNKNOWN_TITLE};
use serde::{Deserialize, Serialize};

/// Bridge settings, loadable from TOML.
///
/// Session capabilities are fixed and deliberately absent here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Title shown when the application supplies none
    pub fallback_title: String,
    /// Artist shown when the application supplies none
    pub fallback_artist: String,
    /// Refuse to construct a second live bridge in this process
    pub single_instance: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fallback_title: UNKNOWN_TITLE.to_string(),
            fallback_artist: UNKNOWN_ARTISTS.to_string(),
            single_instance: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, BridgeError> {
        toml::from_str(input).map_err(|e| BridgeError::Config(e.to_string()))
    }
}
