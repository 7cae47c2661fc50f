//! Player preferences
//!
//! Persisted as JSON in the key-value store, separately from scores.

use serde::{Deserialize, Serialize};

use crate::persistence::{KvStore, StoreError, get_or_none};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play haptic pulses
    pub haptics: bool,
    /// Reduced motion (drops the hop flip)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            haptics: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "extol_settings";

    /// Load settings, falling back to defaults when absent or corrupt
    pub fn load(store: &dyn KvStore) -> Self {
        let Some(json) = get_or_none(store, Self::STORAGE_KEY) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings
            }
            Err(e) => {
                log::warn!("Stored settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
