// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted preferences.
//!
//! The persistence service is an external collaborator offering async
//! get/set over string keys. This module owns the record shape, the key
//! names, and the incremental [`StoreDelta`]s the engine emits; actually
//! talking to the store is backend work (fire-and-forget, failures logged).

use crate::rate::Rate;

/// Storage key for the enable/disable mode. Absent means enabled.
pub const KEY_ENABLED: &str = "pluginEnabled";

/// Storage key for the last applied rate.
pub const KEY_LAST_APPLIED: &str = "playbackSpeed";

/// Storage key for the rate saved across a disable/enable cycle.
pub const KEY_SAVED: &str = "lastSpeed";

/// The full preference record, read once per page context at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreferenceRecord {
    /// Whether the plugin is enabled.
    pub enabled: bool,
    /// The last rate applied while enabled.
    pub last_applied: f64,
    /// The rate to restore when re-enabling.
    pub saved: f64,
}

impl Default for PreferenceRecord {
    fn default() -> Self {
        Self {
            enabled: true,
            last_applied: 1.0,
            saved: 1.0,
        }
    }
}

/// An incremental preference write: only the keys that changed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoreDelta {
    /// New value for [`KEY_ENABLED`], if it changed.
    pub enabled: Option<bool>,
    /// New value for [`KEY_LAST_APPLIED`], if it changed.
    pub last_applied: Option<Rate>,
    /// New value for [`KEY_SAVED`], if it changed.
    pub saved: Option<Rate>,
}

impl StoreDelta {
    /// Returns whether this delta writes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.last_applied.is_none() && self.saved.is_none()
    }

    /// Applies this delta to a record, returning the merged result.
    #[must_use]
    pub fn merged_into(&self, record: &PreferenceRecord) -> PreferenceRecord {
        PreferenceRecord {
            enabled: self.enabled.unwrap_or(record.enabled),
            last_applied: self
                .last_applied
                .map_or(record.last_applied, |rate| rate.value()),
            saved: self.saved.map_or(record.saved, |rate| rate.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::Rate;

    #[test]
    fn defaults_are_enabled_neutral() {
        let record = PreferenceRecord::default();
        assert!(record.enabled);
        assert_eq!(record.last_applied, 1.0);
        assert_eq!(record.saved, 1.0);
    }

    #[test]
    fn empty_delta_is_empty() {
        assert!(StoreDelta::default().is_empty());
        let delta = StoreDelta {
            saved: Rate::from_candidate(2.0),
            ..StoreDelta::default()
        };
        assert!(!delta.is_empty());
    }

    #[test]
    fn merge_overwrites_only_changed_keys() {
        let record = PreferenceRecord::default();
        let delta = StoreDelta {
            enabled: Some(false),
            last_applied: None,
            saved: Rate::from_candidate(5.0),
        };
        let merged = delta.merged_into(&record);
        assert!(!merged.enabled);
        assert_eq!(merged.last_applied, 1.0);
        assert_eq!(merged.saved, 5.0);
    }
}
