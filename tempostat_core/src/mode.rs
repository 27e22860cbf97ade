// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Enable/disable mode gate.
//!
//! Disabling must be fully reversible: the user's pre-disable rate is
//! snapshotted into `saved` before neutral is forced, and `saved` is never
//! overwritten while disabled. Commands arrive asynchronously from the
//! control panel and are idempotent — a "disable" while already disabled is
//! a no-op.

use crate::rate::Rate;
use crate::store::PreferenceRecord;

/// What a [`ModeGate::request`] call decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModeTransition {
    /// Transitioned to disabled; the contained rate was snapshotted as the
    /// saved rate and neutral must now be forced through the privileged
    /// apply path.
    Disabled {
        /// The snapshotted pre-disable rate.
        saved: Rate,
    },
    /// Transitioned to enabled; the contained rate must be restored through
    /// the ordinary apply path.
    Enabled {
        /// The rate to restore.
        restore: Rate,
    },
    /// The gate was already in the requested mode.
    NoOp,
}

/// The enable/disable switch plus the saved-rate snapshot.
#[derive(Clone, Copy, Debug)]
pub struct ModeGate {
    enabled: bool,
    saved: Rate,
}

impl Default for ModeGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeGate {
    /// Creates an enabled gate with a neutral saved rate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            saved: Rate::NEUTRAL,
        }
    }

    /// Returns whether ordinary intents currently pass the gate.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the rate that will be restored on the next enable.
    #[must_use]
    pub const fn saved(&self) -> Rate {
        self.saved
    }

    /// Adopts the persisted mode and saved rate at startup.
    pub fn restore(&mut self, record: &PreferenceRecord) {
        self.enabled = record.enabled;
        self.saved = Rate::from_candidate(record.saved).unwrap_or(Rate::NEUTRAL);
    }

    /// Mirrors an accepted rate into the saved snapshot.
    ///
    /// Only meaningful while enabled; while disabled the snapshot is frozen
    /// so re-enabling restores the pre-disable rate exactly.
    pub fn mirror_saved(&mut self, rate: Rate) {
        if self.enabled {
            self.saved = rate;
        }
    }

    /// Requests a mode, returning what (if anything) changed.
    ///
    /// `current` is the authoritative rate at the time of the request; it
    /// becomes the saved snapshot when transitioning to disabled.
    pub fn request(&mut self, enabled: bool, current: Rate) -> ModeTransition {
        if enabled == self.enabled {
            return ModeTransition::NoOp;
        }
        self.enabled = enabled;
        if enabled {
            ModeTransition::Enabled {
                restore: self.saved,
            }
        } else {
            self.saved = current;
            ModeTransition::Disabled { saved: current }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(v: f64) -> Rate {
        Rate::from_candidate(v).unwrap()
    }

    #[test]
    fn disable_snapshots_current_rate() {
        let mut gate = ModeGate::new();
        assert_eq!(
            gate.request(false, rate(5.0)),
            ModeTransition::Disabled { saved: rate(5.0) }
        );
        assert!(!gate.is_enabled());
        assert_eq!(gate.saved(), rate(5.0));
    }

    #[test]
    fn enable_restores_snapshot() {
        let mut gate = ModeGate::new();
        gate.request(false, rate(5.0));
        assert_eq!(
            gate.request(true, Rate::NEUTRAL),
            ModeTransition::Enabled { restore: rate(5.0) }
        );
        assert!(gate.is_enabled());
    }

    #[test]
    fn requests_are_idempotent() {
        let mut gate = ModeGate::new();
        assert_eq!(gate.request(true, Rate::NEUTRAL), ModeTransition::NoOp);
        gate.request(false, rate(2.0));
        assert_eq!(gate.request(false, Rate::NEUTRAL), ModeTransition::NoOp);
        // The snapshot survives the redundant disable.
        assert_eq!(gate.saved(), rate(2.0));
    }

    #[test]
    fn saved_is_frozen_while_disabled() {
        let mut gate = ModeGate::new();
        gate.request(false, rate(3.0));
        gate.mirror_saved(rate(1.0));
        assert_eq!(gate.saved(), rate(3.0));
        gate.request(true, Rate::NEUTRAL);
        gate.mirror_saved(rate(1.5));
        assert_eq!(gate.saved(), rate(1.5));
    }

    #[test]
    fn restore_adopts_persisted_state() {
        let mut gate = ModeGate::new();
        gate.restore(&PreferenceRecord {
            enabled: false,
            last_applied: 2.0,
            saved: 4.0,
        });
        assert!(!gate.is_enabled());
        assert_eq!(gate.saved(), rate(4.0));
    }
}
