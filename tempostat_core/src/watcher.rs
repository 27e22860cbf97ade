// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element-acquisition decision logic.
//!
//! Backends own the actual DOM observers; this module owns the policy for
//! what their observations mean. The host page destroys and recreates both
//! the media element and the rate menu at will, and mutation batching can
//! deliver the same structural change several times, so every decision here
//! is check-then-act: a sighting binds only what is not already bound, and
//! a source change (re)starts the settle timer instead of writing
//! immediately — the host page resets the rate to neutral while swapping
//! sources, and writing too early would just be overwritten.

use crate::event::DomObservation;

/// What the engine should do in response to a DOM observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionDirective {
    /// Bind the sighted media element and push the authoritative rate onto
    /// it.
    BindMedia,
    /// (Re)start the source-settle timer.
    ScheduleSettle,
    /// Attach a fresh injected slider to the sighted menu instance.
    AttachSlider,
    /// Nothing to do.
    None,
}

/// Tracks acquisition state across media churn and menu rebuilds.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcquisitionWatcher {
    media_bound: bool,
    settle_pending: bool,
}

impl AcquisitionWatcher {
    /// Creates a watcher with nothing bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            media_bound: false,
            settle_pending: false,
        }
    }

    /// Returns whether a media element is currently considered bound.
    #[must_use]
    pub const fn is_media_bound(&self) -> bool {
        self.media_bound
    }

    /// Translates an observation into a directive.
    pub fn on_observation(&mut self, observation: DomObservation) -> AcquisitionDirective {
        match observation {
            DomObservation::MediaSighted => {
                // An unmarked element was sighted: either first acquisition
                // or the previous element was replaced wholesale. Both bind.
                self.media_bound = true;
                self.settle_pending = false;
                AcquisitionDirective::BindMedia
            }
            DomObservation::MediaSourceChanged => {
                if self.media_bound {
                    self.settle_pending = true;
                    AcquisitionDirective::ScheduleSettle
                } else {
                    AcquisitionDirective::None
                }
            }
            DomObservation::MenuSighted { has_slider } => {
                if has_slider {
                    AcquisitionDirective::None
                } else {
                    AcquisitionDirective::AttachSlider
                }
            }
        }
    }

    /// Handles expiry of the settle timer.
    ///
    /// Returns `true` if a re-assertion is due. Stale expiries (after the
    /// element was replaced and rebound, which supersedes the pending
    /// settle) are ignored.
    pub fn on_settle_expired(&mut self) -> bool {
        if self.settle_pending {
            self.settle_pending = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sighting_binds_idempotently() {
        let mut watcher = AcquisitionWatcher::new();
        assert_eq!(
            watcher.on_observation(DomObservation::MediaSighted),
            AcquisitionDirective::BindMedia
        );
        // A batched duplicate sighting binds again; the DOM-side marker makes
        // the second bind a no-op, and the decision layer stays consistent.
        assert_eq!(
            watcher.on_observation(DomObservation::MediaSighted),
            AcquisitionDirective::BindMedia
        );
        assert!(watcher.is_media_bound());
    }

    #[test]
    fn source_change_without_binding_is_ignored() {
        let mut watcher = AcquisitionWatcher::new();
        assert_eq!(
            watcher.on_observation(DomObservation::MediaSourceChanged),
            AcquisitionDirective::None
        );
    }

    #[test]
    fn source_change_schedules_settle_once_bound() {
        let mut watcher = AcquisitionWatcher::new();
        watcher.on_observation(DomObservation::MediaSighted);
        assert_eq!(
            watcher.on_observation(DomObservation::MediaSourceChanged),
            AcquisitionDirective::ScheduleSettle
        );
        assert!(watcher.on_settle_expired());
        // The expiry consumed the pending settle.
        assert!(!watcher.on_settle_expired());
    }

    #[test]
    fn rebind_supersedes_pending_settle() {
        let mut watcher = AcquisitionWatcher::new();
        watcher.on_observation(DomObservation::MediaSighted);
        watcher.on_observation(DomObservation::MediaSourceChanged);
        // Element replaced before the settle fired: the bind already pushed
        // the authoritative rate, so the stale settle must not re-fire.
        watcher.on_observation(DomObservation::MediaSighted);
        assert!(!watcher.on_settle_expired());
    }

    #[test]
    fn menu_sighting_attaches_only_without_slider() {
        let mut watcher = AcquisitionWatcher::new();
        assert_eq!(
            watcher.on_observation(DomObservation::MenuSighted { has_slider: false }),
            AcquisitionDirective::AttachSlider
        );
        assert_eq!(
            watcher.on_observation(DomObservation::MenuSighted { has_slider: true }),
            AcquisitionDirective::None
        );
    }
}
