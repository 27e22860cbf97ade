// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the reconciliation loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! engine calls as it processes events. All method bodies default to no-ops,
//! so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! Messaging and persistence failures are reported through this channel too:
//! they are logged, never propagated (nothing in this subsystem is fatal).

use crate::controller::ApplyOutcome;
use crate::event::IntentSource;
use crate::rate::Rate;
use crate::store::StoreDelta;

/// Emitted when a rate-change intent reaches the engine.
#[derive(Clone, Copy, Debug)]
pub struct IntentEvent {
    /// Where the intent originated.
    pub source: IntentSource,
    /// The raw candidate value, before normalization.
    pub candidate: f64,
}

/// Emitted after the controller decides on an apply attempt.
#[derive(Clone, Copy, Debug)]
pub struct ApplyEvent {
    /// Where the intent originated.
    pub source: IntentSource,
    /// The controller's decision.
    pub outcome: ApplyOutcome,
}

/// Emitted on an enable/disable transition (no-op requests are not traced).
#[derive(Clone, Copy, Debug)]
pub struct ModeEvent {
    /// The new mode.
    pub enabled: bool,
    /// The saved rate at the time of the transition.
    pub saved: Rate,
}

/// Which binding the acquisition watcher (re)acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    /// The media element was bound (first sighting or replacement).
    Media,
    /// The authoritative rate was re-asserted after a source change.
    SourceReassert,
    /// A fresh slider was attached to a new menu instance.
    MenuSlider,
}

/// Emitted when the acquisition watcher acts on a binding.
#[derive(Clone, Copy, Debug)]
pub struct BindingEvent {
    /// Which binding was acted on.
    pub kind: BindingKind,
}

/// Emitted when the engine requests a persistence write.
#[derive(Clone, Copy, Debug)]
pub struct PersistEvent {
    /// The keys being written.
    pub delta: StoreDelta,
}

/// A non-fatal failure on an external collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollaboratorFailure {
    /// The messaging channel reported no receiver.
    MessageDelivery,
    /// The persistence service rejected a write.
    PersistWrite,
    /// The extension runtime is absent (not running inside the extension).
    MissingRuntime,
}

/// Emitted when an external collaborator fails. Logged, never propagated.
#[derive(Clone, Copy, Debug)]
pub struct FailureEvent {
    /// What failed.
    pub failure: CollaboratorFailure,
}

/// Receives trace events from the engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a rate-change intent arrives.
    fn on_intent(&mut self, e: &IntentEvent) {
        _ = e;
    }

    /// Called after the controller decides on an apply attempt.
    fn on_apply(&mut self, e: &ApplyEvent) {
        _ = e;
    }

    /// Called on an enable/disable transition.
    fn on_mode(&mut self, e: &ModeEvent) {
        _ = e;
    }

    /// Called when a binding is (re)acquired.
    fn on_binding(&mut self, e: &BindingEvent) {
        _ = e;
    }

    /// Called when a persistence write is requested.
    fn on_persist(&mut self, e: &PersistEvent) {
        _ = e;
    }

    /// Called when an external collaborator fails.
    fn on_failure(&mut self, e: &FailureEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`IntentEvent`].
    #[inline]
    pub fn intent(&mut self, e: &IntentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_intent(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ApplyEvent`].
    #[inline]
    pub fn apply(&mut self, e: &ApplyEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_apply(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ModeEvent`].
    #[inline]
    pub fn mode(&mut self, e: &ModeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_mode(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BindingEvent`].
    #[inline]
    pub fn binding(&mut self, e: &BindingEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_binding(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PersistEvent`].
    #[inline]
    pub fn persist(&mut self, e: &PersistEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_persist(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FailureEvent`].
    #[inline]
    pub fn failure(&mut self, e: &FailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_intent(&IntentEvent {
            source: IntentSource::Slider,
            candidate: 1.5,
        });
        sink.on_failure(&FailureEvent {
            failure: CollaboratorFailure::MessageDelivery,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.intent(&IntentEvent {
            source: IntentSource::Panel,
            candidate: 2.0,
        });
        tracer.mode(&ModeEvent {
            enabled: false,
            saved: Rate::NEUTRAL,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            candidates: Vec<f64>,
        }
        impl TraceSink for RecordingSink {
            fn on_intent(&mut self, e: &IntentEvent) {
                self.candidates.push(e.candidate);
            }
        }

        let mut sink = RecordingSink {
            candidates: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.intent(&IntentEvent {
            source: IntentSource::Chord,
            candidate: 3.0,
        });
        drop(tracer);
        assert_eq!(sink.candidates, &[3.0]);
    }
}
