// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event and effect vocabulary shared between the engine and backends.
//!
//! Backends translate platform callbacks (keydown, mutation records, timer
//! expiry, panel messages) into [`EngineEvent`]s and hand them to
//! [`Engine::handle`](crate::engine::Engine::handle). The engine answers with
//! an ordered list of [`Effect`]s, which the backend applies to the page.
//! Nothing in this module touches the DOM; both directions are plain data so
//! the whole exchange can be replayed in native tests.
//!
//! # Ordering and idempotence
//!
//! Events can arrive redundantly and in any interleaving (mutation batching,
//! late timers). Every event is therefore safe to deliver twice: binds are
//! presence-checked, timer expiries for machines that are no longer waiting
//! are ignored, and re-applying the current rate changes nothing observable
//! beyond a repaint.

use crate::rate::Rate;
use crate::store::{PreferenceRecord, StoreDelta};
use crate::time::{Instant, Span};

/// The cancelable timers the engine asks backends to run.
///
/// Starting a timer that is already pending restarts it; the old deadline
/// must not fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The 500 ms chord window opened by the chord key.
    ChordWindow,
    /// The settle delay after a media source change, before re-asserting the
    /// authoritative rate.
    SourceSettle,
}

/// A keyboard key, pre-classified by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// The chord key that arms the preset machine.
    Chord,
    /// A digit key `0`–`9`.
    Digit(u8),
    /// Arrow up (rate step when combined with Ctrl).
    ArrowUp,
    /// Arrow down (rate step when combined with Ctrl).
    ArrowDown,
    /// Any other key.
    Other,
}

/// A keydown delivered to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    /// The classified key.
    pub key: Key,
    /// Whether Ctrl was held.
    pub ctrl: bool,
    /// Whether a text-entry element currently holds focus. All rate
    /// shortcuts are suppressed while typing.
    pub in_editable: bool,
}

/// A discrete observation produced by the DOM watchers.
///
/// Backends only report sightings that passed their presence checks (an
/// unmarked media element, a menu instance without the injected slider), but
/// redundant delivery is still harmless.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomObservation {
    /// A media element without the bound marker was sighted.
    MediaSighted,
    /// A source-identifying attribute changed on the bound media element.
    MediaSourceChanged,
    /// The native rate menu appeared.
    MenuSighted {
        /// Whether this menu instance already contains the injected slider.
        has_slider: bool,
    },
}

/// Where a rate-change intent originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentSource {
    /// Chord machine preset (digit or window expiry).
    Chord,
    /// Ctrl+Arrow step.
    HotKey,
    /// The injected slider.
    Slider,
    /// The host page's native rate menu.
    NativeMenu,
    /// The detached control panel, via the messaging channel.
    Panel,
}

/// A command received from the control panel over the messaging channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelCommand {
    /// Enable or disable the plugin. Idempotent.
    Toggle {
        /// The requested mode.
        enabled: bool,
    },
    /// Set an absolute playback rate.
    SetSpeed {
        /// The candidate rate.
        speed: f64,
    },
    /// An action this agent does not handle. Ignored without error.
    Unknown,
}

/// An input to [`Engine::handle`](crate::engine::Engine::handle).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineEvent {
    /// The startup preference record arrived from the persistence service.
    Startup(PreferenceRecord),
    /// A keydown, with the time it was observed.
    Key(KeyInput, Instant),
    /// A previously requested timer expired.
    TimerFired(TimerKind),
    /// A DOM watcher observation.
    Dom(DomObservation),
    /// A surface originated a rate-change intent.
    Surface {
        /// Which surface originated the intent.
        source: IntentSource,
        /// The surface's candidate value, not yet normalized.
        candidate: f64,
    },
    /// A command from the control panel.
    Panel(PanelCommand),
}

/// An instruction the backend applies to the page.
///
/// Effects are ordered; backends apply them in sequence within the same
/// callback that produced them (in particular, [`SuppressDefault`] must take
/// effect before the event handler returns).
///
/// [`SuppressDefault`]: Effect::SuppressDefault
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Prevent the page's default handling of the triggering input event.
    SuppressDefault,
    /// Mark the sighted media element as bound and attach its
    /// source-attribute observer. Idempotent via the DOM marker.
    BindMedia,
    /// Write the rate to the bound media element, if any. Absence of a
    /// binding is normal; the value stays authoritative.
    WriteMediaRate(Rate),
    /// Write the rate to the bound media element only if its current rate
    /// differs. Used after a source-change settle so the engine does not
    /// fight the host page's own transient writes.
    ReassertMediaRate(Rate),
    /// Repaint every registered surface with the rate.
    Repaint(Rate),
    /// Show the transient on-screen label, then fade.
    ShowLabel(Rate),
    /// Switch surfaces between their enabled and disabled presentations.
    SetSurfacesEnabled(bool),
    /// Build a fresh injected slider inside the current menu instance.
    AttachMenuSlider,
    /// Write the changed preference keys. Fire-and-forget.
    Persist(StoreDelta),
    /// Start (or restart) a cancelable timer.
    StartTimer(TimerKind, Span),
    /// Cancel a pending timer, if any.
    CancelTimer(TimerKind),
}
