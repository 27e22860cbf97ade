// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: one owned context object wiring every component together.
//!
//! [`Engine`] owns the rate controller, the chord machine, the mode gate,
//! and the acquisition watcher. Backends feed it
//! [`EngineEvent`]s and apply the returned [`Effect`]s in order; the engine
//! itself never touches the DOM, timers, storage, or messaging, which is
//! what makes the whole reconciliation loop testable without a browser.
//!
//! # Convergence
//!
//! Every path that can assert a rate — chord presets, Ctrl+Arrow steps,
//! slider drags, native-menu clicks and class flips, panel commands, settle
//! re-assertions — funnels through one apply helper, so all observable
//! surfaces converge on the same normalized value and an unchanged value
//! never produces a second persistence write.

use alloc::vec::Vec;

use crate::chord::ChordMachine;
use crate::controller::{ApplyOutcome, Privilege, RateController};
use crate::event::{DomObservation, Effect, EngineEvent, IntentSource, Key, KeyInput, PanelCommand, TimerKind};
use crate::mode::{ModeGate, ModeTransition};
use crate::rate::Rate;
use crate::store::{PreferenceRecord, StoreDelta};
use crate::time::{Instant, Span};
use crate::trace::{
    ApplyEvent, BindingEvent, BindingKind, IntentEvent, ModeEvent, PersistEvent, Tracer,
};
use crate::watcher::{AcquisitionDirective, AcquisitionWatcher};

/// Engine tunables.
///
/// The menu polling fields are consumed by the backend's menu-open poller
/// rather than the engine itself; they live here so one config describes the
/// whole reconciliation loop.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// How long the chord window stays open after the chord key.
    pub chord_window: Span,
    /// Delay between a source-change mutation and the rate re-assertion.
    pub settle_delay: Span,
    /// How long the transient label stays visible before fading.
    pub label_hold: Span,
    /// Rate delta for one Ctrl+Arrow step.
    pub arrow_step: f64,
    /// Poll interval while waiting for the menu after a rate-button click.
    pub menu_poll_interval: Span,
    /// Poll attempts before the menu wait is abandoned silently.
    pub menu_poll_attempts: u32,
}

impl EngineConfig {
    /// The configuration used against the targeted host page.
    #[must_use]
    pub const fn host_page() -> Self {
        Self {
            chord_window: Span(500),
            settle_delay: Span(100),
            label_hold: Span(1000),
            arrow_step: 0.25,
            menu_poll_interval: Span(50),
            menu_poll_attempts: 10,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::host_page()
    }
}

/// The playback-rate synchronization engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    controller: RateController,
    chord: ChordMachine,
    mode: ModeGate,
    watcher: AcquisitionWatcher,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::host_page())
    }
}

impl Engine {
    /// Creates an engine with the given configuration, enabled, at neutral.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            controller: RateController::new(),
            chord: ChordMachine::new(),
            mode: ModeGate::new(),
            watcher: AcquisitionWatcher::new(),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the authoritative rate.
    #[must_use]
    pub const fn rate(&self) -> Rate {
        self.controller.rate()
    }

    /// Returns whether ordinary intents currently pass the mode gate.
    ///
    /// Backends use this for origin-side rejection: while disabled, surface
    /// handlers and the keyboard path bail out before constructing an event.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    /// Returns the rate that will be restored on the next enable.
    #[must_use]
    pub const fn saved_rate(&self) -> Rate {
        self.mode.saved()
    }

    /// Processes one event and returns the effects to apply, in order.
    pub fn handle(&mut self, event: EngineEvent, tracer: &mut Tracer<'_>) -> Vec<Effect> {
        let mut out = Vec::new();
        match event {
            EngineEvent::Startup(record) => self.on_startup(&mut out, record),
            EngineEvent::Key(input, now) => self.on_key(&mut out, input, now, tracer),
            EngineEvent::TimerFired(kind) => self.on_timer(&mut out, kind, tracer),
            EngineEvent::Dom(observation) => self.on_dom(&mut out, observation, tracer),
            EngineEvent::Surface { source, candidate } => {
                self.on_surface(&mut out, source, candidate, tracer);
            }
            EngineEvent::Panel(command) => self.on_panel(&mut out, command, tracer),
        }
        out
    }

    fn on_startup(&mut self, out: &mut Vec<Effect>, record: PreferenceRecord) {
        self.mode.restore(&record);
        let rate = if record.enabled {
            Rate::from_candidate(record.last_applied).unwrap_or(Rate::NEUTRAL)
        } else {
            Rate::NEUTRAL
        };
        self.controller.seed(rate);
        out.push(Effect::WriteMediaRate(rate));
        out.push(Effect::Repaint(rate));
        if !record.enabled {
            out.push(Effect::SetSurfacesEnabled(false));
        }
    }

    fn on_key(
        &mut self,
        out: &mut Vec<Effect>,
        input: KeyInput,
        now: Instant,
        tracer: &mut Tracer<'_>,
    ) {
        // Suppressed entirely while typing or disabled; the chord machine
        // never even sees these keys.
        if input.in_editable || !self.mode.is_enabled() {
            return;
        }
        match input.key {
            Key::Chord => {
                self.chord.on_chord_key(now);
                out.push(Effect::SuppressDefault);
                out.push(Effect::StartTimer(
                    TimerKind::ChordWindow,
                    self.config.chord_window,
                ));
            }
            Key::Digit(digit) => {
                if let Some(preset) = self.chord.on_digit(digit) {
                    out.push(Effect::SuppressDefault);
                    out.push(Effect::CancelTimer(TimerKind::ChordWindow));
                    self.apply_intent(out, IntentSource::Chord, preset, Privilege::Ordinary, tracer);
                }
            }
            Key::ArrowUp if input.ctrl => {
                out.push(Effect::SuppressDefault);
                let candidate = self.controller.rate().value() + self.config.arrow_step;
                self.apply_intent(out, IntentSource::HotKey, candidate, Privilege::Ordinary, tracer);
            }
            Key::ArrowDown if input.ctrl => {
                out.push(Effect::SuppressDefault);
                let candidate = self.controller.rate().value() - self.config.arrow_step;
                self.apply_intent(out, IntentSource::HotKey, candidate, Privilege::Ordinary, tracer);
            }
            Key::ArrowUp | Key::ArrowDown | Key::Other => {}
        }
    }

    fn on_timer(&mut self, out: &mut Vec<Effect>, kind: TimerKind, tracer: &mut Tracer<'_>) {
        match kind {
            TimerKind::ChordWindow => {
                // Chord key tapped alone: deliberate reset to neutral.
                if self.chord.on_window_expired() {
                    self.apply_intent(out, IntentSource::Chord, 1.0, Privilege::Ordinary, tracer);
                }
            }
            TimerKind::SourceSettle => {
                if self.watcher.on_settle_expired() {
                    let rate = self.controller.rate();
                    tracer.binding(&BindingEvent {
                        kind: BindingKind::SourceReassert,
                    });
                    out.push(Effect::ReassertMediaRate(rate));
                    out.push(Effect::Repaint(rate));
                }
            }
        }
    }

    fn on_dom(&mut self, out: &mut Vec<Effect>, observation: DomObservation, tracer: &mut Tracer<'_>) {
        match self.watcher.on_observation(observation) {
            AcquisitionDirective::BindMedia => {
                tracer.binding(&BindingEvent {
                    kind: BindingKind::Media,
                });
                out.push(Effect::BindMedia);
                out.push(Effect::WriteMediaRate(self.controller.rate()));
                // A replacement supersedes any settle still pending for the
                // old element.
                out.push(Effect::CancelTimer(TimerKind::SourceSettle));
            }
            AcquisitionDirective::ScheduleSettle => {
                out.push(Effect::StartTimer(
                    TimerKind::SourceSettle,
                    self.config.settle_delay,
                ));
            }
            AcquisitionDirective::AttachSlider => {
                tracer.binding(&BindingEvent {
                    kind: BindingKind::MenuSlider,
                });
                out.push(Effect::AttachMenuSlider);
            }
            AcquisitionDirective::None => {}
        }
    }

    fn on_surface(
        &mut self,
        out: &mut Vec<Effect>,
        source: IntentSource,
        candidate: f64,
        tracer: &mut Tracer<'_>,
    ) {
        if !self.mode.is_enabled() {
            // Origin-side rejection missed (or raced the disable): snap the
            // surface back to the forced-neutral presentation.
            out.push(Effect::Repaint(self.controller.rate()));
            return;
        }
        self.apply_intent(out, source, candidate, Privilege::Ordinary, tracer);
    }

    fn on_panel(&mut self, out: &mut Vec<Effect>, command: PanelCommand, tracer: &mut Tracer<'_>) {
        match command {
            PanelCommand::Toggle { enabled } => self.on_toggle(out, enabled, tracer),
            PanelCommand::SetSpeed { speed } => {
                if self.mode.is_enabled() {
                    self.apply_intent(out, IntentSource::Panel, speed, Privilege::Ordinary, tracer);
                }
            }
            PanelCommand::Unknown => {}
        }
    }

    fn on_toggle(&mut self, out: &mut Vec<Effect>, enabled: bool, tracer: &mut Tracer<'_>) {
        match self.mode.request(enabled, self.controller.rate()) {
            ModeTransition::NoOp => {}
            ModeTransition::Disabled { saved } => {
                tracer.mode(&ModeEvent {
                    enabled: false,
                    saved,
                });
                let delta = StoreDelta {
                    enabled: Some(false),
                    last_applied: None,
                    saved: Some(saved),
                };
                tracer.persist(&PersistEvent { delta });
                out.push(Effect::Persist(delta));
                self.apply_intent(out, IntentSource::Panel, 1.0, Privilege::ModeGate, tracer);
                out.push(Effect::SetSurfacesEnabled(false));
            }
            ModeTransition::Enabled { restore } => {
                tracer.mode(&ModeEvent {
                    enabled: true,
                    saved: restore,
                });
                let delta = StoreDelta {
                    enabled: Some(true),
                    last_applied: None,
                    saved: None,
                };
                tracer.persist(&PersistEvent { delta });
                out.push(Effect::Persist(delta));
                out.push(Effect::SetSurfacesEnabled(true));
                self.apply_intent(
                    out,
                    IntentSource::Panel,
                    restore.value(),
                    Privilege::Ordinary,
                    tracer,
                );
            }
        }
    }

    /// The single funnel for every rate-change intent.
    fn apply_intent(
        &mut self,
        out: &mut Vec<Effect>,
        source: IntentSource,
        candidate: f64,
        privilege: Privilege,
        tracer: &mut Tracer<'_>,
    ) {
        tracer.intent(&IntentEvent { source, candidate });
        let enabled = self.mode.is_enabled();
        let outcome = self.controller.apply(candidate, enabled, privilege);
        tracer.apply(&ApplyEvent { source, outcome });
        match outcome {
            ApplyOutcome::Applied(rate) => {
                out.push(Effect::WriteMediaRate(rate));
                if enabled {
                    self.mode.mirror_saved(rate);
                    let delta = StoreDelta {
                        enabled: None,
                        last_applied: Some(rate),
                        saved: Some(rate),
                    };
                    tracer.persist(&PersistEvent { delta });
                    out.push(Effect::Persist(delta));
                }
                out.push(Effect::Repaint(rate));
                out.push(Effect::ShowLabel(rate));
            }
            ApplyOutcome::Unchanged(rate) => {
                out.push(Effect::Repaint(rate));
                out.push(Effect::ShowLabel(rate));
            }
            ApplyOutcome::Rejected => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(EngineConfig::host_page())
    }

    fn handle(engine: &mut Engine, event: EngineEvent) -> Vec<Effect> {
        engine.handle(event, &mut Tracer::none())
    }

    fn key(key: Key, ctrl: bool) -> EngineEvent {
        EngineEvent::Key(
            KeyInput {
                key,
                ctrl,
                in_editable: false,
            },
            Instant(0),
        )
    }

    fn surface(source: IntentSource, candidate: f64) -> EngineEvent {
        EngineEvent::Surface { source, candidate }
    }

    fn rate(v: f64) -> Rate {
        Rate::from_candidate(v).unwrap()
    }

    fn persist_count(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Persist(_)))
            .count()
    }

    #[test]
    fn apply_normalizes_and_persists_once() {
        let mut e = engine();
        let effects = handle(&mut e, surface(IntentSource::Slider, 20.0));
        assert_eq!(e.rate(), rate(16.0));
        assert_eq!(persist_count(&effects), 1);
        assert!(effects.contains(&Effect::WriteMediaRate(rate(16.0))));
        assert!(effects.contains(&Effect::ShowLabel(rate(16.0))));

        // Second apply of the same value: repaint and label, no persistence.
        let effects = handle(&mut e, surface(IntentSource::Slider, 16.0));
        assert_eq!(persist_count(&effects), 0);
        assert!(effects.contains(&Effect::Repaint(rate(16.0))));
        assert!(effects.contains(&Effect::ShowLabel(rate(16.0))));
        assert!(!effects.contains(&Effect::WriteMediaRate(rate(16.0))));
    }

    #[test]
    fn chord_digit_selects_preset_immediately() {
        let mut e = engine();
        let effects = handle(&mut e, key(Key::Chord, false));
        assert!(effects.contains(&Effect::SuppressDefault));
        assert!(effects.contains(&Effect::StartTimer(TimerKind::ChordWindow, Span(500))));

        let effects = handle(&mut e, key(Key::Digit(3), false));
        assert!(effects.contains(&Effect::CancelTimer(TimerKind::ChordWindow)));
        assert_eq!(e.rate(), rate(3.0));
        // A late expiry of the canceled window must not reset to neutral.
        let effects = handle(&mut e, EngineEvent::TimerFired(TimerKind::ChordWindow));
        assert!(effects.is_empty());
        assert_eq!(e.rate(), rate(3.0));
    }

    #[test]
    fn chord_window_expiry_resets_to_neutral() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 2.5));
        handle(&mut e, key(Key::Chord, false));
        let effects = handle(&mut e, EngineEvent::TimerFired(TimerKind::ChordWindow));
        assert_eq!(e.rate(), Rate::NEUTRAL);
        assert!(effects.contains(&Effect::WriteMediaRate(Rate::NEUTRAL)));
    }

    #[test]
    fn chord_digit_zero_is_neutral() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 2.0));
        handle(&mut e, key(Key::Chord, false));
        handle(&mut e, key(Key::Digit(0), false));
        assert_eq!(e.rate(), Rate::NEUTRAL);
    }

    #[test]
    fn other_keys_do_not_disturb_the_chord_window() {
        let mut e = engine();
        handle(&mut e, key(Key::Chord, false));
        let effects = handle(&mut e, key(Key::Other, false));
        assert!(effects.is_empty());
        // Digit still lands within the (undisturbed) window.
        handle(&mut e, key(Key::Digit(4), false));
        assert_eq!(e.rate(), rate(4.0));
    }

    #[test]
    fn ctrl_arrows_step_by_quarter() {
        let mut e = engine();
        for _ in 0..4 {
            handle(&mut e, key(Key::ArrowUp, true));
        }
        assert_eq!(e.rate(), rate(2.0));
        handle(&mut e, key(Key::ArrowDown, true));
        assert_eq!(e.rate(), rate(1.75));
        // Without Ctrl the arrows are ordinary page keys.
        let effects = handle(&mut e, key(Key::ArrowUp, false));
        assert!(effects.is_empty());
    }

    #[test]
    fn arrows_step_even_while_chord_is_armed() {
        let mut e = engine();
        handle(&mut e, key(Key::Chord, false));
        handle(&mut e, key(Key::ArrowUp, true));
        assert_eq!(e.rate(), rate(1.25));
        // The chord window is still open.
        handle(&mut e, key(Key::Digit(2), false));
        assert_eq!(e.rate(), rate(2.0));
    }

    #[test]
    fn editable_focus_suppresses_all_shortcuts() {
        let mut e = engine();
        let event = EngineEvent::Key(
            KeyInput {
                key: Key::Chord,
                ctrl: false,
                in_editable: true,
            },
            Instant(0),
        );
        assert!(handle(&mut e, event).is_empty());
        assert_eq!(e.rate(), Rate::NEUTRAL);
    }

    #[test]
    fn disable_then_enable_restores_exact_rate() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 5.0));
        assert_eq!(e.rate(), rate(5.0));

        let effects = handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: false }));
        assert_eq!(e.rate(), Rate::NEUTRAL);
        assert_eq!(e.saved_rate(), rate(5.0));
        assert!(effects.contains(&Effect::SetSurfacesEnabled(false)));
        assert!(effects.contains(&Effect::Persist(StoreDelta {
            enabled: Some(false),
            last_applied: None,
            saved: Some(rate(5.0)),
        })));
        // The forced neutral write does not persist playbackSpeed.
        assert_eq!(persist_count(&effects), 1);

        let effects = handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: true }));
        assert_eq!(e.rate(), rate(5.0));
        assert!(effects.contains(&Effect::SetSurfacesEnabled(true)));
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 3.0));
        handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: false }));
        let effects = handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: false }));
        assert!(effects.is_empty());
        assert_eq!(e.saved_rate(), rate(3.0));
    }

    #[test]
    fn disabled_mode_rejects_every_ordinary_intent() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 2.0));
        handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: false }));

        // Keyboard: suppressed entirely, no effects at all.
        assert!(handle(&mut e, key(Key::Chord, false)).is_empty());
        assert!(handle(&mut e, key(Key::ArrowUp, true)).is_empty());

        // Panel setSpeed: rejected at origin.
        assert!(
            handle(&mut e, EngineEvent::Panel(PanelCommand::SetSpeed { speed: 4.0 })).is_empty()
        );

        // Surface origination: snapped back to neutral, nothing persisted.
        let effects = handle(&mut e, surface(IntentSource::Slider, 4.0));
        assert_eq!(effects, &[Effect::Repaint(Rate::NEUTRAL)]);

        assert_eq!(e.rate(), Rate::NEUTRAL);
        assert_eq!(e.saved_rate(), rate(2.0));
    }

    #[test]
    fn startup_applies_persisted_rate_when_enabled() {
        let mut e = engine();
        let effects = handle(
            &mut e,
            EngineEvent::Startup(PreferenceRecord {
                enabled: true,
                last_applied: 1.75,
                saved: 1.75,
            }),
        );
        assert_eq!(e.rate(), rate(1.75));
        assert!(effects.contains(&Effect::WriteMediaRate(rate(1.75))));
        assert_eq!(persist_count(&effects), 0);
    }

    #[test]
    fn startup_forces_neutral_when_disabled() {
        let mut e = engine();
        let effects = handle(
            &mut e,
            EngineEvent::Startup(PreferenceRecord {
                enabled: false,
                last_applied: 3.0,
                saved: 3.0,
            }),
        );
        assert_eq!(e.rate(), Rate::NEUTRAL);
        assert!(effects.contains(&Effect::SetSurfacesEnabled(false)));
        // Re-enabling restores what the record saved.
        handle(&mut e, EngineEvent::Panel(PanelCommand::Toggle { enabled: true }));
        assert_eq!(e.rate(), rate(3.0));
    }

    #[test]
    fn media_sighting_pushes_authoritative_rate() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::NativeMenu, 2.0));
        let effects = handle(&mut e, EngineEvent::Dom(DomObservation::MediaSighted));
        assert_eq!(
            effects,
            &[
                Effect::BindMedia,
                Effect::WriteMediaRate(rate(2.0)),
                Effect::CancelTimer(TimerKind::SourceSettle),
            ]
        );
    }

    #[test]
    fn source_change_reasserts_after_settle() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 2.0));
        handle(&mut e, EngineEvent::Dom(DomObservation::MediaSighted));
        let effects = handle(&mut e, EngineEvent::Dom(DomObservation::MediaSourceChanged));
        assert_eq!(
            effects,
            &[Effect::StartTimer(TimerKind::SourceSettle, Span(100))]
        );
        let effects = handle(&mut e, EngineEvent::TimerFired(TimerKind::SourceSettle));
        assert!(effects.contains(&Effect::ReassertMediaRate(rate(2.0))));
        assert!(effects.contains(&Effect::Repaint(rate(2.0))));
        // No label flash on a background re-assertion.
        assert!(!effects.iter().any(|e| matches!(e, Effect::ShowLabel(_))));
    }

    #[test]
    fn menu_sighting_attaches_slider_once() {
        let mut e = engine();
        let effects = handle(
            &mut e,
            EngineEvent::Dom(DomObservation::MenuSighted { has_slider: false }),
        );
        assert_eq!(effects, &[Effect::AttachMenuSlider]);
        let effects = handle(
            &mut e,
            EngineEvent::Dom(DomObservation::MenuSighted { has_slider: true }),
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn invalid_surface_text_is_discarded() {
        let mut e = engine();
        handle(&mut e, surface(IntentSource::Slider, 2.0));
        let effects = handle(&mut e, surface(IntentSource::NativeMenu, f64::NAN));
        assert!(effects.is_empty());
        assert_eq!(e.rate(), rate(2.0));
    }

    #[test]
    fn unknown_panel_actions_are_ignored() {
        let mut e = engine();
        assert!(handle(&mut e, EngineEvent::Panel(PanelCommand::Unknown)).is_empty());
    }
}
