// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted host-page simulation for exercising the engine end to end.
//!
//! [`PageHarness`] plays the role the browser backend plays in production:
//! it owns a virtual clock, pending timers, a fake media element with the
//! bound-marker presence check, a fake menu, and a fake preference store,
//! and it applies every [`Effect`] the engine returns the way the real
//! backend would. Scenarios drive it with the same primitives the hostile
//! host page produces — element churn, source swaps that reset the rate to
//! neutral, menus rebuilt on every open — and then assert on what the page
//! would actually observe.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use tempostat_core::engine::{Engine, EngineConfig};
use tempostat_core::event::{
    DomObservation, Effect, EngineEvent, IntentSource, Key, KeyInput, PanelCommand, TimerKind,
};
use tempostat_core::rate;
use tempostat_core::store::PreferenceRecord;
use tempostat_core::time::{Instant, Span};
use tempostat_core::trace::Tracer;

/// A virtual millisecond clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct VirtualClock {
    now: Instant,
}

impl VirtualClock {
    /// Returns the current virtual time.
    #[must_use]
    pub const fn now(&self) -> Instant {
        self.now
    }

    fn set(&mut self, now: Instant) {
        self.now = now;
    }
}

/// The fake media element, including the bound-marker presence check.
#[derive(Clone, Copy, Debug)]
struct FakeMedia {
    rate: f64,
    marked: bool,
}

impl FakeMedia {
    const fn fresh() -> Self {
        // New elements come from the host page playing at normal speed.
        Self {
            rate: 1.0,
            marked: false,
        }
    }
}

/// The fake preference store: last merged record plus a write counter.
#[derive(Clone, Copy, Debug)]
pub struct FakeStore {
    record: PreferenceRecord,
    writes: u64,
}

impl FakeStore {
    /// Returns the current persisted record.
    #[must_use]
    pub const fn record(&self) -> &PreferenceRecord {
        &self.record
    }

    /// Returns how many set calls the engine has requested.
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.writes
    }
}

/// Scripted host page plus the backend plumbing the engine expects.
#[derive(Debug)]
pub struct PageHarness {
    engine: Engine,
    clock: VirtualClock,
    timers: Vec<(TimerKind, Instant)>,
    media: Option<FakeMedia>,
    menu_open: bool,
    menu_has_slider: bool,
    store: FakeStore,
    repaints: Vec<f64>,
    labels: Vec<f64>,
    surfaces_enabled: bool,
    suppressed: u32,
}

impl Default for PageHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl PageHarness {
    /// Creates a harness with a fresh engine and default preferences, before
    /// the startup record has been delivered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: Engine::new(EngineConfig::host_page()),
            clock: VirtualClock::default(),
            timers: Vec::new(),
            media: None,
            menu_open: false,
            menu_has_slider: false,
            store: FakeStore {
                record: PreferenceRecord::default(),
                writes: 0,
            },
            repaints: Vec::new(),
            labels: Vec::new(),
            surfaces_enabled: true,
            suppressed: 0,
        }
    }

    /// Creates a harness and delivers `record` as the startup preferences.
    #[must_use]
    pub fn with_record(record: PreferenceRecord) -> Self {
        let mut harness = Self::new();
        harness.store.record = record;
        harness.dispatch(EngineEvent::Startup(record));
        harness
    }

    // -- Inspection --

    /// Returns the engine under test.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns the media element's current rate, if one is attached.
    #[must_use]
    pub fn media_rate(&self) -> Option<f64> {
        self.media.map(|media| media.rate)
    }

    /// Returns the fake preference store.
    #[must_use]
    pub const fn store(&self) -> &FakeStore {
        &self.store
    }

    /// Returns every rate the surfaces were repainted with, oldest first.
    #[must_use]
    pub fn repaints(&self) -> &[f64] {
        &self.repaints
    }

    /// Returns every rate the transient label showed, oldest first.
    #[must_use]
    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Returns whether surfaces are in their enabled presentation.
    #[must_use]
    pub const fn surfaces_enabled(&self) -> bool {
        self.surfaces_enabled
    }

    /// Returns how many key events had their default handling suppressed.
    #[must_use]
    pub const fn suppressed_keys(&self) -> u32 {
        self.suppressed
    }

    /// Returns whether the current menu instance carries the injected slider.
    #[must_use]
    pub const fn menu_has_slider(&self) -> bool {
        self.menu_open && self.menu_has_slider
    }

    // -- Page scripting --

    /// The host page inserts a fresh media element.
    pub fn attach_media(&mut self) {
        self.media = Some(FakeMedia::fresh());
        self.scan();
    }

    /// The host page tears the media element down and inserts a new one.
    pub fn replace_media(&mut self) {
        self.attach_media();
    }

    /// The host page swaps the media source in place, resetting the
    /// element's rate to normal as real players do.
    pub fn change_source(&mut self) {
        if let Some(media) = &mut self.media {
            media.rate = 1.0;
        }
        self.dispatch(EngineEvent::Dom(DomObservation::MediaSourceChanged));
    }

    /// The host page opens (rebuilds) the native rate menu.
    pub fn open_menu(&mut self) {
        self.menu_open = true;
        self.menu_has_slider = false;
        self.scan();
    }

    /// The host page closes and destroys the menu instance.
    pub fn close_menu(&mut self) {
        self.menu_open = false;
        self.menu_has_slider = false;
    }

    /// Runs the body-observer callback: presence-checked sightings only.
    pub fn scan(&mut self) {
        if let Some(media) = self.media
            && !media.marked
        {
            self.dispatch(EngineEvent::Dom(DomObservation::MediaSighted));
        }
        if self.menu_open && !self.menu_has_slider {
            self.dispatch(EngineEvent::Dom(DomObservation::MenuSighted {
                has_slider: false,
            }));
        }
    }

    /// A keydown on the page.
    pub fn press(&mut self, key: Key, ctrl: bool) {
        let now = self.clock.now();
        self.dispatch(EngineEvent::Key(
            KeyInput {
                key,
                ctrl,
                in_editable: false,
            },
            now,
        ));
    }

    /// A keydown while a text field holds focus.
    pub fn press_in_editable(&mut self, key: Key, ctrl: bool) {
        let now = self.clock.now();
        self.dispatch(EngineEvent::Key(
            KeyInput {
                key,
                ctrl,
                in_editable: true,
            },
            now,
        ));
    }

    /// The user drags the injected slider to `value`.
    pub fn drag_slider(&mut self, value: f64) {
        self.dispatch(EngineEvent::Surface {
            source: IntentSource::Slider,
            candidate: value,
        });
    }

    /// The user clicks a native menu item displaying `text`.
    ///
    /// Unparsable text is discarded at the surface, like the backend does.
    pub fn click_menu_item(&mut self, text: &str) {
        if let Some(candidate) = rate::parse_display(text) {
            self.dispatch(EngineEvent::Surface {
                source: IntentSource::NativeMenu,
                candidate,
            });
        }
    }

    /// The control panel sends a command over the messaging channel.
    pub fn panel(&mut self, command: PanelCommand) {
        self.dispatch(EngineEvent::Panel(command));
    }

    /// Advances the virtual clock, firing due timers in deadline order.
    pub fn advance(&mut self, span: Span) {
        let target = self.clock.now() + span;
        loop {
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, (_, deadline))| *deadline <= target)
                .min_by_key(|(_, (_, deadline))| *deadline);
            let Some((index, &(kind, deadline))) = due else {
                break;
            };
            self.timers.swap_remove(index);
            self.clock.set(deadline);
            self.dispatch(EngineEvent::TimerFired(kind));
        }
        self.clock.set(target);
    }

    // -- Effect application (what the browser backend does) --

    fn dispatch(&mut self, event: EngineEvent) {
        let effects = self.engine.handle(event, &mut Tracer::none());
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::SuppressDefault => self.suppressed += 1,
            Effect::BindMedia => {
                if let Some(media) = &mut self.media {
                    media.marked = true;
                }
            }
            Effect::WriteMediaRate(rate) => {
                if let Some(media) = &mut self.media {
                    media.rate = rate.value();
                }
            }
            Effect::ReassertMediaRate(rate) => {
                if let Some(media) = &mut self.media
                    && media.rate != rate.value()
                {
                    media.rate = rate.value();
                }
            }
            Effect::Repaint(rate) => self.repaints.push(rate.value()),
            Effect::ShowLabel(rate) => self.labels.push(rate.value()),
            Effect::SetSurfacesEnabled(enabled) => self.surfaces_enabled = enabled,
            Effect::AttachMenuSlider => {
                if self.menu_open {
                    self.menu_has_slider = true;
                }
            }
            Effect::Persist(delta) => {
                self.store.record = delta.merged_into(&self.store.record);
                self.store.writes += 1;
            }
            Effect::StartTimer(kind, span) => {
                self.timers.retain(|(pending, _)| *pending != kind);
                self.timers.push((kind, self.clock.now() + span));
            }
            Effect::CancelTimer(kind) => {
                self.timers.retain(|(pending, _)| *pending != kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempostat_core::rate::Rate;

    fn enabled_record(rate: f64) -> PreferenceRecord {
        PreferenceRecord {
            enabled: true,
            last_applied: rate,
            saved: rate,
        }
    }

    #[test]
    fn startup_rate_reaches_late_media_element() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        assert_eq!(page.media_rate(), None);
        // The element appears later; the authoritative rate follows it.
        page.attach_media();
        assert_eq!(page.media_rate(), Some(2.0));
    }

    #[test]
    fn source_swap_is_reconverged_after_settle() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        page.attach_media();
        page.change_source();
        // The host page just reset the element to normal speed.
        assert_eq!(page.media_rate(), Some(1.0));
        page.advance(Span(99));
        assert_eq!(page.media_rate(), Some(1.0));
        page.advance(Span(1));
        assert_eq!(page.media_rate(), Some(2.0));
    }

    #[test]
    fn element_replacement_rebinds_without_user_action() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.drag_slider(3.0);
        assert_eq!(page.media_rate(), Some(3.0));
        page.replace_media();
        assert_eq!(page.media_rate(), Some(3.0));
    }

    #[test]
    fn duplicate_observer_callbacks_do_not_double_bind() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        page.attach_media();
        let writes = page.store().writes();
        let repaints = page.repaints().len();
        // Mutation batching fires the callback again for the same change.
        page.scan();
        page.scan();
        assert_eq!(page.store().writes(), writes);
        assert_eq!(page.repaints().len(), repaints);
    }

    #[test]
    fn chord_then_digit_within_window() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.press(Key::Chord, false);
        page.advance(Span(499));
        page.press(Key::Digit(3), false);
        assert_eq!(page.media_rate(), Some(3.0));
        // The canceled window must not fire later.
        page.advance(Span(1000));
        assert_eq!(page.media_rate(), Some(3.0));
        assert_eq!(page.suppressed_keys(), 2);
    }

    #[test]
    fn chord_alone_resets_to_neutral_after_window() {
        let mut page = PageHarness::with_record(enabled_record(2.5));
        page.attach_media();
        page.press(Key::Chord, false);
        page.advance(Span(500));
        assert_eq!(page.media_rate(), Some(1.0));
        assert_eq!(page.engine().rate(), Rate::NEUTRAL);
    }

    #[test]
    fn rearming_restarts_the_window() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        page.attach_media();
        page.press(Key::Chord, false);
        page.advance(Span(400));
        page.press(Key::Chord, false);
        // 800 ms after the first press, but only 400 ms after the second.
        page.advance(Span(400));
        assert_eq!(page.media_rate(), Some(2.0));
        page.press(Key::Digit(4), false);
        assert_eq!(page.media_rate(), Some(4.0));
    }

    #[test]
    fn ctrl_arrow_steps_accumulate() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        for _ in 0..4 {
            page.press(Key::ArrowUp, true);
        }
        assert_eq!(page.media_rate(), Some(2.0));
    }

    #[test]
    fn typing_in_a_text_field_is_left_alone() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.press_in_editable(Key::Chord, false);
        page.press_in_editable(Key::Digit(5), false);
        assert_eq!(page.media_rate(), Some(1.0));
        assert_eq!(page.suppressed_keys(), 0);
    }

    #[test]
    fn menu_rebuild_gets_a_fresh_slider_each_open() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.open_menu();
        assert!(page.menu_has_slider());
        page.close_menu();
        assert!(!page.menu_has_slider());
        page.open_menu();
        assert!(page.menu_has_slider());
    }

    #[test]
    fn menu_click_parses_displayed_text() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.click_menu_item(" 1.5x ");
        assert_eq!(page.media_rate(), Some(1.5));
        // Unparsable text leaves the authoritative rate untouched.
        page.click_menu_item("normal");
        assert_eq!(page.media_rate(), Some(1.5));
    }

    #[test]
    fn unchanged_apply_costs_no_second_persist() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.drag_slider(2.0);
        let writes = page.store().writes();
        page.drag_slider(2.0);
        assert_eq!(page.store().writes(), writes);
        // But the surfaces still converged (repaint + label).
        assert_eq!(page.labels().last(), Some(&2.0));
    }

    #[test]
    fn disable_enable_round_trip_restores_rate() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.drag_slider(5.0);

        page.panel(PanelCommand::Toggle { enabled: false });
        assert_eq!(page.media_rate(), Some(1.0));
        assert!(!page.surfaces_enabled());
        assert!(!page.store().record().enabled);
        assert_eq!(page.store().record().saved, 5.0);

        page.panel(PanelCommand::Toggle { enabled: true });
        assert_eq!(page.media_rate(), Some(5.0));
        assert!(page.surfaces_enabled());
        assert!(page.store().record().enabled);
    }

    #[test]
    fn disabled_page_ignores_every_input_surface() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        page.attach_media();
        page.panel(PanelCommand::Toggle { enabled: false });
        let persisted = *page.store().record();
        let writes = page.store().writes();

        page.press(Key::Chord, false);
        page.advance(Span(500));
        page.press(Key::ArrowUp, true);
        page.drag_slider(4.0);
        page.click_menu_item("4.0x");
        page.panel(PanelCommand::SetSpeed { speed: 4.0 });

        assert_eq!(page.media_rate(), Some(1.0));
        assert_eq!(page.engine().rate(), Rate::NEUTRAL);
        assert_eq!(*page.store().record(), persisted);
        assert_eq!(page.store().writes(), writes);
        // The saved rate survives for the next enable.
        page.panel(PanelCommand::Toggle { enabled: true });
        assert_eq!(page.media_rate(), Some(2.0));
    }

    #[test]
    fn disabled_startup_record_keeps_page_neutral() {
        let mut page = PageHarness::with_record(PreferenceRecord {
            enabled: false,
            last_applied: 3.0,
            saved: 3.0,
        });
        page.attach_media();
        assert_eq!(page.media_rate(), Some(1.0));
        assert!(!page.surfaces_enabled());
    }

    #[test]
    fn settle_timer_is_superseded_by_replacement() {
        let mut page = PageHarness::with_record(enabled_record(2.0));
        page.attach_media();
        page.change_source();
        // Before the settle fires, the host replaces the element outright.
        page.replace_media();
        assert_eq!(page.media_rate(), Some(2.0));
        page.advance(Span(200));
        assert_eq!(page.media_rate(), Some(2.0));
    }

    #[test]
    fn panel_set_speed_converges_all_surfaces() {
        let mut page = PageHarness::with_record(enabled_record(1.0));
        page.attach_media();
        page.open_menu();
        page.panel(PanelCommand::SetSpeed { speed: 1.75 });
        assert_eq!(page.media_rate(), Some(1.75));
        assert_eq!(page.repaints().last(), Some(&1.75));
        assert_eq!(page.labels().last(), Some(&1.75));
        assert_eq!(page.store().record().last_applied, 1.75);
    }
}
