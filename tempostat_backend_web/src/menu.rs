// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The native rate-menu surface.
//!
//! The host page owns the menu's markup and its active-item highlighting;
//! tempostat only reads. Origination happens two ways, both parsing the
//! item's displayed numeral: direct clicks on menu items, and class
//! mutations marking an item active (the host page applies those for its
//! own reasons, e.g. keyboard navigation inside the menu). Both feed the
//! same apply funnel, which is idempotent, so the double report for a
//! single user click converges to one write.
//!
//! [`MenuPoller`] covers the menu-open click path: the menu node appears a
//! beat after the rate button is clicked, so the poller re-checks on a short
//! interval with a fixed attempt ceiling and gives up silently.

use alloc::rc::Rc;
use core::cell::Cell;

use tempostat_core::rate::{self, Rate};
use tempostat_core::surface::Reconciler;
use tempostat_core::time::Span;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event};

use crate::observer::DomWatch;
use crate::selectors::HostSelectors;
use crate::timer::Interval;

/// The native menu's reconciler: passive repaint, two origination paths.
pub struct MenuSurface {
    _click: Closure<dyn FnMut(Event)>,
    _class_watch: DomWatch,
}

impl core::fmt::Debug for MenuSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MenuSurface").finish_non_exhaustive()
    }
}

impl MenuSurface {
    /// Attaches click and active-marker observation to a menu instance.
    pub fn install(
        menu: &Element,
        selectors: &HostSelectors,
        on_candidate: Rc<dyn Fn(f64)>,
    ) -> Result<Self, JsValue> {
        let item_selector = selectors.menu_item;
        let active_class = selectors.active_class;

        let click_emit = Rc::clone(&on_candidate);
        let click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(target) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
            else {
                return;
            };
            let Ok(Some(item)) = target.closest(item_selector) else {
                return;
            };
            emit_item_rate(&item, &click_emit);
        });
        menu.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;

        let watch_emit = Rc::clone(&on_candidate);
        let class_watch = DomWatch::class_changes(menu.as_ref(), move |element| {
            if element.class_list().contains(active_class) {
                emit_item_rate(&element, &watch_emit);
            }
        })?;

        Ok(Self {
            _click: click,
            _class_watch: class_watch,
        })
    }
}

impl Reconciler for MenuSurface {
    /// Passive: the host page owns the menu's active-item presentation.
    fn repaint(&mut self, _rate: Rate) {}
}

/// Parses an item's displayed text and forwards a valid candidate.
fn emit_item_rate(item: &Element, emit: &Rc<dyn Fn(f64)>) {
    let Some(text) = item.text_content() else {
        return;
    };
    // Unparsable text is discarded; the authoritative rate is untouched.
    if let Some(candidate) = rate::parse_display(&text) {
        emit(candidate);
    }
}

/// Bounded poll for the menu node after a rate-button click.
pub struct MenuPoller {
    slot: Rc<Cell<Option<Interval>>>,
}

impl core::fmt::Debug for MenuPoller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MenuPoller").finish_non_exhaustive()
    }
}

impl Default for MenuPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuPoller {
    /// Creates an idle poller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Rc::new(Cell::new(None)),
        }
    }

    /// Starts polling: `check` runs once per interval until it reports the
    /// menu was handled or the attempt ceiling is reached, whichever comes
    /// first. A started poll replaces any previous one.
    pub fn start(&self, interval: Span, max_attempts: u32, mut check: impl FnMut() -> bool + 'static) {
        // Stop a previous poll before replacing it. The previous closure is
        // not executing here (poll starts come from click events), so the
        // drop is safe.
        self.slot.take();

        let attempts = Cell::new(0_u32);
        let slot = Rc::clone(&self.slot);
        let ticker = Interval::every(interval, move || {
            attempts.set(attempts.get() + 1);
            let done = check() || attempts.get() >= max_attempts;
            if done {
                // Stop ticking, but leave the closure allocated: dropping it
                // here would free the frame we are executing in. The next
                // start (or the poller's drop) reclaims it.
                if let Some(interval) = slot.take() {
                    interval.stop();
                    slot.set(Some(interval));
                }
            }
        });
        self.slot.set(Some(ticker));
    }
}
