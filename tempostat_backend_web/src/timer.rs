// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancelable `setTimeout`/`setInterval` handles.
//!
//! [`Timeout`] owns both the browser timer id and the Rust closure; dropping
//! it cancels the timer, so "restart" is just replacing the slot. The engine
//! guarantees a timer's own expiry never restarts or cancels the same timer
//! within the same dispatch, so the executing closure is never dropped
//! mid-call.

use core::cell::RefCell;

use tempostat_core::event::TimerKind;
use tempostat_core::time::Span;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);

    #[wasm_bindgen(js_name = "setInterval")]
    pub(crate) fn set_interval(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    pub(crate) fn clear_interval(id: i32);
}

pub(crate) fn span_to_millis(span: Span) -> i32 {
    i32::try_from(span.millis()).unwrap_or(i32::MAX)
}

/// A one-shot timer that is canceled when dropped.
pub struct Timeout {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Timeout {
    /// Schedules `callback` to run once after `span`.
    pub fn schedule(span: Span, callback: impl FnMut() + 'static) -> Self {
        let closure = Closure::<dyn FnMut()>::new(callback);
        let id = set_timeout(closure.as_ref().unchecked_ref(), span_to_millis(span));
        Self {
            id,
            _closure: closure,
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        // Clearing an already-fired id is a harmless no-op.
        clear_timeout(self.id);
    }
}

impl core::fmt::Debug for Timeout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timeout").field("id", &self.id).finish()
    }
}

/// One slot per engine timer, with restart-on-start semantics.
///
/// Interior mutability lets the bank live inside a shared context object;
/// callbacks scheduled from one event can restart timers for the next.
#[derive(Debug, Default)]
pub struct TimerBank {
    chord: RefCell<Option<Timeout>>,
    settle: RefCell<Option<Timeout>>,
}

impl TimerBank {
    /// Creates a bank with no pending timers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the timer for `kind`.
    pub fn start(&self, kind: TimerKind, span: Span, callback: impl FnMut() + 'static) {
        // Replacing the slot drops (cancels) any pending timer of this kind.
        *self.slot(kind).borrow_mut() = Some(Timeout::schedule(span, callback));
    }

    /// Cancels the pending timer for `kind`, if any.
    pub fn cancel(&self, kind: TimerKind) {
        self.slot(kind).borrow_mut().take();
    }

    fn slot(&self, kind: TimerKind) -> &RefCell<Option<Timeout>> {
        match kind {
            TimerKind::ChordWindow => &self.chord,
            TimerKind::SourceSettle => &self.settle,
        }
    }
}

/// A repeating timer that is canceled when dropped.
pub(crate) struct Interval {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub(crate) fn every(span: Span, callback: impl FnMut() + 'static) -> Self {
        let closure = Closure::<dyn FnMut()>::new(callback);
        let id = set_interval(closure.as_ref().unchecked_ref(), span_to_millis(span));
        Self {
            id,
            _closure: closure,
        }
    }

    /// Stops the interval without dropping the closure, so it is safe to
    /// call from inside the interval's own callback.
    pub(crate) fn stop(&self) {
        clear_interval(self.id);
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        clear_interval(self.id);
    }
}

impl core::fmt::Debug for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interval").field("id", &self.id).finish()
    }
}
