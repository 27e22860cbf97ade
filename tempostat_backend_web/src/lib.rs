// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for tempostat.
//!
//! This crate provides integration with browser and extension APIs:
//!
//! - [`DomWatch`]: `MutationObserver` wiring producing structural and
//!   attribute observations
//! - [`Timeout`] / [`TimerBank`]: cancelable `setTimeout` handles for the
//!   engine's timers
//! - [`MediaBinding`]: the bound media element, its source-change observer,
//!   and the idempotent bound marker
//! - [`SliderSurface`], [`MenuSurface`], [`TransientLabel`]: the surface
//!   reconciler implementations
//! - [`KeyCapture`]: keydown classification for the chord machine
//! - [`storage`] / [`messaging`]: the `chrome.storage.local` and
//!   `chrome.runtime.onMessage` collaborators
//! - [`ConsoleSink`]: a [`TraceSink`](tempostat_core::trace::TraceSink)
//!   writing to the browser console

#![no_std]

extern crate alloc;

mod console;
mod keyboard;
mod label;
mod media;
mod menu;
mod observer;
mod selectors;
mod slider;
pub mod messaging;
pub mod storage;
pub mod styles;
pub mod timer;

pub use console::ConsoleSink;
pub use keyboard::KeyCapture;
pub use label::TransientLabel;
pub use media::{BOUND_MARKER, MediaBinding, unbound_media_present};
pub use menu::{MenuPoller, MenuSurface};
pub use observer::DomWatch;
pub use selectors::HostSelectors;
pub use slider::SliderSurface;
pub use timer::{TimerBank, Timeout};

use tempostat_core::time::Instant;
use wasm_bindgen::prelude::*;

// Direct global bindings instead of `web_sys::Window` methods — avoids
// fetching (and unwrapping) the Window/Performance objects on every event.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;
}

/// Returns the current host time from `performance.now()`, truncated to
/// whole milliseconds.
#[must_use]
pub fn now() -> Instant {
    let ms = performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns a small positive f64; ms fits in u64"
    )]
    let millis = ms as u64;
    Instant(millis)
}

/// Returns whether a dotted extension API path exists on the global object.
///
/// Content scripts can be injected into contexts without the extension
/// runtime (or run under a host page that deletes `chrome`); collaborators
/// check before binding so absence degrades gracefully instead of throwing.
pub(crate) fn api_available(path: &[&str]) -> bool {
    let mut current: JsValue = js_sys::global().into();
    for segment in path {
        let Ok(next) = js_sys::Reflect::get(&current, &JsValue::from_str(segment)) else {
            return false;
        };
        if next.is_undefined() || next.is_null() {
            return false;
        }
        current = next;
    }
    true
}
