// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bound media element.
//!
//! The host page destroys and recreates its `<video>` element at will, so
//! binding is stateless from the DOM's point of view: a marker attribute on
//! the element itself records that tempostat already owns it. Re-entrant
//! observer callbacks see the marker and skip, which is the idempotence the
//! acquisition watcher relies on.

use tempostat_core::rate::Rate;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlVideoElement};

use crate::observer::DomWatch;
use crate::selectors::HostSelectors;

/// Marker attribute identifying an element tempostat has already bound.
pub const BOUND_MARKER: &str = "data-tempostat-bound";

/// Difference below which the element's rate is considered in sync.
const RATE_EPSILON: f64 = 1e-9;

/// Returns whether the document contains a media element not yet bound.
pub fn unbound_media_present(document: &Document, selectors: &HostSelectors) -> bool {
    document
        .query_selector(selectors.media)
        .ok()
        .flatten()
        .is_some_and(|element| !element.has_attribute(BOUND_MARKER))
}

/// The currently bound media element plus its source-change observer.
pub struct MediaBinding {
    video: HtmlVideoElement,
    _source_watch: DomWatch,
    rate_listener: Closure<dyn FnMut(Event)>,
}

impl core::fmt::Debug for MediaBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MediaBinding").finish_non_exhaustive()
    }
}

impl MediaBinding {
    /// Binds the document's media element, if an unbound one is present.
    ///
    /// Marks the element, attaches an attribute observer scoped to the
    /// source-identifying attributes, and listens for `ratechange` so the
    /// injected slider can mirror rate changes made by the host page itself.
    pub fn acquire(
        document: &Document,
        selectors: &HostSelectors,
        on_source_changed: impl FnMut() + 'static,
        mut on_rate_changed: impl FnMut(f64) + 'static,
    ) -> Result<Option<Self>, JsValue> {
        let Some(element) = document.query_selector(selectors.media)? else {
            return Ok(None);
        };
        let Ok(video) = element.dyn_into::<HtmlVideoElement>() else {
            return Ok(None);
        };
        if video.has_attribute(BOUND_MARKER) {
            return Ok(None);
        }
        video.set_attribute(BOUND_MARKER, "")?;

        let source_watch = DomWatch::attributes(
            video.as_ref(),
            &selectors.source_attributes,
            on_source_changed,
        )?;

        let listener_video = video.clone();
        let rate_listener = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            on_rate_changed(listener_video.playback_rate());
        });
        video.add_event_listener_with_callback("ratechange", rate_listener.as_ref().unchecked_ref())?;

        Ok(Some(Self {
            video,
            _source_watch: source_watch,
            rate_listener,
        }))
    }

    /// Writes the rate onto the element unconditionally.
    pub fn write(&self, rate: Rate) {
        self.video.set_playback_rate(rate.value());
    }

    /// Writes the rate only if the element currently disagrees.
    ///
    /// Used after the source-settle delay so the engine does not fight the
    /// host page's own transient writes.
    pub fn reassert(&self, rate: Rate) {
        if (self.video.playback_rate() - rate.value()).abs() > RATE_EPSILON {
            self.video.set_playback_rate(rate.value());
        }
    }

}

impl Drop for MediaBinding {
    fn drop(&mut self) {
        // A replaced element can linger and still emit ratechange; the
        // listener must not outlive its closure.
        let _ = self.video.remove_event_listener_with_callback(
            "ratechange",
            self.rate_listener.as_ref().unchecked_ref(),
        );
    }
}
