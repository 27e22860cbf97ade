// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transient on-screen rate label.
//!
//! Repaint-only surface: shows the formatted rate, then fades after the
//! configured hold. Re-showing while a fade is pending restarts the hold.

use core::cell::RefCell;

use tempostat_core::rate::Rate;
use tempostat_core::surface::Reconciler;
use tempostat_core::time::Span;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use crate::timer::Timeout;

/// Class name of the injected label element.
pub const LABEL_CLASS: &str = "tempostat-speed-display";

/// The injected label element plus its pending fade timer.
pub struct TransientLabel {
    element: HtmlElement,
    hold: Span,
    fade: RefCell<Option<Timeout>>,
}

impl core::fmt::Debug for TransientLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransientLabel")
            .field("hold", &self.hold)
            .finish_non_exhaustive()
    }
}

impl TransientLabel {
    /// Creates the label element and appends it to the document body.
    pub fn install(document: &Document, hold: Span) -> Result<Self, JsValue> {
        let element: HtmlElement = document.create_element("div")?.unchecked_into();
        element.set_class_name(LABEL_CLASS);
        document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?
            .append_child(&element)?;
        Ok(Self {
            element,
            hold,
            fade: RefCell::new(None),
        })
    }

    /// Shows the rate, restarting the fade hold.
    pub fn show(&self, rate: Rate) {
        self.element.set_text_content(Some(&rate.display()));
        let _ = self.element.style().set_property("opacity", "1");
        let fade_element = self.element.clone();
        *self.fade.borrow_mut() = Some(Timeout::schedule(self.hold, move || {
            let _ = fade_element.style().set_property("opacity", "0");
        }));
    }
}

impl Reconciler for TransientLabel {
    fn repaint(&mut self, rate: Rate) {
        self.show(rate);
    }
}
