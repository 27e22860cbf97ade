// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The injected slider surface.
//!
//! Menus are recreated, not reused, each time they open, so a fresh
//! `SliderSurface` is built for every menu instance; the previous instance's
//! DOM died with the previous menu. Origination fires on input/change and on
//! document-level drag moves (some players swallow input events mid-drag),
//! always through the shared candidate callback — the engine decides what
//! the value means.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use tempostat_core::rate::Rate;
use tempostat_core::surface::Reconciler;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

use crate::selectors::HostSelectors;

/// Class name of the slider's container row.
pub const SLIDER_CONTAINER_CLASS: &str = "tempostat-slider-container";

/// Class name of the range input itself.
pub const SLIDER_CLASS: &str = "tempostat-slider";

/// Class name of the numeric value label.
pub const SLIDER_VALUE_CLASS: &str = "tempostat-slider-value";

/// Class toggled on the container while the mode gate is disabled.
const DISABLED_CLASS: &str = "tempostat-disabled";

/// The slider keeps its own span of the rate domain; presets beyond it are
/// still reachable through the chord, hotkeys, and panel.
const SLIDER_MIN: &str = "0.25";
const SLIDER_MAX: &str = "4";
const SLIDER_STEP: &str = "0.05";

type EventClosure = Closure<dyn FnMut(Event)>;

/// The injected slider inside the current menu instance.
///
/// The drag listeners live on the document (drags leave the input element),
/// so they are explicitly unregistered on drop; everything else dies with
/// the menu instance's DOM.
pub struct SliderSurface {
    container: HtmlElement,
    input: HtmlInputElement,
    value_label: HtmlElement,
    document: Document,
    mousemove: EventClosure,
    mouseup: EventClosure,
    _listeners: Vec<EventClosure>,
}

impl core::fmt::Debug for SliderSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SliderSurface").finish_non_exhaustive()
    }
}

impl SliderSurface {
    /// Builds the slider into `menu`, unless this instance already has one.
    ///
    /// `on_candidate` receives every user-originated value; it is shared
    /// with the drag listeners, which live on the document because drags
    /// leave the input element.
    pub fn install(
        document: &Document,
        menu: &Element,
        selectors: &HostSelectors,
        current: Rate,
        enabled: bool,
        on_candidate: Rc<dyn Fn(f64)>,
    ) -> Result<Option<Self>, JsValue> {
        if menu
            .query_selector(&alloc::format!(".{SLIDER_CONTAINER_CLASS}"))?
            .is_some()
        {
            return Ok(None);
        }

        let container: HtmlElement = document.create_element("div")?.unchecked_into();
        container.set_class_name(SLIDER_CONTAINER_CLASS);

        let header: HtmlElement = document.create_element("div")?.unchecked_into();
        header.set_class_name("tempostat-slider-header");
        let title: HtmlElement = document.create_element("span")?.unchecked_into();
        title.set_text_content(Some("Custom speed"));
        let value_label: HtmlElement = document.create_element("span")?.unchecked_into();
        value_label.set_class_name(SLIDER_VALUE_CLASS);
        value_label.set_text_content(Some(&current.display()));
        header.append_child(&title)?;
        header.append_child(&value_label)?;

        let input: HtmlInputElement = document.create_element("input")?.unchecked_into();
        input.set_type("range");
        input.set_class_name(SLIDER_CLASS);
        input.set_min(SLIDER_MIN);
        input.set_max(SLIDER_MAX);
        input.set_step(SLIDER_STEP);
        input.set_value_as_number(current.value());

        container.append_child(&header)?;
        container.append_child(&input)?;
        menu.append_child(&container)?;

        let mut listeners = Vec::new();

        // input + change both fire origination; the engine's unchanged-value
        // short circuit makes the duplication harmless.
        for event_name in ["input", "change"] {
            let emit = Rc::clone(&on_candidate);
            let emit_input = input.clone();
            let emit_menu = menu.clone();
            let item_selector = selectors.menu_item;
            let active_class = selectors.active_class;
            let closure: EventClosure = Closure::new(move |_event: Event| {
                emit(emit_input.value_as_number());
                clear_active_items(&emit_menu, item_selector, active_class);
            });
            input.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
            listeners.push(closure);
        }

        // Drag tracking: moves are observed on the document since the
        // pointer leaves the input mid-drag.
        let dragging = Rc::new(Cell::new(false));

        let down_dragging = Rc::clone(&dragging);
        let down: EventClosure = Closure::new(move |_event: Event| {
            down_dragging.set(true);
        });
        input.add_event_listener_with_callback("mousedown", down.as_ref().unchecked_ref())?;
        listeners.push(down);

        let move_dragging = Rc::clone(&dragging);
        let move_emit = Rc::clone(&on_candidate);
        let move_input = input.clone();
        let mousemove: EventClosure = Closure::new(move |_event: Event| {
            if move_dragging.get() {
                move_emit(move_input.value_as_number());
            }
        });
        document
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;

        let up_dragging = Rc::clone(&dragging);
        let mouseup: EventClosure = Closure::new(move |_event: Event| {
            up_dragging.set(false);
        });
        document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;

        // Keep clicks inside the slider row from closing the menu.
        let swallow: EventClosure = Closure::new(move |event: Event| {
            event.stop_propagation();
        });
        container.add_event_listener_with_callback("click", swallow.as_ref().unchecked_ref())?;
        listeners.push(swallow);

        let surface = Self {
            container,
            input,
            value_label,
            document: document.clone(),
            mousemove,
            mouseup,
            _listeners: listeners,
        };
        surface.present_enabled(enabled);
        Ok(Some(surface))
    }

    fn present_enabled(&self, enabled: bool) {
        self.input.set_disabled(!enabled);
        let classes = self.container.class_list();
        if enabled {
            let _ = classes.remove_1(DISABLED_CLASS);
        } else {
            let _ = classes.add_1(DISABLED_CLASS);
            self.paint(Rate::NEUTRAL);
        }
    }

    fn paint(&self, rate: Rate) {
        self.input.set_value_as_number(rate.value());
        self.value_label.set_text_content(Some(&rate.display()));
    }
}

impl Drop for SliderSurface {
    fn drop(&mut self) {
        // The document outlives this surface; its listeners must not.
        let _ = self
            .document
            .remove_event_listener_with_callback("mousemove", self.mousemove.as_ref().unchecked_ref());
        let _ = self
            .document
            .remove_event_listener_with_callback("mouseup", self.mouseup.as_ref().unchecked_ref());
    }
}

impl Reconciler for SliderSurface {
    fn repaint(&mut self, rate: Rate) {
        self.paint(rate);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.present_enabled(enabled);
    }
}

/// Clears the host page's active-item marker from every menu item.
///
/// A slider-chosen rate usually matches none of the fixed presets, and the
/// host page only updates its marker for its own clicks.
fn clear_active_items(menu: &Element, item_selector: &str, active_class: &str) {
    let Ok(items) = menu.query_selector_all(item_selector) else {
        return;
    };
    for index in 0..items.length() {
        if let Some(item) = items
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        {
            let _ = item.class_list().remove_1(active_class);
        }
    }
}
