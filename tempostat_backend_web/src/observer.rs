// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `MutationObserver` wiring.
//!
//! [`DomWatch`] owns one observer plus its Rust closure and disconnects on
//! drop. The constructors cover the three observation shapes the watcher
//! needs: structural churn under a subtree (media element and menu
//! discovery), attribute mutations on a single element (source changes),
//! and class-attribute mutations with access to the mutated targets
//! (native-menu active-item flips).
//!
//! Callbacks receive no interpretation of the records: discovery callbacks
//! re-query the document with presence checks instead, which is what makes
//! redundant batched deliveries harmless.

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord, Node};

type WatchClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// An owned `MutationObserver`, disconnected when dropped.
pub struct DomWatch {
    observer: MutationObserver,
    _closure: WatchClosure,
}

impl core::fmt::Debug for DomWatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomWatch").finish_non_exhaustive()
    }
}

impl DomWatch {
    /// Observes child-list changes under `target`'s whole subtree.
    pub fn child_list(target: &Node, mut on_batch: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure: WatchClosure =
            Closure::new(move |_records: Array, _observer: MutationObserver| on_batch());
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(target, &init)?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Observes mutations of the named attributes on `target` only.
    pub fn attributes(
        target: &Node,
        filter: &[&str],
        mut on_batch: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let closure: WatchClosure =
            Closure::new(move |_records: Array, _observer: MutationObserver| on_batch());
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_filter(&str_array(filter));
        observer.observe_with_options(target, &init)?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Observes `class` mutations under `target`'s subtree, handing each
    /// mutated element to `on_target`.
    pub fn class_changes(
        target: &Node,
        mut on_target: impl FnMut(web_sys::Element) + 'static,
    ) -> Result<Self, JsValue> {
        let closure: WatchClosure =
            Closure::new(move |records: Array, _observer: MutationObserver| {
                for record in records.iter() {
                    let record: MutationRecord = record.unchecked_into();
                    if let Some(element) = record
                        .target()
                        .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
                    {
                        on_target(element);
                    }
                }
            });
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_subtree(true);
        init.set_attribute_filter(&str_array(&["class"]));
        observer.observe_with_options(target, &init)?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Stops observing.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for DomWatch {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn str_array(items: &[&str]) -> Array {
    let array = Array::new();
    for item in items {
        array.push(&JsValue::from_str(item));
    }
    array
}
