// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `chrome.storage.local` persistence collaborator.
//!
//! Reads happen once per page context at startup; writes are incremental
//! and fire-and-forget. A write failure is reported to the caller so it can
//! be logged through the trace channel — it is never propagated further,
//! and a page running outside the extension (no `chrome.storage`) simply
//! keeps its preferences in memory for the session.

use js_sys::{Array, Function, Object, Reflect};
use tempostat_core::store::{KEY_ENABLED, KEY_LAST_APPLIED, KEY_SAVED, PreferenceRecord, StoreDelta};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::api_available;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = "get")]
    fn storage_local_get(keys: &JsValue, callback: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = "set")]
    fn storage_local_set(items: &Object) -> Result<(), JsValue>;
}

/// Returns whether the extension storage area is reachable.
#[must_use]
pub fn available() -> bool {
    api_available(&["chrome", "storage", "local"])
}

/// Requests the preference record, delivering it to `on_loaded`.
///
/// Absent or malformed keys fall back to their defaults (enabled, neutral),
/// mirroring a first run. Returns `false` without calling `on_loaded` if
/// the storage area is unreachable; the caller decides how to degrade.
pub fn load(on_loaded: impl FnOnce(PreferenceRecord) + 'static) -> bool {
    if !available() {
        return false;
    }
    let keys = Array::new();
    for key in [KEY_ENABLED, KEY_LAST_APPLIED, KEY_SAVED] {
        keys.push(&JsValue::from_str(key));
    }
    let callback = Closure::once(move |result: JsValue| {
        on_loaded(record_from_js(&result));
    });
    let requested = storage_local_get(&keys, callback.as_ref().unchecked_ref()).is_ok();
    if requested {
        // The runtime invokes the callback exactly once; the closure's cell
        // is released to JS for the lifetime of the page.
        callback.forget();
    }
    requested
}

/// Writes the changed keys. Returns whether the write was accepted.
pub fn persist(delta: &StoreDelta) -> bool {
    if delta.is_empty() {
        return true;
    }
    if !available() {
        return false;
    }
    let items = Object::new();
    let mut ok = true;
    if let Some(enabled) = delta.enabled {
        ok &= Reflect::set(
            &items,
            &JsValue::from_str(KEY_ENABLED),
            &JsValue::from_bool(enabled),
        )
        .unwrap_or(false);
    }
    if let Some(rate) = delta.last_applied {
        ok &= Reflect::set(
            &items,
            &JsValue::from_str(KEY_LAST_APPLIED),
            &JsValue::from_f64(rate.value()),
        )
        .unwrap_or(false);
    }
    if let Some(rate) = delta.saved {
        ok &= Reflect::set(
            &items,
            &JsValue::from_str(KEY_SAVED),
            &JsValue::from_f64(rate.value()),
        )
        .unwrap_or(false);
    }
    ok && storage_local_set(&items).is_ok()
}

/// Builds a record from the storage result object.
///
/// `pluginEnabled` defaults to true when absent (the "not yet configured"
/// state); the rate keys treat absent, non-numeric, and non-positive values
/// as neutral.
fn record_from_js(result: &JsValue) -> PreferenceRecord {
    let get = |key: &str| Reflect::get(result, &JsValue::from_str(key)).ok();
    PreferenceRecord {
        enabled: get(KEY_ENABLED)
            .and_then(|value| value.as_bool())
            .unwrap_or(true),
        last_applied: get(KEY_LAST_APPLIED)
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(1.0),
        saved: get(KEY_SAVED)
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(1.0),
    }
}
