// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Injected stylesheet.
//!
//! One `<style>` element keyed by a unique id; injection removes any stale
//! instance first, so remove-and-reinsert is always safe.

use wasm_bindgen::prelude::*;
use web_sys::Document;

/// Id of the injected `<style>` element.
pub const STYLE_ELEMENT_ID: &str = "tempostat-styles";

const STYLESHEET: &str = "
.tempostat-speed-display {
    position: fixed;
    top: 16px;
    right: 16px;
    z-index: 2147483647;
    padding: 6px 12px;
    border-radius: 6px;
    background: rgba(28, 28, 28, 0.85);
    color: #ffffff;
    font: 600 14px/1.2 -apple-system, system-ui, sans-serif;
    pointer-events: none;
    opacity: 0;
    transition: opacity 0.3s ease;
}

.tempostat-slider-container {
    padding: 10px 12px;
    margin-top: 4px;
    border-top: 1px solid rgba(255, 255, 255, 0.1);
}

.tempostat-slider-container.tempostat-disabled {
    opacity: 0.5;
}

.tempostat-slider-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    margin-bottom: 8px;
    color: rgba(255, 255, 255, 0.85);
    font-size: 12px;
}

.tempostat-slider-value {
    font-weight: 600;
}

.tempostat-slider {
    width: 100%;
}
";

/// Injects the stylesheet, replacing any previously injected instance.
pub fn inject(document: &Document) -> Result<(), JsValue> {
    if let Some(stale) = document.get_element_by_id(STYLE_ELEMENT_ID) {
        stale.remove();
    }
    let style = document.create_element("style")?;
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(STYLESHEET));
    document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?
        .append_child(&style)?;
    Ok(())
}
