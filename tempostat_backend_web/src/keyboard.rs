// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keydown capture and classification.

use alloc::string::String;

use tempostat_core::event::{Key, KeyInput};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, KeyboardEvent};

/// Classifies a DOM `KeyboardEvent.key` value.
#[must_use]
pub fn classify(key: &str) -> Key {
    match key {
        "a" | "A" => Key::Chord,
        "ArrowUp" => Key::ArrowUp,
        "ArrowDown" => Key::ArrowDown,
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_digit() => {
                    Key::Digit(u8::try_from(c.to_digit(10).unwrap_or(0)).unwrap_or(0))
                }
                _ => Key::Other,
            }
        }
    }
}

fn editable_has_focus(document: &Document) -> bool {
    document.active_element().is_some_and(|element| {
        let tag = element.tag_name();
        tag == "INPUT" || tag == "TEXTAREA"
    })
}

/// The installed keydown listener.
pub struct KeyCapture {
    _closure: Closure<dyn FnMut(KeyboardEvent)>,
}

impl core::fmt::Debug for KeyCapture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyCapture").finish_non_exhaustive()
    }
}

impl KeyCapture {
    /// Installs a document-level keydown listener.
    ///
    /// `handler` receives the classified input and returns whether the
    /// page's default handling must be suppressed; suppression happens
    /// before the browser event callback returns.
    pub fn install(
        document: &Document,
        mut handler: impl FnMut(KeyInput) -> bool + 'static,
    ) -> Result<Self, JsValue> {
        let handler_document = document.clone();
        let closure = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let key: String = event.key();
            let input = KeyInput {
                key: classify(&key),
                ctrl: event.ctrl_key(),
                in_editable: editable_has_focus(&handler_document),
            };
            if handler(input) {
                event.prevent_default();
            }
        });
        document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        Ok(Self { _closure: closure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_chord_and_digits() {
        assert_eq!(classify("a"), Key::Chord);
        assert_eq!(classify("A"), Key::Chord);
        assert_eq!(classify("0"), Key::Digit(0));
        assert_eq!(classify("7"), Key::Digit(7));
        assert_eq!(classify("ArrowUp"), Key::ArrowUp);
        assert_eq!(classify("ArrowDown"), Key::ArrowDown);
        assert_eq!(classify("Enter"), Key::Other);
        assert_eq!(classify("b"), Key::Other);
        // Multi-char strings starting with a digit are not digits.
        assert_eq!(classify("F10"), Key::Other);
    }
}
