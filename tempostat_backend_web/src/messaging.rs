// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `chrome.runtime.onMessage` messaging collaborator.
//!
//! The control panel sends `{action: "togglePlugin", enabled}` and
//! `{action: "setSpeed", speed}`; the page agent sends nothing back, and
//! unknown actions are ignored rather than rejected so a newer panel can
//! talk to an older agent without breaking it.

use js_sys::{Function, Reflect};
use tempostat_core::event::PanelCommand;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::api_available;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = "addListener")]
    fn on_message_add_listener(callback: &Function) -> Result<(), JsValue>;
}

/// Returns whether the extension messaging channel is reachable.
#[must_use]
pub fn available() -> bool {
    api_available(&["chrome", "runtime", "onMessage"])
}

/// The installed message listener.
pub struct MessageListener {
    _closure: Closure<dyn FnMut(JsValue, JsValue, JsValue)>,
}

impl core::fmt::Debug for MessageListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageListener").finish_non_exhaustive()
    }
}

/// Installs the panel-command listener.
///
/// Returns `None` when the messaging channel is unreachable (the page is
/// running outside the extension); the engine then simply never receives
/// panel commands.
pub fn install(mut on_command: impl FnMut(PanelCommand) + 'static) -> Option<MessageListener> {
    if !available() {
        return None;
    }
    let closure = Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
        move |message: JsValue, _sender: JsValue, _send_response: JsValue| {
            on_command(parse(&message));
        },
    );
    if on_message_add_listener(closure.as_ref().unchecked_ref()).is_err() {
        return None;
    }
    Some(MessageListener { _closure: closure })
}

/// Maps a raw panel message onto a [`PanelCommand`].
fn parse(message: &JsValue) -> PanelCommand {
    let get = |key: &str| Reflect::get(message, &JsValue::from_str(key)).ok();
    let Some(action) = get("action").and_then(|value| value.as_string()) else {
        return PanelCommand::Unknown;
    };
    match action.as_str() {
        "togglePlugin" => match get("enabled").and_then(|value| value.as_bool()) {
            Some(enabled) => PanelCommand::Toggle { enabled },
            None => PanelCommand::Unknown,
        },
        "setSpeed" => match get("speed").and_then(|value| value.as_f64()) {
            Some(speed) => PanelCommand::SetSpeed { speed },
            None => PanelCommand::Unknown,
        },
        _ => PanelCommand::Unknown,
    }
}
