// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser-console trace sink.

use alloc::format;

use tempostat_core::controller::ApplyOutcome;
use tempostat_core::trace::{
    ApplyEvent, BindingEvent, BindingKind, CollaboratorFailure, FailureEvent, ModeEvent, TraceSink,
};
use wasm_bindgen::JsValue;

/// A [`TraceSink`] writing one `console.log` line per event.
///
/// Intents and persistence requests are deliberately not logged — they fire
/// on every slider move and would flood the console; the apply outcome
/// carries the information that matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

impl TraceSink for ConsoleSink {
    fn on_apply(&mut self, e: &ApplyEvent) {
        if let ApplyOutcome::Applied(rate) = e.outcome {
            log(&format!("tempostat: rate set to {rate}"));
        }
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        let mode = if e.enabled { "enabled" } else { "disabled" };
        log(&format!("tempostat: {mode} (saved {})", e.saved));
    }

    fn on_binding(&mut self, e: &BindingEvent) {
        let what = match e.kind {
            BindingKind::Media => "media element bound",
            BindingKind::SourceReassert => "source changed, restoring rate",
            BindingKind::MenuSlider => "slider attached to menu",
        };
        log(&format!("tempostat: {what}"));
    }

    fn on_failure(&mut self, e: &FailureEvent) {
        let what = match e.failure {
            CollaboratorFailure::MessageDelivery => "message delivery failed",
            CollaboratorFailure::PersistWrite => "preference write failed",
            CollaboratorFailure::MissingRuntime => "extension runtime unavailable, running detached",
        };
        warn(&format!("tempostat: {what}"));
    }
}
