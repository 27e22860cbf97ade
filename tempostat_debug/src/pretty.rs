// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use tempostat_core::controller::ApplyOutcome;
use tempostat_core::event::IntentSource;
use tempostat_core::trace::{
    ApplyEvent, BindingEvent, BindingKind, CollaboratorFailure, FailureEvent, IntentEvent,
    ModeEvent, PersistEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn source_name(source: IntentSource) -> &'static str {
    match source {
        IntentSource::Chord => "chord",
        IntentSource::HotKey => "hotkey",
        IntentSource::Slider => "slider",
        IntentSource::NativeMenu => "menu",
        IntentSource::Panel => "panel",
    }
}

fn binding_name(kind: BindingKind) -> &'static str {
    match kind {
        BindingKind::Media => "media",
        BindingKind::SourceReassert => "source-reassert",
        BindingKind::MenuSlider => "menu-slider",
    }
}

fn failure_name(failure: CollaboratorFailure) -> &'static str {
    match failure {
        CollaboratorFailure::MessageDelivery => "message-delivery",
        CollaboratorFailure::PersistWrite => "persist-write",
        CollaboratorFailure::MissingRuntime => "missing-runtime",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_intent(&mut self, e: &IntentEvent) {
        let _ = writeln!(
            self.writer,
            "[intent] source={} candidate={}",
            source_name(e.source),
            e.candidate,
        );
    }

    fn on_apply(&mut self, e: &ApplyEvent) {
        let outcome = match e.outcome {
            ApplyOutcome::Applied(rate) => format!("applied {rate}"),
            ApplyOutcome::Unchanged(rate) => format!("unchanged {rate}"),
            ApplyOutcome::Rejected => "REJECTED".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[apply] source={} {outcome}",
            source_name(e.source),
        );
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        let mode = if e.enabled { "enabled" } else { "disabled" };
        let _ = writeln!(self.writer, "[mode] {mode} saved={}", e.saved);
    }

    fn on_binding(&mut self, e: &BindingEvent) {
        let _ = writeln!(self.writer, "[bind] {}", binding_name(e.kind));
    }

    fn on_persist(&mut self, e: &PersistEvent) {
        let _ = writeln!(
            self.writer,
            "[persist] enabled={:?} playbackSpeed={:?} lastSpeed={:?}",
            e.delta.enabled,
            e.delta.last_applied.map(tempostat_core::rate::Rate::value),
            e.delta.saved.map(tempostat_core::rate::Rate::value),
        );
    }

    fn on_failure(&mut self, e: &FailureEvent) {
        let _ = writeln!(self.writer, "[failure] {}", failure_name(e.failure));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempostat_core::rate::Rate;

    #[test]
    fn pretty_print_apply() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_apply(&ApplyEvent {
            source: IntentSource::Slider,
            outcome: ApplyOutcome::Applied(Rate::from_candidate(1.5).unwrap()),
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[apply]"), "got: {output}");
        assert!(output.contains("source=slider"), "got: {output}");
        assert!(output.contains("1.50x"), "got: {output}");
    }

    #[test]
    fn pretty_print_failure() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_failure(&FailureEvent {
            failure: CollaboratorFailure::MessageDelivery,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("message-delivery"), "got: {output}");
    }
}
