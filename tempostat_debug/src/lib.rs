// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing for tempostat diagnostics.
//!
//! This crate provides a [`TraceSink`](tempostat_core::trace::TraceSink)
//! implementation for development and harness runs:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.

pub mod pretty;
