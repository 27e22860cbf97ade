// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core state machines and multi-surface reconciliation for playback-rate
//! synchronization.
//!
//! `tempostat_core` holds everything about keeping a user-chosen playback
//! rate consistent across a hostile, frequently-mutating host page — except
//! the DOM itself. It is `no_std` compatible (with `alloc`) and contains no
//! browser types: backends translate platform callbacks into the event
//! vocabulary defined here and apply the effects the engine returns.
//!
//! # Architecture
//!
//! The crate is organized around an event loop that turns independent
//! browser callbacks into an ordered effect stream:
//!
//! ```text
//!   Backend (keyboard / observers / timers / panel messages)
//!       │
//!       ▼
//!   EngineEvent ──► Engine::handle() ──► [Effect]
//!                        │                   │
//!          ┌─────────────┤                   ▼
//!          ▼             ▼             Backend applies:
//!   ChordMachine    RateController     media write, repaint,
//!   ModeGate        AcquisitionWatcher persistence, timers, label
//! ```
//!
//! **[`rate`]** — The [`Rate`](rate::Rate) domain type: clamped to
//! \[0.25, 16.0\] and rounded to two decimals before it is treated as
//! authoritative.
//!
//! **[`controller`]** — The authoritative in-memory rate and the single
//! apply entry point, with the privileged bypass used by the mode gate.
//!
//! **[`chord`]** — Two-state keyboard chord machine (chord key, then digit)
//! with an explicit cancelable window timer.
//!
//! **[`mode`]** — Enable/disable gate that forces neutral while disabled and
//! restores the saved rate on re-enable.
//!
//! **[`watcher`]** — Decision logic for media-element acquisition, source
//! changes, and native-menu appearance. Backends own the DOM observers; this
//! module owns the idempotent bind/re-assert policy.
//!
//! **[`surface`]** — The [`Reconciler`](surface::Reconciler) contract that
//! observable surfaces (injected slider, native menu, transient label)
//! implement in backend crates.
//!
//! **[`engine`]** — The single owned context object wiring the components
//! together: consumes [`EngineEvent`](event::EngineEvent)s, returns
//! [`Effect`](event::Effect)s.
//!
//! **[`store`]** — The persisted preference record and incremental deltas
//! handed to the persistence collaborator.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! engine instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod chord;
pub mod controller;
pub mod engine;
pub mod event;
pub mod mode;
pub mod rate;
pub mod store;
pub mod surface;
pub mod time;
pub mod trace;
pub mod watcher;
