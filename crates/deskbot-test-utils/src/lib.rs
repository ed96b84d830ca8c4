// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Deskbot integration tests.
//!
//! Provides scripted adapters and a harness for fast, deterministic tests
//! without external services.
//!
//! # Components
//!
//! - [`ScriptedResponder`] - responder replaying queued replies and errors
//! - [`RecordingTicketStore`] - in-memory store with call counters and failure injection
//! - [`RecordingAuditSink`] - audit sink capturing every entry
//! - [`TestHarness`] - a complete engine wired to the above

pub mod harness;
pub mod recording_sink;
pub mod recording_store;
pub mod scripted_responder;

pub use harness::{TestHarness, TestHarnessBuilder, TENANT, USER};
pub use recording_sink::RecordingAuditSink;
pub use recording_store::RecordingTicketStore;
pub use scripted_responder::ScriptedResponder;
