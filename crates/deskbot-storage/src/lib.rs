// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`TicketStore`] for the Deskbot triage engine.
//!
//! Backs the interactive shell and the test harness. Data lives for the
//! lifetime of the process.

pub mod memory;

pub use memory::MemoryTicketStore;
