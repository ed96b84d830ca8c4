// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword intent classification and responder fallback for Deskbot.
//!
//! Provides the zero-cost [`classifier`], the deterministic
//! [`HeuristicResponder`] that ends every default chain, and the
//! [`ResponderChain`] that tries responders in configured order.

pub mod chain;
pub mod classifier;
pub mod heuristic;
pub mod text;

pub use chain::{ChainError, ChainResponse, ResponderChain};
pub use classifier::{Intent, Topic};
pub use heuristic::HeuristicResponder;
