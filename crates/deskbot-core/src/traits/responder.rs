// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI responder trait implemented by every provider variant.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AiResponse, Prompt};

/// A backend able to answer a prompt: an LLM API or a deterministic fallback.
///
/// Implementations share one signature so callers stay provider-agnostic.
#[async_trait]
pub trait AiResponder: PluginAdapter {
    /// Whether the responder has usable credentials.
    ///
    /// A disabled responder is skipped by the fallback chain without being
    /// called. This is a normal condition, not an error.
    fn is_enabled(&self) -> bool;

    /// Answers the prompt.
    ///
    /// Must return [`AiError::Cancelled`] promptly once `cancel` fires.
    async fn respond(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<AiResponse, AiError>;
}
