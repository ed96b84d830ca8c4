// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI model pricing (USD per million tokens).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Look up pricing by model name. Unknown models (including self-hosted
/// ones behind a compatible base URL) are billed at gpt-4o rates.
pub fn get_pricing(model: &str) -> ModelPricing {
    let lower = model.to_lowercase();
    let (input, output) = if lower.contains("gpt-4o-mini") {
        (0.15, 0.60)
    } else if lower.contains("gpt-4.1-mini") {
        (0.40, 1.60)
    } else if lower.contains("gpt-4.1") {
        (2.0, 8.0)
    } else {
        (2.50, 10.0)
    };
    ModelPricing {
        input_per_mtok: input,
        output_per_mtok: output,
    }
}

pub fn calculate_cost(input_tokens: u32, output_tokens: u32, pricing: ModelPricing) -> f64 {
    (f64::from(input_tokens) / 1_000_000.0) * pricing.input_per_mtok
        + (f64::from(output_tokens) / 1_000_000.0) * pricing.output_per_mtok
}
