// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Claude model pricing (USD per million tokens).
//!
//! Haiku 3.5:  input=$0.80, output=$4.00
//! Sonnet 4:   input=$3.00, output=$15.00
//! Opus 4:     input=$15.00, output=$75.00

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Look up pricing by model family substring. Unknown models are billed at
/// Sonnet rates so the audit log never under-reports.
pub fn get_pricing(model: &str) -> ModelPricing {
    let lower = model.to_lowercase();
    if lower.contains("opus") {
        ModelPricing {
            input_per_mtok: 15.0,
            output_per_mtok: 75.0,
        }
    } else if lower.contains("haiku") {
        ModelPricing {
            input_per_mtok: 0.80,
            output_per_mtok: 4.0,
        }
    } else {
        ModelPricing {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        }
    }
}

/// Cost in USD of one call.
pub fn calculate_cost(input_tokens: u32, output_tokens: u32, pricing: ModelPricing) -> f64 {
    (f64::from(input_tokens) / 1_000_000.0) * pricing.input_per_mtok
        + (f64::from(output_tokens) / 1_000_000.0) * pricing.output_per_mtok
}
