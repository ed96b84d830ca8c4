// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use deskbot_core::Prompt;
use sha2::{Digest, Sha256};

/// SHA-256 of the rendered prompt, lowercase hex.
pub fn prompt_hash(prompt: &Prompt) -> String {
    hex::encode(Sha256::digest(prompt.render().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::PromptTurn;

    #[test]
    fn hash_is_stable_hex() {
        let prompt = Prompt {
            system: "s".into(),
            turns: vec![PromptTurn::user("oi")],
        };
        let hash = prompt_hash(&prompt);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, prompt_hash(&prompt.clone()));
    }

    #[test]
    fn history_changes_the_hash() {
        let a = Prompt {
            system: "s".into(),
            turns: vec![PromptTurn::user("oi")],
        };
        let mut b = a.clone();
        b.turns.insert(0, PromptTurn::assistant("olá"));
        assert_ne!(prompt_hash(&a), prompt_hash(&b));
    }
}
