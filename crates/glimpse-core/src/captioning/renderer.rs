//! Token ids to caption text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decoding::TokenId;

use super::vocabulary::Vocabulary;

/// A rendered caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    /// Words joined by single spaces
    pub text: String,

    /// Words in order
    pub words: Vec<String>,
}

/// Maps decoder output back to words.
///
/// Start and end tokens are dropped wherever they appear. Ids outside the
/// vocabulary render as the unknown token.
#[derive(Debug, Clone)]
pub struct CaptionRenderer {
    vocabulary: Arc<Vocabulary>,
}

impl CaptionRenderer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn render(&self, tokens: &[TokenId]) -> Caption {
        let special = self.vocabulary.special();
        let unknown = self
            .vocabulary
            .id_to_token(special.unknown)
            .unwrap_or_default();

        let words: Vec<String> = tokens
            .iter()
            .filter(|&&id| id != special.start && id != special.end)
            .map(|&id| self.vocabulary.id_to_token(id).unwrap_or(unknown).to_string())
            .collect();

        Caption {
            text: words.join(" "),
            words,
        }
    }
}
