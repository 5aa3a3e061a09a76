//! Caption vocabulary: a fixed bidirectional mapping between words and ids.
//!
//! Two on-disk forms are accepted:
//! - `.json`: a word map `{"<start>": 0, "dog": 7, ...}` with dense ids
//! - anything else: one token per line, id = line position (blank lines and
//!   `#` comments skipped)

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::config::SpecialTokenNames;
use crate::decoding::{SpecialTokens, TokenId};
use crate::error::PipelineError;

/// A loaded vocabulary. Read-only once built.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    by_token: HashMap<String, TokenId>,
    special: SpecialTokens,
}

impl Vocabulary {
    /// Build from an ordered token list; a token's id is its position.
    pub fn from_tokens<I, S>(tokens: I, names: &SpecialTokenNames) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.len() > TokenId::MAX as usize {
            return Err(PipelineError::Vocabulary {
                message: format!("{} tokens exceed the id range", tokens.len()),
            });
        }

        let mut by_token = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if by_token.insert(token.clone(), id as TokenId).is_some() {
                return Err(PipelineError::Vocabulary {
                    message: format!("duplicate token {token:?}"),
                });
            }
        }

        let special = names
            .resolve(&tokens)
            .map_err(|message| PipelineError::Vocabulary { message })?;

        Ok(Self {
            tokens,
            by_token,
            special,
        })
    }

    /// Load a vocabulary file. See the module docs for the accepted formats.
    pub fn load(path: &Path, names: &SpecialTokenNames) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Vocabulary {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let tokens = if is_json {
            parse_word_map(&content).map_err(|message| PipelineError::Vocabulary {
                message: format!("{:?}: {}", path, message),
            })?
        } else {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()
        };

        let vocab = Self::from_tokens(tokens, names)?;
        tracing::info!(
            "Loaded vocabulary: {} tokens from {:?} (start={}, end={}, unk={})",
            vocab.len(),
            path,
            vocab.special.start,
            vocab.special.end,
            vocab.special.unknown,
        );
        Ok(vocab)
    }

    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.by_token.get(token).copied()
    }

    /// Id of `token`, or the unknown token's id.
    pub fn id_or_unknown(&self, token: &str) -> TokenId {
        self.token_to_id(token).unwrap_or(self.special.unknown)
    }

    pub fn special(&self) -> SpecialTokens {
        self.special
    }

    /// Number of tokens in the vocabulary.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// BLAKE3 hash of the token list, used to tie output records to the
    /// vocabulary that produced them.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for token in &self.tokens {
            hasher.update(token.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Turn a `{"word": id}` map into an id-ordered token list.
fn parse_word_map(content: &str) -> Result<Vec<String>, String> {
    let map: HashMap<String, u64> =
        serde_json::from_str(content).map_err(|e| format!("invalid word map: {e}"))?;

    let word_count = map.len();
    let by_id: BTreeMap<u64, String> = map.into_iter().map(|(word, id)| (id, word)).collect();
    if by_id.len() != word_count {
        return Err("several words share an id".to_string());
    }
    let mut tokens = Vec::with_capacity(by_id.len());
    for (expected, (id, word)) in by_id.into_iter().enumerate() {
        if id != expected as u64 {
            return Err(format!("ids must be dense from 0, missing id {expected}"));
        }
        tokens.push(word);
    }
    Ok(tokens)
}
