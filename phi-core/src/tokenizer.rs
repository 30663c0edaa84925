//! # Word Tokenizer
//!
//! Splits text into word and punctuation tokens for the heuristic model. Each
//! token keeps its byte position in the original text, so anything the model
//! finds maps straight back to a span without re-searching.
//!
//! Segmentation follows Unicode word boundaries (UAX #29) via
//! `unicode-segmentation`, with two adjustments for clinical notes:
//!
//! - whitespace runs are dropped;
//! - a trailing `'s` / `’s` is split off its word (`"Doe's"` → `"Doe"`, `"'s"`),
//!   so possessives do not drag into a PERSON span.
//!
//! ```rust
//! use phi_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Dr. Doe's note");
//! let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(words, vec!["Dr", ".", "Doe", "'s", "note"]);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A token extracted from the original text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub text: String,
    /// Byte offset in the original text (inclusive)
    pub start: usize,
    /// Byte offset in the original text (exclusive)
    pub end: usize,
    /// Position in the token list
    pub index: usize,
}

impl Token {
    /// First char is uppercase (`"Doe"`, `"MRN"`)
    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn is_word(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

const POSSESSIVES: &[&str] = &["'s", "\u{2019}s"];

/// Tokenizes `text` on Unicode word boundaries.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (start, piece) in text.split_word_bound_indices() {
        if piece.chars().all(char::is_whitespace) {
            continue;
        }
        match split_possessive(piece) {
            Some(stem) if !stem.is_empty() => {
                push_token(&mut tokens, stem, start);
                push_token(&mut tokens, &piece[stem.len()..], start + stem.len());
            }
            _ => push_token(&mut tokens, piece, start),
        }
    }
    tokens
}

fn split_possessive(piece: &str) -> Option<&str> {
    POSSESSIVES
        .iter()
        .find_map(|suffix| piece.strip_suffix(suffix))
}

fn push_token(tokens: &mut Vec<Token>, text: &str, start: usize) {
    let index = tokens.len();
    tokens.push(Token {
        text: text.to_string(),
        start,
        end: start + text.len(),
        index,
    });
}
