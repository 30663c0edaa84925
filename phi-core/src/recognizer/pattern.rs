//! # Pattern Recognizers
//!
//! A pattern recognizer is bound to one label and owns a list of compiled
//! [`Pattern`]s. Each pattern is a regular expression with a fixed score and
//! optional post-checks:
//!
//! - **capture group**: only part of the match is the entity
//!   (`Acct # 12345678` → just the digits);
//! - **validator**: checksum or reserved-range test on the matched text;
//! - **fence**: word-boundary test on the neighbouring chars, plus extra
//!   forbidden neighbours (the `regex` crate has no look-around);
//! - **trim**: trailing punctuation stripped from the span (URLs at the end of
//!   a sentence).
//!
//! Recognizers are pure: same text, same candidates. Surrounding context never
//! lowers a score; overlaps are settled by the resolver.

use std::ops::Range;

use regex::{Captures, Regex};

use crate::candidate::Candidate;
use crate::error::{ConfigError, RecognizerError};
use crate::label::EntityLabel;
use crate::recognizer::validate::Validator;
use crate::recognizer::Recognizer;

/// One compiled expression of a pattern recognizer.
#[derive(Clone)]
pub struct Pattern {
    pub name: String,
    regex: Regex,
    pub score: f64,
    group: Option<usize>,
    validator: Option<Validator>,
    forbid_before: &'static [char],
    forbid_after: &'static [char],
    trim_end: &'static [char],
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .field("score", &self.score)
            .field("group", &self.group)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl Pattern {
    /// Compiles `regex`. The name is used in error messages and events.
    pub fn new(
        recognizer: &str,
        name: impl Into<String>,
        regex: &str,
        score: f64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let compiled = Regex::new(regex).map_err(|source| ConfigError::Regex {
            recognizer: recognizer.to_string(),
            pattern: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            regex: compiled,
            score,
            group: None,
            validator: None,
            forbid_before: &[],
            forbid_after: &[],
            trim_end: &[],
        })
    }

    /// Uses capture group `index` as the entity span.
    pub fn group(mut self, index: usize) -> Self {
        self.group = Some(index);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Rejects the match when the char right before it is one of `chars`
    /// (in addition to the word-boundary fence).
    pub fn forbid_before(mut self, chars: &'static [char]) -> Self {
        self.forbid_before = chars;
        self
    }

    pub fn forbid_after(mut self, chars: &'static [char]) -> Self {
        self.forbid_after = chars;
        self
    }

    pub fn trim_end(mut self, chars: &'static [char]) -> Self {
        self.trim_end = chars;
        self
    }

    /// Byte ranges of every accepted match in `text`.
    ///
    /// A match rejected by the fence or the validator does not consume its
    /// text: the search resumes one char after its start, so a valid
    /// identifier overlapping the rejected match is still found.
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut at = 0;
        while at <= text.len() {
            let Some(caps) = self.regex.captures_at(text, at) else {
                break;
            };
            let Some(whole) = caps.get(0) else { break };
            match self.accept(text, &caps) {
                Some(range) if whole.end() > whole.start() => {
                    spans.push(range);
                    at = whole.end();
                }
                accepted => {
                    spans.extend(accepted);
                    at = next_char(text, whole.start());
                }
            }
        }
        spans
    }

    fn accept(&self, text: &str, caps: &Captures<'_>) -> Option<Range<usize>> {
        let m = match self.group {
            Some(i) => caps.get(i),
            None => caps.get(0),
        }?;
        let start = m.start();
        let end = start + m.as_str().trim_end_matches(self.trim_end).len();
        if end <= start || !self.fenced(text, start, end) {
            return None;
        }
        match self.validator {
            Some(validate) if !validate(&text[start..end]) => None,
            _ => Some(start..end),
        }
    }

    fn fenced(&self, text: &str, start: usize, end: usize) -> bool {
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map(|c| !is_word(c) && !self.forbid_before.contains(&c))
            .unwrap_or(true);
        let after_ok = text[end..]
            .chars()
            .next()
            .map(|c| !is_word(c) && !self.forbid_after.contains(&c))
            .unwrap_or(true);
        before_ok && after_ok
    }
}

fn next_char(text: &str, at: usize) -> usize {
    at + text[at..].chars().next().map_or(1, char::len_utf8)
}

/// Recognizer emitting one label from a list of patterns.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    name: String,
    label: EntityLabel,
    priority: u8,
    patterns: Vec<Pattern>,
}

impl PatternRecognizer {
    pub fn new(
        name: impl Into<String>,
        label: EntityLabel,
        priority: u8,
        patterns: Vec<Pattern>,
    ) -> Self {
        Self {
            name: name.into(),
            label,
            priority,
            patterns,
        }
    }

    pub fn label(&self) -> EntityLabel {
        self.label
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Replaces the score of every pattern (configuration override).
    pub fn with_score(mut self, score: f64) -> Self {
        for p in &mut self.patterns {
            p.score = score;
        }
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// All candidates for `text`. Two patterns matching the very same span are
    /// collapsed into the higher-scoring one.
    pub fn scan(&self, text: &str) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for pattern in &self.patterns {
            for range in pattern.find_spans(text) {
                if let Some(existing) = out
                    .iter_mut()
                    .find(|c| c.start == range.start && c.end == range.end)
                {
                    if pattern.score > existing.confidence {
                        existing.confidence = pattern.score;
                    }
                    continue;
                }
                out.push(Candidate::new(
                    self.label,
                    range,
                    pattern.score,
                    self.priority,
                    self.name.as_str(),
                ));
            }
        }
        out
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Vec<EntityLabel> {
        vec![self.label]
    }

    fn detect(&self, text: &str) -> Result<Vec<Candidate>, RecognizerError> {
        Ok(self.scan(text))
    }
}
