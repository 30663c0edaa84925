//! # Heuristic Entity Model — Gazetteers and Context Rules
//!
//! A small, self-contained stand-in for a statistical NER model, so the
//! service masks names, places, organizations and dates even when no external
//! model is deployed. It works on the word tokens of [`crate::tokenizer`] plus
//! a few expressions over the raw text.
//!
//! | Rule                | Native label | Confidence | Example                     |
//! |---------------------|--------------|------------|-----------------------------|
//! | date expression     | `DATE`       | 0.85       | `03/14/2024`, `March 3, 2024` |
//! | time expression     | `TIME`       | 0.70       | `10:30 AM`                  |
//! | person gazetteer    | `PER`        | 0.85       | `John Doe`                  |
//! | title rule          | `PER`        | 0.80       | `Patient Jane Roe`, `Dr. Lee` |
//! | org gazetteer       | `ORG`        | 0.85       | `Mayo Clinic`               |
//! | org suffix rule     | `ORG`        | 0.75       | `Springfield General Hospital` |
//! | location gazetteer  | `LOC`        | 0.80       | `Boston`, `New York`        |
//! | street address      | `LOC`        | 0.75       | `42 Elm Street`             |
//!
//! Token rules claim their tokens in the order above, so a token belongs to
//! at most one token-level entity. Scores stay below the structured
//! identifiers on purpose: anything a pattern recognizer claims wins.

use regex::Regex;

use crate::error::{ConfigError, RecognizerError};
use crate::model::{EntityModel, NativeEntity};
use crate::tokenizer::{tokenize, Token};

const PERSON_GAZETTEER_CONFIDENCE: f64 = 0.85;
const TITLE_CONFIDENCE: f64 = 0.80;
const ORG_GAZETTEER_CONFIDENCE: f64 = 0.85;
const ORG_SUFFIX_CONFIDENCE: f64 = 0.75;
const LOCATION_CONFIDENCE: f64 = 0.80;
const ADDRESS_CONFIDENCE: f64 = 0.75;
const DATE_CONFIDENCE: f64 = 0.85;
const TIME_CONFIDENCE: f64 = 0.70;

/// Longest capitalized run a context rule will take as one name
const MAX_NAME_TOKENS: usize = 3;

const FIRST_NAMES: &[&str] = &[
    "james", "john", "robert", "michael", "william", "david", "richard", "joseph", "thomas",
    "charles", "mary", "patricia", "jennifer", "linda", "elizabeth", "barbara", "susan",
    "jessica", "sarah", "karen", "maria", "jane", "emily", "daniel", "matthew", "anthony",
];

const TITLES: &[&str] = &[
    "patient", "pt", "mr", "mrs", "ms", "miss", "mx", "dr", "doctor", "nurse", "rn", "np",
    "pa", "prof", "mother", "father", "wife", "husband", "son", "daughter", "guardian",
];

const LOCATIONS: &[&str] = &[
    "new york", "los angeles", "san francisco", "san diego", "new jersey", "new mexico",
    "north carolina", "south carolina", "chicago", "houston", "phoenix", "philadelphia",
    "boston", "seattle", "denver", "atlanta", "miami", "dallas", "austin", "detroit",
    "springfield", "anytown", "california", "texas", "florida", "ohio", "georgia",
    "michigan", "arizona", "massachusetts", "illinois", "pennsylvania", "oregon",
];

const ORGANIZATIONS: &[&str] = &[
    "mayo clinic", "cleveland clinic", "kaiser permanente", "johns hopkins",
    "blue cross blue shield", "unitedhealthcare", "aetna", "cigna", "humana",
    "medicare", "medicaid",
];

const ORG_SUFFIXES: &[&str] = &[
    "hospital", "clinic", "pharmacy", "center", "centre", "health", "healthcare",
    "laboratories", "labs", "inc", "llc", "corp", "group", "associates",
];

/// Gazetteer and context-rule entity model.
#[derive(Debug, Clone)]
pub struct HeuristicModel {
    person_names: Vec<String>,
    location_names: Vec<Vec<String>>,
    org_names: Vec<Vec<String>>,
    titles: Vec<String>,
    org_suffixes: Vec<String>,
    dates: Vec<Regex>,
    times: Regex,
    address: Regex,
}

impl HeuristicModel {
    /// Model with the built-in US gazetteers.
    pub fn new() -> Result<Self, ConfigError> {
        let compile = |name: &str, re: &str| {
            Regex::new(re).map_err(|source| ConfigError::Regex {
                recognizer: "heuristic".into(),
                pattern: name.into(),
                source,
            })
        };
        let mut model = Self {
            person_names: vec![],
            location_names: vec![],
            org_names: vec![],
            titles: TITLES.iter().map(|s| s.to_string()).collect(),
            org_suffixes: ORG_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            dates: vec![
                compile("date_numeric", r"\b[0-9]{1,2}/[0-9]{1,2}/(?:[0-9]{4}|[0-9]{2})\b")?,
                compile("date_iso", r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}\b")?,
                compile(
                    "date_month_name",
                    r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.? [0-9]{1,2}(?:st|nd|rd|th)?,? [0-9]{4}\b",
                )?,
            ],
            times: compile("time", r"\b[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})? ?(?:AM|PM|am|pm)\b")?,
            address: compile(
                "street_address",
                r"\b[0-9]{1,6} (?:[A-Z][a-z]+ ){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Court|Ct|Way|Place|Pl)\b",
            )?,
        };
        for name in FIRST_NAMES {
            model.add_person(name);
        }
        for name in LOCATIONS {
            model.add_location(name);
        }
        for name in ORGANIZATIONS {
            model.add_org(name);
        }
        Ok(model)
    }

    /// Adds a single-token first or last name.
    pub fn add_person(&mut self, name: &str) {
        self.person_names.push(name.to_lowercase());
    }

    /// Adds a place, possibly several words long.
    pub fn add_location(&mut self, name: &str) {
        if let Some(parts) = ngram(name) {
            self.location_names.push(parts);
        }
    }

    pub fn add_org(&mut self, name: &str) {
        if let Some(parts) = ngram(name) {
            self.org_names.push(parts);
        }
    }

    /// Runs every rule over `text`.
    pub fn apply(&self, text: &str) -> Vec<NativeEntity> {
        let mut out = Vec::new();

        for re in &self.dates {
            for m in re.find_iter(text) {
                out.push(NativeEntity::new("DATE", m.start(), m.end(), DATE_CONFIDENCE));
            }
        }
        for m in self.times.find_iter(text) {
            out.push(NativeEntity::new("TIME", m.start(), m.end(), TIME_CONFIDENCE));
        }

        let tokens = tokenize(text);
        let mut claimed = vec![false; tokens.len()];

        // 1. Person gazetteer: a known name plus the capitalized words after it
        for i in 0..tokens.len() {
            if claimed[i] || !self.person_names.contains(&tokens[i].lower()) {
                continue;
            }
            let end = name_run_end(&tokens, &claimed, i);
            out.push(span("PER", &tokens, &mut claimed, i, end, PERSON_GAZETTEER_CONFIDENCE));
        }

        // 2. Title rule: "Patient Jane Roe", "Dr. Lee"
        for i in 0..tokens.len() {
            if claimed[i] || !self.titles.contains(&tokens[i].lower()) {
                continue;
            }
            let mut first = i + 1;
            if tokens.get(first).is_some_and(|t| t.text == ".") {
                first += 1;
            }
            if first >= tokens.len() || claimed[first] || !is_name_word(&tokens[first]) {
                continue;
            }
            let end = name_run_end(&tokens, &claimed, first);
            out.push(span("PER", &tokens, &mut claimed, first, end, TITLE_CONFIDENCE));
        }

        // 3. Organization gazetteer (n-grams)
        for i in 0..tokens.len() {
            if let Some(len) = match_ngram(&self.org_names, &tokens, &claimed, i) {
                out.push(span("ORG", &tokens, &mut claimed, i, i + len, ORG_GAZETTEER_CONFIDENCE));
            }
        }

        // 4. Organization suffix: capitalized words ending in "Hospital", "Clinic", ...
        for i in 1..tokens.len() {
            if claimed[i]
                || !tokens[i].is_capitalized()
                || !self.org_suffixes.contains(&tokens[i].lower())
            {
                continue;
            }
            let mut first = i;
            while first > 0
                && i - first < MAX_NAME_TOKENS
                && !claimed[first - 1]
                && tokens[first - 1].is_capitalized()
                && tokens[first - 1].is_word()
            {
                first -= 1;
            }
            if first < i {
                out.push(span("ORG", &tokens, &mut claimed, first, i + 1, ORG_SUFFIX_CONFIDENCE));
            }
        }

        // 5. Location gazetteer (n-grams), case-sensitive on the first letter
        for i in 0..tokens.len() {
            if !tokens[i].is_capitalized() {
                continue;
            }
            if let Some(len) = match_ngram(&self.location_names, &tokens, &claimed, i) {
                out.push(span("LOC", &tokens, &mut claimed, i, i + len, LOCATION_CONFIDENCE));
            }
        }

        // 6. Street addresses
        for m in self.address.find_iter(text) {
            out.push(NativeEntity::new("LOC", m.start(), m.end(), ADDRESS_CONFIDENCE));
        }

        out
    }
}

impl EntityModel for HeuristicModel {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn detect(&self, text: &str) -> Result<Vec<NativeEntity>, RecognizerError> {
        if text.is_empty() {
            return Err(RecognizerError::EmptyInput);
        }
        Ok(self.apply(text))
    }
}

fn ngram(name: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = name.split_whitespace().map(|p| p.to_lowercase()).collect();
    (!parts.is_empty()).then_some(parts)
}

fn match_ngram(
    names: &[Vec<String>],
    tokens: &[Token],
    claimed: &[bool],
    i: usize,
) -> Option<usize> {
    names
        .iter()
        .filter(|parts| i + parts.len() <= tokens.len())
        .filter(|parts| {
            parts
                .iter()
                .enumerate()
                .all(|(j, part)| !claimed[i + j] && tokens[i + j].lower() == *part)
        })
        .map(|parts| parts.len())
        .max()
}

/// A name word is capitalized but not an all-caps acronym like `MRN`.
fn is_name_word(token: &Token) -> bool {
    token.is_capitalized()
        && token.is_word()
        && token.text.chars().skip(1).any(char::is_lowercase)
}

/// Index one past the capitalized run starting at `first` (inclusive).
fn name_run_end(tokens: &[Token], claimed: &[bool], first: usize) -> usize {
    let mut end = first + 1;
    while end < tokens.len()
        && end - first < MAX_NAME_TOKENS
        && !claimed[end]
        && is_name_word(&tokens[end])
    {
        end += 1;
    }
    end
}

fn span(
    label: &str,
    tokens: &[Token],
    claimed: &mut [bool],
    first: usize,
    end: usize,
    confidence: f64,
) -> NativeEntity {
    for c in &mut claimed[first..end] {
        *c = true;
    }
    NativeEntity::new(label, tokens[first].start, tokens[end - 1].end, confidence)
}
