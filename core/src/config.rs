use serde::{Deserialize, Serialize};

/// How a vocabulary term is matched against a document while building postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Compare against the raw text split on single spaces. Stemmed terms only
    /// match documents that contain them verbatim.
    #[default]
    RawWhitespace,
    /// Compare against the document's normalized token stream.
    Normalized,
}

/// What a conjunctive query does with a term that has no postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTermPolicy {
    /// Any unknown term empties the result.
    #[default]
    Empty,
    /// Unknown terms are skipped; the remaining lists are intersected.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub match_mode: MatchMode,
    pub stemming: bool,
    pub default_stopwords: bool,
    pub extra_stopwords: Vec<String>,
    pub missing_terms: MissingTermPolicy,
    /// Run boolean operands through the normalizer before lookup instead of
    /// using them verbatim.
    pub normalize_boolean_operands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            stemming: true,
            default_stopwords: true,
            extra_stopwords: Vec::new(),
            missing_terms: MissingTermPolicy::default(),
            normalize_boolean_operands: false,
        }
    }
}
