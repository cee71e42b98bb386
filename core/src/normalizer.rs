use crate::config::EngineConfig;
use crate::tokenizer::{english_stopwords, IdentityStemmer, SnowballStemmer, Stemmer, Tokenizer, WordTokenizer};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Turns raw text into index terms: tokenize, drop stopwords, fold case, stem.
///
/// The stopword check runs on the token exactly as the tokenizer produced it,
/// before any case folding. A capitalized "The" therefore survives a
/// lowercase stopword list and is indexed as "the".
pub struct Normalizer {
    tokenizer: Box<dyn Tokenizer>,
    stopwords: HashSet<String>,
    stemmer: Box<dyn Stemmer>,
}

impl Normalizer {
    pub fn new(tokenizer: Box<dyn Tokenizer>, stopwords: HashSet<String>, stemmer: Box<dyn Stemmer>) -> Self {
        Self { tokenizer, stopwords, stemmer }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut stopwords = if config.default_stopwords { english_stopwords() } else { HashSet::new() };
        stopwords.extend(config.extra_stopwords.iter().cloned());
        let stemmer: Box<dyn Stemmer> = if config.stemming {
            Box::new(SnowballStemmer::english())
        } else {
            Box::new(IdentityStemmer)
        };
        Self::new(Box::new(WordTokenizer), stopwords, stemmer)
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|token| !self.stopwords.contains(*token))
            .map(|token| {
                let folded = token.nfkc().collect::<String>().to_lowercase();
                self.stemmer.stem(&folded)
            })
            .collect()
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer").field("stopwords", &self.stopwords.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_are_case_sensitive() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("The cat and the Dog"), vec!["the", "cat", "dog"]);
    }

    #[test]
    fn stems_after_folding() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("RUNNING runners"), vec!["run", "runner"]);
    }

    #[test]
    fn nfkc_folds_compatibility_forms() {
        let n = Normalizer::from_config(&EngineConfig { stemming: false, ..EngineConfig::default() });
        assert_eq!(n.normalize("ﬁsh"), vec!["fish"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(Normalizer::default().normalize("").is_empty());
        assert!(Normalizer::default().normalize("   ,,, ").is_empty());
    }

    #[test]
    fn extra_stopwords_extend_the_list() {
        let cfg = EngineConfig { extra_stopwords: vec!["cat".into()], stemming: false, ..EngineConfig::default() };
        assert_eq!(Normalizer::from_config(&cfg).normalize("cat sat"), vec!["sat"]);
    }
}
