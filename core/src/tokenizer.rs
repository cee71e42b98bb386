//! Word segmentation, stopwords and stemming.
//!
//! Each piece sits behind a small trait so the normalizer can be assembled
//! from whatever linguistic resources the caller has.

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer as Snowball};
use std::collections::HashSet;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
}

/// English stopwords, lowercase. Matching is case-sensitive, so capitalized
/// forms pass through.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

pub fn english_stopwords() -> HashSet<String> {
    ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect()
}

/// Splits text into word tokens without altering them.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Unicode word tokenizer: a letter followed by letters, digits, `_` or `'`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
    }
}

/// Splits on single spaces, the way raw documents are compared at build time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpaceTokenizer;

impl Tokenizer for SpaceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(' ').collect()
    }
}

pub trait Stemmer: Send + Sync {
    fn stem(&self, word: &str) -> String;
}

/// English Snowball stemmer.
pub struct SnowballStemmer {
    inner: Snowball,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        Self { inner: Snowball::create(Algorithm::English) }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, word: &str) -> String {
        self.inner.stem(word).into_owned()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, word: &str) -> String {
        word.to_string()
    }
}
