use crate::corpus::Corpus;
use crate::normalizer::Normalizer;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Every term produced by normalizing the corpus, deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: BTreeSet<String>,
}

impl Vocabulary {
    pub fn build(corpus: &Corpus, normalizer: &Normalizer) -> Self {
        let terms = corpus
            .documents()
            .par_iter()
            .map(|doc| normalizer.normalize(doc).into_iter().collect::<BTreeSet<String>>())
            .reduce(BTreeSet::new, |mut acc, mut part| {
                if acc.len() < part.len() {
                    std::mem::swap(&mut acc, &mut part);
                }
                acc.extend(part);
                acc
            });
        tracing::info!(num_docs = corpus.len(), num_terms = terms.len(), "built vocabulary");
        Self { terms }
    }

    pub fn from_terms<I: IntoIterator<Item = String>>(terms: I) -> Self {
        Self { terms: terms.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn into_sorted_vec(self) -> Vec<String> {
        self.terms.into_iter().collect()
    }
}
