use crate::config::MatchMode;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::normalizer::Normalizer;
use crate::tokenizer::{SpaceTokenizer, Tokenizer};
use crate::vocabulary::Vocabulary;
use crate::DocId;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

/// Mutable accumulator used while scanning the corpus.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: BTreeMap<String, Vec<DocId>>,
    num_docs: usize,
}

impl IndexBuilder {
    pub fn new(num_docs: usize) -> Self {
        Self { postings: BTreeMap::new(), num_docs }
    }

    /// Records `doc` under `term`. Repeated or out-of-order adds are tolerated;
    /// `finish` sorts and dedups.
    pub fn add(&mut self, term: &str, doc: DocId) {
        match self.postings.get_mut(term) {
            Some(list) => list.push(doc),
            None => {
                self.postings.insert(term.to_string(), vec![doc]);
            }
        }
    }

    pub fn extend(&mut self, term: String, docs: Vec<DocId>) {
        if docs.is_empty() {
            return;
        }
        self.postings.entry(term).or_default().extend(docs);
    }

    pub fn finish(mut self) -> InvertedIndex {
        for list in self.postings.values_mut() {
            list.sort_unstable();
            list.dedup();
        }
        InvertedIndex { postings: self.postings, num_docs: self.num_docs }
    }
}

/// Read-only mapping from term to the ascending ids of documents containing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<DocId>>,
    num_docs: usize,
}

impl InvertedIndex {
    /// Scans every document once per vocabulary term. Terms that match no
    /// document are left out of the index.
    pub fn build(corpus: &Corpus, vocabulary: &Vocabulary, normalizer: &Normalizer, mode: MatchMode) -> Self {
        let doc_terms: Vec<HashSet<String>> = corpus
            .documents()
            .par_iter()
            .map(|doc| match mode {
                MatchMode::RawWhitespace => SpaceTokenizer.tokenize(doc).into_iter().map(str::to_string).collect(),
                MatchMode::Normalized => normalizer.normalize(doc).into_iter().collect(),
            })
            .collect();

        let terms: Vec<&str> = vocabulary.iter().collect();
        let scanned: Vec<(String, Vec<DocId>)> = terms
            .par_iter()
            .map(|term| {
                let ids = doc_terms
                    .iter()
                    .enumerate()
                    .filter(|(_, tokens)| tokens.contains(*term))
                    .map(|(id, _)| id as DocId)
                    .collect();
                (term.to_string(), ids)
            })
            .collect();

        let mut builder = IndexBuilder::new(corpus.len());
        for (term, ids) in scanned {
            builder.extend(term, ids);
        }
        let index = builder.finish();
        tracing::info!(
            num_docs = index.num_docs,
            vocabulary = vocabulary.len(),
            num_terms = index.len(),
            ?mode,
            "built inverted index"
        );
        index
    }

    /// Rebuilds an index from stored postings, rejecting lists that are not
    /// strictly ascending or that point past `num_docs`.
    pub fn from_postings(postings: BTreeMap<String, Vec<DocId>>, num_docs: usize) -> Result<Self> {
        for (term, list) in &postings {
            if list.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::unavailable("inverted_index", format!("postings for {term:?} not strictly ascending")));
            }
            if list.last().is_some_and(|&last| last as usize >= num_docs) {
                return Err(Error::unavailable("inverted_index", format!("postings for {term:?} exceed {num_docs} documents")));
            }
        }
        Ok(Self { postings, num_docs })
    }

    pub fn postings(&self, term: &str) -> Option<&[DocId]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// Number of terms with at least one posting.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, Vec<DocId>> {
        &self.postings
    }
}
