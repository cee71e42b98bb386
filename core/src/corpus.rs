use crate::DocId;
use serde::{Deserialize, Serialize};

/// Ordered collection of raw documents. A document's id is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<String>,
}

impl Corpus {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocId) -> Option<&str> {
        self.documents.get(id as usize).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &str)> {
        self.documents.iter().enumerate().map(|(i, d)| (i as DocId, d.as_str()))
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<String> {
        self.documents
    }
}

impl<S: Into<String>> FromIterator<S> for Corpus {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
