//! Boolean document retrieval: a term-to-document inverted index with an
//! implicit-AND free-text query and a left-to-right boolean expression query.

pub mod bitmap;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod vocabulary;

pub type DocId = u32;

pub use config::{EngineConfig, MatchMode, MissingTermPolicy};
pub use corpus::Corpus;
pub use engine::SearchEngine;
pub use error::{Error, QueryError, Result};
pub use index::{IndexBuilder, InvertedIndex};
pub use normalizer::Normalizer;
pub use vocabulary::Vocabulary;
