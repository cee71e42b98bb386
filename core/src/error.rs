use std::path::PathBuf;

/// Reasons a boolean expression is rejected before evaluation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty expression")]
    Empty,
    #[error("empty group at offset {0}")]
    EmptyGroup(usize),
    #[error("unbalanced parenthesis at offset {0}")]
    UnbalancedParen(usize),
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("'~' at offset {0} is not followed by a term or group")]
    DanglingNot(usize),
    #[error("expected operand, operator, operand, ... but found {0} tokens")]
    EvenTokenCount(usize),
    #[error("expected an operand at token {0}")]
    ExpectedOperand(usize),
    #[error("expected '&' or '|' at token {0}")]
    ExpectedOperator(usize),
    #[error("parentheses nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
    /// Snapshot missing or unreadable; rebuild from the corpus.
    #[error("index unavailable at {path}: {reason}")]
    IndexUnavailable { path: PathBuf, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::IndexUnavailable { path: path.into(), reason: reason.to_string() }
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Error::InvalidQuery(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::IndexUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
