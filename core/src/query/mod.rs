//! Query evaluation over an [`InvertedIndex`](crate::InvertedIndex).
//!
//! Two entry points live here: the conjunctive free-text query and the boolean
//! expression query. Boolean expressions are evaluated strictly left to right
//! with no operator precedence, so `a | b & c` means `(a | b) & c`.

mod conjunctive;
mod eval;
mod lexer;

pub use conjunctive::conjunctive_query;
pub use eval::{BooleanEvaluator, OperandResolver};
pub use lexer::GroupingLexer;

use crate::error::QueryError;

/// Deepest parenthesis nesting a boolean expression may use.
pub const MAX_GROUP_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    Term(String),
    /// Inner text of a parenthesized group, without the outer parentheses.
    Group(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub negated: bool,
    pub kind: OperandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprToken {
    Operand(Operand),
    Operator(BinaryOp),
}

/// Splits a boolean expression into a flat token stream.
pub trait ExpressionLexer: Send + Sync {
    fn lex(&self, expression: &str) -> Result<Vec<ExprToken>, QueryError>;
}
