use super::{BinaryOp, ExprToken, ExpressionLexer, Operand, OperandKind, MAX_GROUP_DEPTH};
use crate::bitmap::Bitmap;
use crate::error::QueryError;
use crate::index::InvertedIndex;
use crate::normalizer::Normalizer;
use crate::DocId;

/// How a bare operand is turned into index keys.
#[derive(Debug, Clone, Copy)]
pub enum OperandResolver<'a> {
    /// Look the operand up exactly as written.
    Verbatim,
    /// Normalize the operand first; every resulting term must match.
    Normalized(&'a Normalizer),
}

/// Evaluates boolean expressions against an index.
///
/// The token stream must alternate operand, operator, operand, ... and is
/// folded left to right: each operator combines the running result with the
/// operand that follows it. `~` negates only the operand it prefixes and is
/// ignored on the first operand of an expression. Groups recurse at most
/// [`MAX_GROUP_DEPTH`] levels, whatever lexer produced them.
pub struct BooleanEvaluator<'a> {
    index: &'a InvertedIndex,
    lexer: &'a dyn ExpressionLexer,
    resolver: OperandResolver<'a>,
}

impl<'a> BooleanEvaluator<'a> {
    pub fn new(index: &'a InvertedIndex, lexer: &'a dyn ExpressionLexer, resolver: OperandResolver<'a>) -> Self {
        Self { index, lexer, resolver }
    }

    /// Matching document ids in ascending order.
    pub fn evaluate(&self, expression: &str) -> Result<Vec<DocId>, QueryError> {
        Ok(self.evaluate_bitmap(expression)?.to_doc_ids())
    }

    pub fn evaluate_bitmap(&self, expression: &str) -> Result<Bitmap, QueryError> {
        self.evaluate_at(expression, 0)
    }

    fn evaluate_at(&self, expression: &str, depth: usize) -> Result<Bitmap, QueryError> {
        if depth > MAX_GROUP_DEPTH {
            return Err(QueryError::TooDeep(MAX_GROUP_DEPTH));
        }
        let tokens = self.lexer.lex(expression)?;
        check_shape(&tokens)?;

        let mut rest = tokens.iter();
        let mut acc = match rest.next() {
            Some(ExprToken::Operand(first)) => {
                if first.negated {
                    tracing::warn!(expression, "ignoring '~' on leading operand");
                }
                self.encode(first, depth)?
            }
            _ => return Err(QueryError::ExpectedOperand(0)),
        };

        while let (Some(op), Some(operand)) = (rest.next(), rest.next()) {
            let (ExprToken::Operator(op), ExprToken::Operand(operand)) = (op, operand) else {
                unreachable!("token shape checked above");
            };
            let mut next = self.encode(operand, depth)?;
            if operand.negated {
                next.negate();
            }
            acc.combine(*op, &next);
        }
        Ok(acc)
    }

    fn encode(&self, operand: &Operand, depth: usize) -> Result<Bitmap, QueryError> {
        match &operand.kind {
            OperandKind::Group(inner) => self.evaluate_at(inner, depth + 1),
            OperandKind::Term(term) => Ok(self.encode_term(term)),
        }
    }

    fn encode_term(&self, term: &str) -> Bitmap {
        let num_docs = self.index.num_docs();
        match self.resolver {
            OperandResolver::Verbatim => self.term_bitmap(term),
            OperandResolver::Normalized(normalizer) => {
                let terms = normalizer.normalize(term);
                let mut iter = terms.iter();
                let Some(first) = iter.next() else {
                    return Bitmap::empty(num_docs);
                };
                let mut bitmap = self.term_bitmap(first);
                for t in iter {
                    bitmap.combine(BinaryOp::And, &self.term_bitmap(t));
                }
                bitmap
            }
        }
    }

    fn term_bitmap(&self, term: &str) -> Bitmap {
        let num_docs = self.index.num_docs();
        match self.index.postings(term) {
            Some(postings) => Bitmap::from_postings(postings, num_docs),
            None => Bitmap::empty(num_docs),
        }
    }
}

fn check_shape(tokens: &[ExprToken]) -> Result<(), QueryError> {
    if tokens.is_empty() {
        return Err(QueryError::Empty);
    }
    if tokens.len() % 2 == 0 {
        return Err(QueryError::EvenTokenCount(tokens.len()));
    }
    for (i, token) in tokens.iter().enumerate() {
        match (i % 2 == 0, token) {
            (true, ExprToken::Operator(_)) => return Err(QueryError::ExpectedOperand(i)),
            (false, ExprToken::Operand(_)) => return Err(QueryError::ExpectedOperator(i)),
            _ => {}
        }
    }
    Ok(())
}
