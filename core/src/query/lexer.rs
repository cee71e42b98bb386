use super::{BinaryOp, ExprToken, ExpressionLexer, Operand, OperandKind, MAX_GROUP_DEPTH};
use crate::error::QueryError;

/// Lexes `&`, `|`, `~`, bare words and parenthesized groups. A group is
/// returned whole as one operand and re-lexed when evaluated.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupingLexer;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

impl ExpressionLexer for GroupingLexer {
    fn lex(&self, expression: &str) -> Result<Vec<ExprToken>, QueryError> {
        let mut tokens = Vec::new();
        let mut chars = expression.char_indices().peekable();
        let mut negate_at: Option<usize> = None;

        while let Some(&(offset, c)) = chars.peek() {
            if c.is_whitespace() {
                if let Some(at) = negate_at {
                    return Err(QueryError::DanglingNot(at));
                }
                chars.next();
                continue;
            }
            match c {
                '&' | '|' => {
                    if let Some(at) = negate_at {
                        return Err(QueryError::DanglingNot(at));
                    }
                    chars.next();
                    let op = if c == '&' { BinaryOp::And } else { BinaryOp::Or };
                    tokens.push(ExprToken::Operator(op));
                }
                '~' => {
                    if let Some(at) = negate_at {
                        return Err(QueryError::DanglingNot(at));
                    }
                    chars.next();
                    negate_at = Some(offset);
                }
                '(' => {
                    chars.next();
                    let start = offset + 1;
                    let mut depth = 1usize;
                    let mut end = None;
                    for (i, ch) in chars.by_ref() {
                        match ch {
                            '(' => {
                                depth += 1;
                                if depth > MAX_GROUP_DEPTH {
                                    return Err(QueryError::TooDeep(MAX_GROUP_DEPTH));
                                }
                            }
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    end = Some(i);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    let end = end.ok_or(QueryError::UnbalancedParen(offset))?;
                    let inner = &expression[start..end];
                    if inner.trim().is_empty() {
                        return Err(QueryError::EmptyGroup(offset));
                    }
                    tokens.push(ExprToken::Operand(Operand {
                        negated: negate_at.take().is_some(),
                        kind: OperandKind::Group(inner.to_string()),
                    }));
                }
                ')' => return Err(QueryError::UnbalancedParen(offset)),
                c if is_word_char(c) => {
                    let mut end = expression.len();
                    while let Some(&(i, ch)) = chars.peek() {
                        if !is_word_char(ch) {
                            end = i;
                            break;
                        }
                        chars.next();
                    }
                    tokens.push(ExprToken::Operand(Operand {
                        negated: negate_at.take().is_some(),
                        kind: OperandKind::Term(expression[offset..end].to_string()),
                    }));
                }
                other => return Err(QueryError::UnexpectedChar { ch: other, offset }),
            }
        }
        if let Some(at) = negate_at {
            return Err(QueryError::DanglingNot(at));
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str, negated: bool) -> ExprToken {
        ExprToken::Operand(Operand { negated, kind: OperandKind::Term(s.into()) })
    }

    #[test]
    fn lexes_terms_and_operators() {
        let tokens = GroupingLexer.lex("cat & ~dog|bird").unwrap();
        assert_eq!(
            tokens,
            vec![
                term("cat", false),
                ExprToken::Operator(BinaryOp::And),
                term("dog", true),
                ExprToken::Operator(BinaryOp::Or),
                term("bird", false),
            ]
        );
    }

    #[test]
    fn groups_are_single_tokens() {
        let tokens = GroupingLexer.lex("~(a | (b & c)) & d").unwrap();
        assert_eq!(
            tokens[0],
            ExprToken::Operand(Operand { negated: true, kind: OperandKind::Group("a | (b & c)".into()) })
        );
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(GroupingLexer.lex("(a & b"), Err(QueryError::UnbalancedParen(0)));
        assert_eq!(GroupingLexer.lex("a & b)"), Err(QueryError::UnbalancedParen(5)));
        assert_eq!(GroupingLexer.lex("a ^ b"), Err(QueryError::UnexpectedChar { ch: '^', offset: 2 }));
        assert_eq!(GroupingLexer.lex("a & ~ b"), Err(QueryError::DanglingNot(4)));
        assert_eq!(GroupingLexer.lex("a & ()"), Err(QueryError::EmptyGroup(4)));
    }

    #[test]
    fn rejects_nesting_past_the_limit() {
        let ok = format!("{}a{}", "(".repeat(MAX_GROUP_DEPTH), ")".repeat(MAX_GROUP_DEPTH));
        assert_eq!(GroupingLexer.lex(&ok).unwrap().len(), 1);
        let deep = format!("{}a{}", "(".repeat(MAX_GROUP_DEPTH + 1), ")".repeat(MAX_GROUP_DEPTH + 1));
        assert_eq!(GroupingLexer.lex(&deep), Err(QueryError::TooDeep(MAX_GROUP_DEPTH)));
    }

    #[test]
    fn word_at_end_of_input() {
        assert_eq!(GroupingLexer.lex("café").unwrap(), vec![term("café", false)]);
    }
}
