use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::normalizer::Normalizer;
use crate::query::{conjunctive_query, BooleanEvaluator, ExprToken, ExpressionLexer, GroupingLexer, Operand, OperandResolver};
use crate::vocabulary::Vocabulary;
use crate::DocId;

/// Corpus, vocabulary and index bundled with the normalizer that produced
/// them. Immutable once built; share it behind an `Arc` for concurrent reads.
pub struct SearchEngine {
    corpus: Corpus,
    vocabulary: Vocabulary,
    index: InvertedIndex,
    normalizer: Normalizer,
    lexer: Box<dyn ExpressionLexer>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn build(corpus: Corpus, config: EngineConfig) -> Self {
        let normalizer = Normalizer::from_config(&config);
        Self::with_normalizer(corpus, config, normalizer)
    }

    pub fn with_normalizer(corpus: Corpus, config: EngineConfig, normalizer: Normalizer) -> Self {
        let vocabulary = Vocabulary::build(&corpus, &normalizer);
        let index = InvertedIndex::build(&corpus, &vocabulary, &normalizer, config.match_mode);
        Self::from_parts(corpus, vocabulary, index, config, normalizer)
    }

    pub fn from_parts(
        corpus: Corpus,
        vocabulary: Vocabulary,
        index: InvertedIndex,
        config: EngineConfig,
        normalizer: Normalizer,
    ) -> Self {
        Self { corpus, vocabulary, index, normalizer, lexer: Box::new(GroupingLexer), config }
    }

    /// Replaces the boolean expression lexer.
    pub fn with_lexer(mut self, lexer: Box<dyn ExpressionLexer>) -> Self {
        self.lexer = lexer;
        self
    }

    pub fn conjunctive_query(&self, text: &str) -> Vec<DocId> {
        let ids = conjunctive_query(&self.index, &self.normalizer, text, self.config.missing_terms);
        tracing::debug!(query = text, hits = ids.len(), "conjunctive query");
        ids
    }

    pub fn boolean_query(&self, expression: &str) -> Result<Vec<DocId>> {
        let resolver = if self.config.normalize_boolean_operands {
            OperandResolver::Normalized(&self.normalizer)
        } else {
            OperandResolver::Verbatim
        };
        let ids = BooleanEvaluator::new(&self.index, self.lexer.as_ref(), resolver).evaluate(expression)?;
        tracing::debug!(expression, hits = ids.len(), "boolean query");
        Ok(ids)
    }

    /// True when `expression` starts with a `~` operand. That `~` is not
    /// applied, so the result contains the operand's matches, not their
    /// complement.
    pub fn leading_not_ignored(&self, expression: &str) -> bool {
        matches!(
            self.lexer.lex(expression).as_deref(),
            Ok([ExprToken::Operand(Operand { negated: true, .. }), ..])
        )
    }

    /// Texts for the given ids; unknown ids are skipped.
    pub fn documents(&self, ids: &[DocId]) -> Vec<&str> {
        ids.iter().filter_map(|&id| self.corpus.get(id)).collect()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
