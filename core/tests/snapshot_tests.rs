use boolquery_core::persist::{
    load_engine, load_engine_with_normalizer, load_index, load_vocabulary, open_or_build, save_engine, BuildMode, IndexPaths,
};
use boolquery_core::tokenizer::{IdentityStemmer, WordTokenizer};
use boolquery_core::{Corpus, EngineConfig, MatchMode, Normalizer, SearchEngine};
use std::collections::HashSet;
use std::fs;
use tempfile::tempdir;

const QUERIES: &[&str] = &["cat", "dog", "cat dog", "played", "zebra"];
const EXPRESSIONS: &[&str] = &["cat & dog", "cat | dog", "cat & ~dog", "(cat | dog) & sat", "zebra | ran"];

fn corpus() -> Corpus {
    ["the cat sat", "the dog ran", "cat and dog played"].into_iter().collect()
}

fn assert_same_answers(a: &SearchEngine, b: &SearchEngine) {
    for q in QUERIES {
        assert_eq!(a.conjunctive_query(q), b.conjunctive_query(q), "query {q:?}");
    }
    for expr in EXPRESSIONS {
        assert_eq!(a.boolean_query(expr).unwrap(), b.boolean_query(expr).unwrap(), "expression {expr:?}");
    }
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let config = EngineConfig { match_mode: MatchMode::Normalized, ..EngineConfig::default() };
    let built = SearchEngine::build(corpus(), config);
    save_engine(&paths, &built).unwrap();

    let loaded = load_engine(&paths).unwrap();
    assert_eq!(loaded.vocabulary(), built.vocabulary());
    assert_eq!(loaded.index(), built.index());
    assert_eq!(loaded.corpus(), built.corpus());
    assert_eq!(loaded.config(), built.config());
    assert_same_answers(&built, &loaded);
}

#[test]
fn open_or_build_reuses_a_matching_snapshot() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let first = open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert!(paths.vocabulary().is_file());
    assert!(paths.inverted_index().is_file());

    // A hand-edited index is picked up as-is, proving nothing was rebuilt.
    fs::write(paths.inverted_index(), r#"{"cat":[1]}"#).unwrap();
    let second = open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert_eq!(second.conjunctive_query("cat"), vec![1]);
    assert_eq!(second.vocabulary(), first.vocabulary());
}

#[test]
fn overwrite_rebuilds_from_the_corpus() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let first = open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::Overwrite).unwrap();
    fs::write(paths.inverted_index(), r#"{"cat":[1]}"#).unwrap();

    let rebuilt = open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::Overwrite).unwrap();
    assert_eq!(rebuilt.conjunctive_query("cat"), vec![0, 2]);
    assert_eq!(load_index(&paths, 3).unwrap(), *first.index());
}

#[test]
fn changed_corpus_forces_a_rebuild() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();

    let bigger: Corpus = ["the cat sat", "the dog ran", "cat and dog played", "a bird sang"].into_iter().collect();
    let e = open_or_build(&paths, bigger, EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert_eq!(e.conjunctive_query("bird"), vec![3]);
    assert!(load_vocabulary(&paths).unwrap().contains("bird"));
    assert_eq!(load_engine(&paths).unwrap().corpus().len(), 4);
}

#[test]
fn corrupt_snapshot_falls_back_to_building() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    fs::write(paths.inverted_index(), b"garbage").unwrap();

    assert!(load_engine(&paths).err().unwrap().is_unavailable());
    let e = open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert_eq!(e.boolean_query("cat & ~dog").unwrap(), vec![0]);
    assert!(load_engine(&paths).is_ok());
}

#[test]
fn same_sized_corpus_with_new_text_is_rebuilt() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let before: Corpus = ["cat sat", "dog ran"].into_iter().collect();
    open_or_build(&paths, before, EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();

    let after: Corpus = ["dog ran", "bird sang"].into_iter().collect();
    let e = open_or_build(&paths, after.clone(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert!(e.conjunctive_query("cat").is_empty());
    assert_eq!(e.conjunctive_query("bird"), vec![1]);
    assert_eq!(e.conjunctive_query("dog"), vec![0]);

    let reloaded = load_engine(&paths).unwrap();
    assert_eq!(reloaded.corpus(), &after);
    assert_eq!(reloaded.index(), e.index());
}

#[test]
fn reordered_corpus_is_rebuilt() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    open_or_build(&paths, corpus(), EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();

    let reversed: Corpus = ["cat and dog played", "the dog ran", "the cat sat"].into_iter().collect();
    let e = open_or_build(&paths, reversed, EngineConfig::default(), BuildMode::LoadIfPresent).unwrap();
    assert_eq!(e.conjunctive_query("sat"), vec![2]);
}

#[test]
fn load_with_a_custom_normalizer() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_engine(&paths, &SearchEngine::build(corpus(), EngineConfig::default())).unwrap();

    let stopwords: HashSet<String> = ["cat".to_string()].into_iter().collect();
    let normalizer = Normalizer::new(Box::new(WordTokenizer), stopwords, Box::new(IdentityStemmer));
    assert!(normalizer.is_stopword("cat"));
    assert!(!normalizer.is_stopword("Cat"));

    let e = load_engine_with_normalizer(&paths, normalizer).unwrap();
    // The stored index still has "cat", but queries now drop it as a stopword.
    assert!(e.index().contains_term("cat"));
    assert!(e.conjunctive_query("cat").is_empty());
    assert_eq!(e.conjunctive_query("Cat"), vec![0, 2]);
}
