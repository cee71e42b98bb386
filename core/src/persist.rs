//! Snapshot directory: vocabulary, inverted index, documents and metadata.

use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::engine::SearchEngine;
use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::normalizer::Normalizer;
use crate::vocabulary::Vocabulary;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Reuse stored structures when they exist and match the corpus.
    #[default]
    LoadIfPresent,
    /// Always rebuild from the corpus and overwrite the snapshot.
    Overwrite,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocab.bin") }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.json") }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Writes through a sibling temp file and renames it into place, so a reader
/// never sees a half-written snapshot file.
fn write_atomic(path: &Path, encode: impl FnOnce(&mut BufWriter<File>) -> std::result::Result<(), String>) -> Result<()> {
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        encode(&mut writer).map_err(|reason| Error::Encode { path: path.to_path_buf(), reason })?;
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
    }
    fs::rename(&tmp, path).map_err(io_err)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| Error::unavailable(path, e))
}

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    let terms: Vec<&str> = vocabulary.iter().collect();
    write_atomic(&paths.vocabulary(), |w| bincode::serialize_into(w, &terms).map_err(|e| e.to_string()))
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    let path = paths.vocabulary();
    let terms: Vec<String> = bincode::deserialize_from(open(&path)?).map_err(|e| Error::unavailable(&path, e))?;
    Ok(Vocabulary::from_terms(terms))
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    write_atomic(&paths.inverted_index(), |w| serde_json::to_writer(w, index.as_map()).map_err(|e| e.to_string()))
}

/// `num_docs` bounds the stored ids; anything out of range is reported as
/// an unavailable index.
pub fn load_index(paths: &IndexPaths, num_docs: usize) -> Result<InvertedIndex> {
    let path = paths.inverted_index();
    let postings: BTreeMap<String, Vec<DocId>> =
        serde_json::from_reader(open(&path)?).map_err(|e| Error::unavailable(&path, e))?;
    InvertedIndex::from_postings(postings, num_docs).map_err(|e| match e {
        Error::IndexUnavailable { reason, .. } => Error::unavailable(&path, reason),
        other => other,
    })
}

pub fn save_documents(paths: &IndexPaths, corpus: &Corpus) -> Result<()> {
    write_atomic(&paths.documents(), |w| bincode::serialize_into(w, corpus.documents()).map_err(|e| e.to_string()))
}

pub fn load_documents(paths: &IndexPaths) -> Result<Corpus> {
    let path = paths.documents();
    let documents: Vec<String> = bincode::deserialize_from(open(&path)?).map_err(|e| Error::unavailable(&path, e))?;
    Ok(Corpus::new(documents))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    write_atomic(&paths.meta(), |w| serde_json::to_writer_pretty(w, meta).map_err(|e| e.to_string()))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let meta: MetaFile = serde_json::from_reader(open(&path)?).map_err(|e| Error::unavailable(&path, e))?;
    if meta.version != SNAPSHOT_VERSION {
        return Err(Error::unavailable(&path, format!("unsupported snapshot version {}", meta.version)));
    }
    Ok(meta)
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Persists the whole engine: vocabulary, index, documents and metadata.
pub fn save_engine(paths: &IndexPaths, engine: &SearchEngine) -> Result<()> {
    save_vocabulary(paths, engine.vocabulary())?;
    save_index(paths, engine.index())?;
    save_documents(paths, engine.corpus())?;
    save_meta(paths, &MetaFile {
        num_docs: engine.corpus().len() as u32,
        num_terms: engine.index().len() as u32,
        created_at: now_rfc3339(),
        version: SNAPSHOT_VERSION,
        config: engine.config().clone(),
    })?;
    tracing::info!(root = %paths.root.display(), "saved snapshot");
    Ok(())
}

/// Restores an engine from a snapshot without touching the original corpus.
pub fn load_engine(paths: &IndexPaths) -> Result<SearchEngine> {
    let meta = load_meta(paths)?;
    let normalizer = Normalizer::from_config(&meta.config);
    load_engine_with(paths, meta, normalizer)
}

/// Like [`load_engine`] but with a caller-supplied normalizer.
pub fn load_engine_with_normalizer(paths: &IndexPaths, normalizer: Normalizer) -> Result<SearchEngine> {
    let meta = load_meta(paths)?;
    load_engine_with(paths, meta, normalizer)
}

fn load_engine_with(paths: &IndexPaths, meta: MetaFile, normalizer: Normalizer) -> Result<SearchEngine> {
    let corpus = load_documents(paths)?;
    if corpus.len() != meta.num_docs as usize {
        return Err(Error::unavailable(
            paths.documents(),
            format!("expected {} documents, found {}", meta.num_docs, corpus.len()),
        ));
    }
    let vocabulary = load_vocabulary(paths)?;
    let index = load_index(paths, corpus.len())?;
    tracing::info!(num_docs = corpus.len(), num_terms = index.len(), "loaded snapshot");
    Ok(SearchEngine::from_parts(corpus, vocabulary, index, meta.config, normalizer))
}

/// Loads the vocabulary and index for `corpus` if a matching snapshot exists,
/// otherwise builds them; either way the snapshot on disk is left complete.
pub fn open_or_build(paths: &IndexPaths, corpus: Corpus, config: EngineConfig, mode: BuildMode) -> Result<SearchEngine> {
    let normalizer = Normalizer::from_config(&config);
    let reusable = mode == BuildMode::LoadIfPresent && snapshot_matches(paths, &corpus, &config);

    let loaded_vocab = if reusable { load_vocabulary(paths).ok() } else { None };
    let vocab_loaded = loaded_vocab.is_some();
    let vocabulary = match loaded_vocab {
        Some(vocabulary) => vocabulary,
        None => {
            let vocabulary = Vocabulary::build(&corpus, &normalizer);
            save_vocabulary(paths, &vocabulary)?;
            vocabulary
        }
    };

    // A rebuilt vocabulary invalidates any stored index.
    let loaded_index = if reusable && vocab_loaded { load_index(paths, corpus.len()).ok() } else { None };
    let index_loaded = loaded_index.is_some();
    let index = match loaded_index {
        Some(index) => index,
        None => {
            let index = InvertedIndex::build(&corpus, &vocabulary, &normalizer, config.match_mode);
            save_index(paths, &index)?;
            index
        }
    };

    let engine = SearchEngine::from_parts(corpus, vocabulary, index, config, normalizer);
    if !(vocab_loaded && index_loaded) {
        save_documents(paths, engine.corpus())?;
        save_meta(paths, &MetaFile {
            num_docs: engine.corpus().len() as u32,
            num_terms: engine.index().len() as u32,
            created_at: now_rfc3339(),
            version: SNAPSHOT_VERSION,
            config: engine.config().clone(),
        })?;
    }
    tracing::info!(vocab_loaded, index_loaded, num_terms = engine.index().len(), "index ready");
    Ok(engine)
}

/// A snapshot is reusable only if it was built with the same settings from
/// exactly the same documents, in the same order.
fn snapshot_matches(paths: &IndexPaths, corpus: &Corpus, config: &EngineConfig) -> bool {
    let meta = match load_meta(paths) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(error = %e, "no usable snapshot");
            return false;
        }
    };
    if meta.num_docs as usize != corpus.len() || &meta.config != config {
        tracing::warn!(stored_docs = meta.num_docs, num_docs = corpus.len(), "snapshot settings differ, rebuilding");
        return false;
    }
    match load_documents(paths) {
        Ok(stored) if stored == *corpus => true,
        Ok(_) => {
            tracing::warn!(num_docs = corpus.len(), "snapshot documents differ from corpus, rebuilding");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "snapshot documents unreadable, rebuilding");
            false
        }
    }
}
