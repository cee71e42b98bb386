use anyhow::{bail, Context, Result};
use boolquery_core::persist::{load_engine, open_or_build, BuildMode, IndexPaths};
use boolquery_core::{Corpus, DocId, EngineConfig, MatchMode, MissingTermPolicy, SearchEngine};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    body: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a boolean retrieval index and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MatchArg {
    Raw,
    Normalized,
}

#[derive(clap::Args)]
struct EngineArgs {
    /// JSON file with engine settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// How vocabulary terms are matched against documents
    #[arg(long, value_enum)]
    match_mode: Option<MatchArg>,
    /// Disable stemming
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Skip query terms missing from the index instead of returning nothing
    #[arg(long, default_value_t = false)]
    ignore_missing: bool,
    /// Normalize boolean operands before lookup
    #[arg(long, default_value_t = false)]
    normalize_operands: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or load) the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Rebuild and overwrite an existing snapshot
        #[arg(long, default_value_t = false)]
        overwrite: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Free-text query; every term must match
    Query {
        #[arg(long, default_value = "./index")]
        index: String,
        query: String,
        /// Print matching documents, not just ids
        #[arg(long, default_value_t = false)]
        show: bool,
    },
    /// Boolean expression query using &, |, ~ and parentheses
    Boolean {
        #[arg(long, default_value = "./index")]
        index: String,
        expression: String,
        #[arg(long, default_value_t = false)]
        show: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, overwrite, engine } => {
            let config = engine_config(&engine)?;
            let mode = if overwrite { BuildMode::Overwrite } else { BuildMode::LoadIfPresent };
            build_index(&input, &output, config, mode)
        }
        Commands::Query { index, query, show } => {
            let engine = open_index(&index)?;
            let ids = engine.conjunctive_query(&query);
            print_hits(&engine, &ids, show);
            Ok(())
        }
        Commands::Boolean { index, expression, show } => {
            let engine = open_index(&index)?;
            let ids = engine.boolean_query(&expression)?;
            print_hits(&engine, &ids, show);
            Ok(())
        }
    }
}

fn engine_config(args: &EngineArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(m) = args.match_mode {
        config.match_mode = match m {
            MatchArg::Raw => MatchMode::RawWhitespace,
            MatchArg::Normalized => MatchMode::Normalized,
        };
    }
    if args.no_stem {
        config.stemming = false;
    }
    if args.ignore_missing {
        config.missing_terms = MissingTermPolicy::Ignore;
    }
    if args.normalize_operands {
        config.normalize_boolean_operands = true;
    }
    Ok(config)
}

fn open_index(dir: &str) -> Result<SearchEngine> {
    load_engine(&IndexPaths::new(dir)).with_context(|| format!("no usable index at {dir}; run `indexer build` first"))
}

fn print_hits(engine: &SearchEngine, ids: &[DocId], show: bool) {
    println!("{} matching documents", ids.len());
    for &id in ids {
        if show {
            let text = engine.corpus().get(id).unwrap_or_default();
            let preview: String = text.chars().take(200).collect();
            println!("{id}\t{preview}");
        } else {
            println!("{id}");
        }
    }
}

fn build_index(input: &str, output: &str, config: EngineConfig, mode: BuildMode) -> Result<()> {
    let corpus = load_corpus(Path::new(input))?;
    if corpus.is_empty() {
        bail!("no documents found under {input}");
    }
    tracing::info!(num_docs = corpus.len(), "loaded corpus");

    let paths = IndexPaths::new(output);
    let engine = open_or_build(&paths, corpus, config, mode)?;
    tracing::info!(output, vocabulary = engine.vocabulary().len(), num_terms = engine.index().len(), "index build complete");
    Ok(())
}

/// Reads documents in sorted path order so ids are stable across runs.
fn load_corpus(input_path: &Path) -> Result<Corpus> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }

    let mut documents = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut documents)?;
        } else {
            read_json(&file, &mut documents)?;
        }
    }
    Ok(Corpus::new(documents))
}

fn read_jsonl(file: &Path, documents: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), n + 1))?;
        documents.push(doc.body);
    }
    Ok(())
}

fn read_json(file: &Path, documents: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| file.display().to_string())?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                documents.push(doc.body);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            documents.push(doc.body);
        }
        _ => tracing::warn!(file = %file.display(), "skipping file without document objects"),
    }
    Ok(())
}
