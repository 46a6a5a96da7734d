//! Corpus encoding tool
//!
//! Converts a plain-text corpus (one sentence per line) into the numeric
//! format read by the eflomal aligner, the same way the server does for each
//! upload. Useful for preparing corpora for a standalone aligner run.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use wordalign_core::{EncodedCorpus, IterationPlan, Model, plan};

/// CLI arguments
#[derive(Parser)]
#[command(name = "corpus-encode")]
#[command(about = "Encode a plain-text corpus for the eflomal aligner")]
#[command(version)]
struct Cli {
    /// Input corpus, `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Print a JSON summary to stderr
    #[arg(short, long)]
    summary: bool,

    /// Model used to plan iterations in the summary
    #[arg(short, long, default_value_t = 3)]
    model: u8,

    /// Iteration scale used in the summary
    #[arg(long, default_value_t = 1.0)]
    rel_iterations: f64,
}

/// Summary of an encoded corpus.
#[derive(Debug, Serialize)]
struct Summary {
    sentences: usize,
    empty_sentences: usize,
    tokens: usize,
    vocab_size: usize,
    model: Model,
    iterations: IterationPlan,
}

impl Summary {
    fn new(corpus: &EncodedCorpus, model: Model, rel_iterations: f64) -> Self {
        let sentences = corpus.sentences();
        Self {
            sentences: corpus.sentence_count(),
            empty_sentences: sentences.iter().filter(|s| s.is_empty()).count(),
            tokens: sentences.iter().map(Vec::len).sum(),
            vocab_size: corpus.vocab_size(),
            model,
            iterations: plan(corpus.sentence_count(), model, rel_iterations),
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let model = Model::try_from(cli.model)?;

    let corpus = EncodedCorpus::from_reader(open_input(&cli.input)?)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    corpus
        .write_to(open_output(&cli.output)?)
        .context("failed to write encoded corpus")?;
    info!(
        sentences = corpus.sentence_count(),
        vocab = corpus.vocab_size(),
        "encoded corpus"
    );

    if cli.summary {
        let summary = Summary::new(&corpus, model, cli.rel_iterations);
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
