//! # Alignment Pipeline
//!
//! One run encodes both corpora into a private scratch directory, plans the
//! sampling iterations, runs the aligner in both directions, symmetrizes the
//! two alignments and returns the result. The scratch directory is removed
//! before [`AlignPipeline::run`] returns, whatever the outcome.

use std::fs::{self, File};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::corpus::encode_to_file;
use crate::error::{AlignError, CorpusSide, Result};
use crate::iterations::{IterationPlan, plan};
use crate::process::{ProcessRunner, SystemRunner};
use crate::tools::{AlignerCommand, AlignerPaths, SymmetrizerCommand};

/// Prefix of every per-run scratch directory.
pub const WORKSPACE_PREFIX: &str = "align";

/// Settings shared by every pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub aligner: AlignerCommand,
    pub symmetrizer: SymmetrizerCommand,
    /// Scale applied to the base iteration budget.
    pub rel_iterations: f64,
    /// Fixed per-stage iteration counts that replace the planned ones.
    pub iteration_overrides: [Option<usize>; 3],
    /// Parent of the scratch directories; the system temp dir when `None`.
    pub work_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aligner: AlignerCommand::default(),
            symmetrizer: SymmetrizerCommand::default(),
            rel_iterations: 1.0,
            iteration_overrides: [None; 3],
            work_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parent directory for scratch directories.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Set the relative iteration scale.
    pub fn with_rel_iterations(mut self, rel: f64) -> Self {
        self.rel_iterations = rel;
        self
    }
}

/// Runs alignments with a fixed configuration.
///
/// Cheap to clone; clones share the process runner. A run keeps all of its
/// state on its own stack, so concurrent runs do not interfere.
#[derive(Clone)]
pub struct AlignPipeline {
    config: PipelineConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for AlignPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AlignPipeline {
    /// Create a pipeline that starts real processes.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner::new()))
    }

    /// Create a pipeline with a custom process runner.
    pub fn with_runner(config: PipelineConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Iteration plan for a source corpus of `n_sentences` lines.
    pub fn plan(&self, n_sentences: usize) -> IterationPlan {
        plan(
            n_sentences,
            self.config.aligner.model,
            self.config.rel_iterations,
        )
        .with_overrides(self.config.iteration_overrides)
    }

    /// Align `source` against `target` and return the symmetrized alignment.
    pub fn run<S: BufRead, T: BufRead>(&self, source: S, target: T) -> Result<Vec<u8>> {
        let workspace = self.create_workspace()?;
        debug!(dir = %workspace.path().display(), "created workspace");

        let result = self.run_in(workspace.path(), source, target);

        let dir = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!(dir = %dir.display(), error = %e, "failed to remove workspace");
        }
        result
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        match &self.config.work_dir {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(AlignError::TempDir)
    }

    fn run_in<S: BufRead, T: BufRead>(&self, dir: &Path, source: S, target: T) -> Result<Vec<u8>> {
        let src_path = dir.join("src.txt");
        let tgt_path = dir.join("tgt.txt");
        let fwd_path = dir.join("out.fwd");
        let rev_path = dir.join("out.rev");
        let sym_path = dir.join("out.sym");

        let n_sentences = encode_to_file(source, &src_path).map_err(|source| AlignError::Encode {
            side: CorpusSide::Source,
            source,
        })?;
        let n_target = encode_to_file(target, &tgt_path).map_err(|source| AlignError::Encode {
            side: CorpusSide::Target,
            source,
        })?;
        if n_sentences != n_target {
            warn!(
                source = n_sentences,
                target = n_target,
                "corpora differ in sentence count"
            );
        }

        let iterations = self.plan(n_sentences);
        debug!(sentences = n_sentences, plan = %iterations, "planned iterations");

        let paths = AlignerPaths {
            source: &src_path,
            target: &tgt_path,
            forward: &fwd_path,
            reverse: &rev_path,
        };
        let invocation = self.config.aligner.invocation(&paths, &iterations);
        let out = self
            .runner
            .run(&invocation)
            .map_err(|source| AlignError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if !out.success {
            warn!(code = ?out.code, "aligner failed");
            return Err(AlignError::AlignerFailed {
                output: out.output_lossy(),
            });
        }

        File::create(&sym_path).map_err(AlignError::CreateOutput)?;
        let invocation = self
            .config
            .symmetrizer
            .invocation(&fwd_path, &rev_path, &sym_path);
        let out = self
            .runner
            .run(&invocation)
            .map_err(|source| AlignError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if !out.success {
            warn!(code = ?out.code, "symmetrizer failed");
            let output = match fs::read(&sym_path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => match out.code {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                },
            };
            return Err(AlignError::SymmetrizerFailed { output });
        }

        fs::read(&sym_path).map_err(AlignError::ReadOutput)
    }
}
