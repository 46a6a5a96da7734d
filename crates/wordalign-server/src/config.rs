//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use wordalign_core::tools::{DEFAULT_ALIGNER, DEFAULT_SYMMETRIZER};
use wordalign_core::{AlignError, AlignerCommand, Model, PipelineConfig, SymmetrizerCommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "wordalign-server")]
#[command(about = "Word-align parallel corpora over HTTP with eflomal and atools")]
#[command(version)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(short, long, env = "WORDALIGN_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Path of the eflomal aligner binary
    #[arg(long, env = "WORDALIGN_ALIGNER", default_value = DEFAULT_ALIGNER)]
    pub aligner: PathBuf,

    /// Path of the atools symmetrizer
    #[arg(long, env = "WORDALIGN_SYMMETRIZER", default_value = DEFAULT_SYMMETRIZER)]
    pub symmetrizer: PathBuf,

    /// Alignment model: 1 = IBM1, 2 = +HMM, 3 = +fertility
    #[arg(short, long, env = "WORDALIGN_MODEL", default_value_t = 3)]
    pub model: u8,

    /// Scale factor for the number of sampling iterations
    #[arg(long, env = "WORDALIGN_REL_ITERATIONS", default_value_t = 1.0)]
    pub rel_iterations: f64,

    /// Fixed IBM1 iterations, overriding the planned count
    #[arg(long, env = "WORDALIGN_ITERS1")]
    pub iters1: Option<usize>,

    /// Fixed HMM iterations, overriding the planned count
    #[arg(long, env = "WORDALIGN_ITERS2")]
    pub iters2: Option<usize>,

    /// Fixed fertility iterations, overriding the planned count
    #[arg(long, env = "WORDALIGN_ITERS3")]
    pub iters3: Option<usize>,

    /// Prior probability of NULL alignments
    #[arg(long, env = "WORDALIGN_NULL_PRIOR", default_value_t = 0.2)]
    pub null_prior: f64,

    /// Number of independent samplers
    #[arg(long, env = "WORDALIGN_SAMPLERS", default_value_t = 1)]
    pub samplers: usize,

    /// Parent directory for per-request scratch directories
    #[arg(long, env = "WORDALIGN_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Reject request bodies larger than this many bytes (no limit by default)
    #[arg(long, env = "WORDALIGN_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,
}

impl ServerConfig {
    /// Validate the settings and build the pipeline configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, AlignError> {
        Ok(PipelineConfig {
            aligner: AlignerCommand {
                program: self.aligner.clone(),
                model: Model::try_from(self.model)?,
                null_prior: self.null_prior,
                samplers: self.samplers,
            },
            symmetrizer: SymmetrizerCommand {
                program: self.symmetrizer.clone(),
            },
            rel_iterations: self.rel_iterations,
            iteration_overrides: [self.iters1, self.iters2, self.iters3],
            work_dir: self.work_dir.clone(),
        })
    }
}
