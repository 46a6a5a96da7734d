//! Command lines for the external aligner and symmetrizer.

use std::path::{Path, PathBuf};

use crate::iterations::{IterationPlan, Model};
use crate::process::Invocation;

/// Symmetrization heuristic requested from `atools`.
pub const SYMMETRIZATION_HEURISTIC: &str = "grow-diag-final-and";

/// Default install location of the aligner binary.
pub const DEFAULT_ALIGNER: &str = "/app/eflomal";

/// Default symmetrizer, resolved through `PATH`.
pub const DEFAULT_SYMMETRIZER: &str = "atools";

/// Files the aligner reads and writes.
#[derive(Debug, Clone)]
pub struct AlignerPaths<'a> {
    pub source: &'a Path,
    pub target: &'a Path,
    pub forward: &'a Path,
    pub reverse: &'a Path,
}

/// How to invoke the `eflomal` aligner.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignerCommand {
    pub program: PathBuf,
    pub model: Model,
    /// Prior probability of a NULL alignment (`-N`).
    pub null_prior: f64,
    /// Number of independent samplers (`-n`).
    pub samplers: usize,
}

impl Default for AlignerCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ALIGNER),
            model: Model::default(),
            null_prior: 0.2,
            samplers: 1,
        }
    }
}

impl AlignerCommand {
    /// Build the invocation producing forward and reverse alignments.
    pub fn invocation(&self, paths: &AlignerPaths<'_>, plan: &IterationPlan) -> Invocation {
        Invocation::new(&self.program)
            .flag("-s", paths.source)
            .flag("-t", paths.target)
            .flag("-f", paths.forward)
            .flag("-r", paths.reverse)
            .flag("-m", self.model.to_string())
            .flag("-1", plan.ibm1.to_string())
            .flag("-2", plan.hmm.to_string())
            .flag("-3", plan.fertility.to_string())
            .flag("-n", self.samplers.to_string())
            .flag("-N", self.null_prior.to_string())
    }
}

/// How to invoke the `atools` symmetrizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetrizerCommand {
    pub program: PathBuf,
}

impl Default for SymmetrizerCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_SYMMETRIZER),
        }
    }
}

impl SymmetrizerCommand {
    /// Build the invocation combining `forward` and `reverse` into `output`.
    pub fn invocation(&self, forward: &Path, reverse: &Path, output: &Path) -> Invocation {
        Invocation::new(&self.program)
            .flag("-i", forward)
            .flag("-j", reverse)
            .flag("-c", SYMMETRIZATION_HEURISTIC)
            .redirect_output(output)
    }
}
