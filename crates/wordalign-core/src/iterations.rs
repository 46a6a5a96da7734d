//! # Iteration Planning
//!
//! Picks how many Gibbs sampling iterations each of the three alignment
//! stages (IBM1, HMM, fertility) runs. Larger corpora converge in fewer
//! passes, so the base count decays with the square root of the corpus size.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AlignError;

/// Base iteration budget before scaling by corpus size.
const BASE_ITERATIONS: f64 = 5000.0;

/// Alignment model selector understood by the aligner's `-m` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Model {
    /// IBM Model 1 only.
    Ibm1 = 1,
    /// IBM1 followed by the HMM model.
    Hmm = 2,
    /// IBM1, HMM and the fertility model.
    #[default]
    Fertility = 3,
}

impl Model {
    /// The numeric selector passed on the aligner command line.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Model {
    type Error = AlignError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Ibm1),
            2 => Ok(Self::Hmm),
            3 => Ok(Self::Fertility),
            other => Err(AlignError::InvalidModel(other)),
        }
    }
}

impl From<Model> for u8 {
    fn from(model: Model) -> Self {
        model.as_u8()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Iteration counts for the IBM1, HMM and fertility stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IterationPlan {
    pub ibm1: usize,
    pub hmm: usize,
    pub fertility: usize,
}

impl IterationPlan {
    /// Build a plan from explicit stage counts.
    pub fn new(ibm1: usize, hmm: usize, fertility: usize) -> Self {
        Self {
            ibm1,
            hmm,
            fertility,
        }
    }

    /// The plan as an `(ibm1, hmm, fertility)` tuple.
    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.ibm1, self.hmm, self.fertility)
    }

    /// Replace stage counts with operator-supplied values.
    ///
    /// An override of `None` or `Some(0)` keeps the planned count.
    #[must_use]
    pub fn with_overrides(self, overrides: [Option<usize>; 3]) -> Self {
        let pick = |planned: usize, forced: Option<usize>| match forced {
            Some(n) if n > 0 => n,
            _ => planned,
        };
        Self {
            ibm1: pick(self.ibm1, overrides[0]),
            hmm: pick(self.hmm, overrides[1]),
            fertility: pick(self.fertility, overrides[2]),
        }
    }
}

impl fmt::Display for IterationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ibm1, self.hmm, self.fertility)
    }
}

/// Compute the per-stage iteration counts.
///
/// `iters = max(2, round(rel_iterations * 5000 / sqrt(n_sentences)))` runs in
/// the most complex enabled stage; earlier stages run a quarter of that,
/// floored at 2 for the IBM1 stage. A sentence count of 0 is treated as 1.
///
/// # Examples
/// ```
/// use wordalign_core::iterations::{plan, Model};
///
/// assert_eq!(plan(1, Model::Ibm1, 1.0).as_tuple(), (5000, 0, 0));
/// assert_eq!(plan(10_000, Model::Fertility, 1.0).as_tuple(), (12, 12, 50));
/// ```
pub fn plan(n_sentences: usize, model: Model, rel_iterations: f64) -> IterationPlan {
    let n = n_sentences.max(1) as f64;
    let iters = (rel_iterations * BASE_ITERATIONS / n.sqrt()).round().max(2.0) as usize;
    let iters4 = (iters / 4).max(1);

    match model {
        Model::Ibm1 => IterationPlan::new(iters, 0, 0),
        Model::Hmm => IterationPlan::new(iters4.max(2), iters, 0),
        Model::Fertility => IterationPlan::new(iters4.max(2), iters4, iters),
    }
}
