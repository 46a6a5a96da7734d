//! # Wordalign Core
//!
//! Turns a pair of parallel plain-text corpora into the numeric input format
//! of the `eflomal` word aligner, plans the sampling iterations for each
//! alignment stage and drives the aligner and the `atools` symmetrizer as
//! external processes.
//!
//! ## Quick Start
//!
//! ```rust
//! use wordalign_core::corpus::EncodedCorpus;
//! use wordalign_core::iterations::{plan, Model};
//!
//! let corpus = EncodedCorpus::from_reader("Hello world\n\n".as_bytes()).unwrap();
//! assert_eq!(corpus.to_text(), "2 2\n2 0 1\n0\n");
//!
//! let iters = plan(corpus.sentence_count(), Model::Fertility, 1.0);
//! assert_eq!(iters.as_tuple(), (884, 884, 3536));
//! ```
pub mod corpus;
pub mod error;
pub mod iterations;
pub mod pipeline;
pub mod process;
pub mod tools;

// Re-export primary API
pub use corpus::{EncodedCorpus, Vocabulary, encode_to_file};
pub use error::{AlignError, CorpusSide, Result};
pub use iterations::{IterationPlan, Model, plan};
pub use pipeline::{AlignPipeline, PipelineConfig};
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use tools::{AlignerCommand, SymmetrizerCommand};
