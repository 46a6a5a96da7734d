//! # Wordalign Server
//!
//! HTTP front end for the alignment pipeline. `POST /align` takes a
//! multipart upload with `src` and `tgt` text files and answers with the
//! symmetrized word alignment in Moses `i-j` format.

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, router};
