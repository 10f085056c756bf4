//! Maximally-activating seqlets and position frequency matrices for convolutional filters
//!
//! activations + one-hot sequences → [`scanner`] → [`seqlets`] → [`pfm`]

pub mod config;
pub mod encoding;
pub mod error;
pub mod fasta;
pub mod meme;
pub mod model;
pub mod pfm;
pub mod pipeline;
pub mod scanner;
pub mod seqlets;
pub mod types;

pub use config::{PipelineConfig, SelectionMethod};
pub use error::{Result, SeqletError};
pub use pipeline::{FilterInterpreter, FilterReport};
