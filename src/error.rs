use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqletError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid argument: {name} = {value}, {message}")]
    InvalidArgument {
        name: String,
        value: String,
        message: String,
    },

    #[error(
        "Window [{start}, {end}) for filter {filter} falls outside sequence {sequence} of length {length}"
    )]
    WindowOutOfBounds {
        filter: usize,
        sequence: usize,
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Invalid sequence at position {position}: {message}")]
    InvalidSequence { position: usize, message: String },

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Type alias for Result with SeqletError
pub type Result<T> = std::result::Result<T, SeqletError>;

impl SeqletError {
    /// Create a new InvalidShape error
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        SeqletError::InvalidShape(message.into())
    }

    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, message: impl Into<String>) -> Self {
        SeqletError::InvalidSequence {
            position,
            message: message.into(),
        }
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        SeqletError::InvalidArgument {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

impl From<ndarray::ShapeError> for SeqletError {
    fn from(e: ndarray::ShapeError) -> Self {
        SeqletError::InvalidShape(e.to_string())
    }
}

impl From<polars::prelude::PolarsError> for SeqletError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        SeqletError::DataError(e.to_string())
    }
}

impl From<serde_yaml::Error> for SeqletError {
    fn from(e: serde_yaml::Error) -> Self {
        SeqletError::Config(e.to_string())
    }
}
