use thiserror::Error;

/// Failures that reach the user. Metadata and transcript problems never do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid YouTube URL: {input}")]
    InvalidUrl { input: String },

    #[error("{0}")]
    GenerationFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
