use thiserror::Error;

/// Errors produced by the fingerprinting core and its decode/capture/
/// persistence collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported PCM format: {0}")]
    UnsupportedFormat(String),

    #[error("index I/O error: {0}")]
    IndexIo(String),

    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("audio capture error: {0}")]
    Capture(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::IndexIo(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IndexIo(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
