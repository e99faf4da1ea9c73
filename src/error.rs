use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("status body has no line {0}")]
    MissingLine(usize),

    #[error("line {line}: missing {what}")]
    MissingField { line: usize, what: &'static str },

    #[error("line {line}: {value:?} is not a valid counter")]
    InvalidInteger { line: usize, value: String },
}

impl StatusError {
    /// Connectivity and HTTP-level failures, as opposed to a body that
    /// arrived but could not be parsed. Both are retried the same way.
    pub fn is_transient(&self) -> bool {
        matches!(self, StatusError::Request(_) | StatusError::HttpStatus(_))
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;
