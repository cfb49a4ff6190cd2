//! Error types shared across the quiz core

use thiserror::Error;

/// Errors surfaced to callers of the quiz core.
///
/// Leaderboard transport failures are not part of this enum: the leaderboard
/// client recovers from them locally and degrades to an empty list.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("not enough words to build a question (have {available}, need {needed})")]
    NotEnoughWords { available: usize, needed: usize },

    #[error("invalid player name: {0}")]
    InvalidName(String),

    #[error("unknown level id: {0}")]
    UnknownLevel(u8),

    #[error("action not available on the current screen")]
    WrongScreen,

    #[error("catalog import failed: {0}")]
    CatalogImport(String),

    #[error("failed to read CSV")]
    Csv(#[from] csv::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration")]
    Config(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, QuizError>;

// ============= Python Binding =============

#[cfg(feature = "python")]
impl From<QuizError> for pyo3::PyErr {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InvalidName(_) | QuizError::UnknownLevel(_) | QuizError::InvalidConfig(_) => {
                pyo3::exceptions::PyValueError::new_err(err.to_string())
            }
            other => pyo3::exceptions::PyRuntimeError::new_err(other.to_string()),
        }
    }
}
