use script_kit::KitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Kit(#[from] KitError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response for {indicator}: {message}")]
    ApiResponse { indicator: String, message: String },

    #[error("config error: {0}")]
    Config(String),
}

/// Anything that ends a run. Logged once at the top level, then the process exits non-zero.
#[derive(Debug, Error)]
#[error("run failed: {0}")]
pub struct FatalRunError(#[from] pub StudyError);
