use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitError {
    #[error("failed to create directory {path}: {source}")]
    FolderCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("figure file name {file_name} already used by \"{existing_title}\", refusing to overwrite with \"{title}\"")]
    FigureNameCollision {
        file_name: String,
        existing_title: String,
        title: String,
    },

    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("invalid folder layout: {0}")]
    InvalidLayout(String),

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KitError>;
