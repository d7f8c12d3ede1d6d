//! # script-kit - template for single-run analysis programs
//!
//! Everything an analysis binary needs around its actual calculations:
//! - Folder layout resolution (`data/`, `fig/`, result file) with directories created on demand
//! - Figure saving under filesystem-safe names derived from the figure title
//! - Per-run logging to overwrite-mode summary and detail files
//! - Commit lookup for reproducibility notes in the log
//! - A small row-indexed table with CSV storage and elementary statistics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use script_kit::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let run_logger = RunLogger::start(&RunLoggerConfig::new("log"))?;
//!     let folders = FolderResolver::new(".", FolderLayout::default()).resolve()?;
//!
//!     let mut table = IndicatorTable::new("country", vec!["x".into(), "y".into()]);
//!     table.push_row("AUT", vec![Some(1.0), Some(2.0)])?;
//!     table.push_row("DEU", vec![Some(2.0), Some(3.0)])?;
//!
//!     let fig_dir = folders.fig().ok_or("no fig folder")?;
//!     let options = FigureOptions::default();
//!     let mut figures = FigurePersister::new(fig_dir, options, CollisionPolicy::Overwrite);
//!     figures.save(&CorrelationFigure::from_table("Pairwise correlations", &table)?)?;
//!
//!     write_table(&table, folders.result_file().ok_or("no result file")?)?;
//!     run_logger.stop()?;
//!     Ok(())
//! }
//! ```

pub mod charts;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use script_kit::prelude::*;
    //! ```

    pub use crate::charts::{CorrelationFigure, Figure, FigureOptions, RegressionFigure};
    pub use crate::error::{KitError, Result};
    pub use crate::models::{FolderLayout, FolderSpec, IndicatorTable, Observation};
    pub use crate::services::{
        read_table, write_table, CollisionPolicy, FigurePersister, FolderResolver,
    };
    pub use crate::utils::{
        current_commit, sanitize_base_name, sanitized_file_name, CorrelationMatrix, LinearFit,
        Logger, RunLogger, RunLoggerConfig, Timer, VersionInfoUnavailable,
    };
}

pub use error::{KitError, Result};
pub use utils::{Logger, RunLogger, Timer};
