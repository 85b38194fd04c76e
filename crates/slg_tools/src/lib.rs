//! # Alliance SLG Development Tools
//!
//! Command-line helpers for working on game data:
//! - Data validators (balance, map, characters)
//! - Path probe between two map cities
//! - Cost ladders for draws, buildings and character levels
//! - Repository snapshot inspector

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use slg_core::error::GameError;
use thiserror::Error;

pub mod costs;
pub mod inspect;
pub mod probe;
pub mod validate;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Failure reported by the game core.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A required data file is absent.
    #[error("No {stem}.ron or {stem}.json in {}", dir.display())]
    MissingFile {
        /// Directory searched.
        dir: PathBuf,
        /// File name without extension.
        stem: String,
    },

    /// Data loaded but cross-file checks failed.
    #[error("{} problem(s):\n{}", .0.len(), .0.join("\n"))]
    Inconsistent(Vec<String>),

    /// No such player in the snapshot.
    #[error("Player {0} not found in snapshot")]
    UnknownPlayer(String),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;
