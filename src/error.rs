use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the operator-facing parts of paramsync.
///
/// Store failures have their own type, [`crate::store::StoreError`], because the
/// reconciler reports them per key instead of aborting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("No options to choose from")]
    EmptyOptionSet,

    #[error("No AWS profiles found. Please configure at least one profile.")]
    NoProfilesFound,

    #[error("Environment file not found at {}", .0.display())]
    EnvFileMissing(PathBuf),

    #[error("Input closed before a valid answer was given")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
