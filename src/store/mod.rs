//! Parameter store access.
//!
//! [`ParameterStore`] is the seam between the reconciler and the remote store.
//! The production implementation is [`AwsCli`], which shells out to the AWS CLI;
//! specs use an in-memory fake.

mod aws_cli;

pub use aws_cli::{redact_args, AwsCli};

use paramsync_core::models::{ParameterPath, PutParameter, TagSet};
use thiserror::Error;

/// Parameter store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read parameter {name}: {message}")]
    Read { name: String, message: String },

    #[error("Failed to write parameter {name}: {message}")]
    Write { name: String, message: String },

    #[error("AWS CLI command failed: {0}")]
    Command(String),

    #[error("Unexpected output from AWS CLI: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A hierarchical key/value store.
///
/// Writing a value and tagging it are two separate calls. If `put` succeeds and
/// `tag` then fails, the parameter keeps its new value with whatever tags it had
/// before; callers report this and move on.
#[allow(async_fn_in_trait)]
pub trait ParameterStore {
    /// Current (decrypted) value, or `None` if the parameter does not exist.
    /// Any other failure is an error, never `None`.
    async fn get(&self, path: &ParameterPath) -> Result<Option<String>, StoreError>;

    /// Create or overwrite a parameter, per [`PutParameter::overwrite`].
    async fn put(&self, request: &PutParameter) -> Result<(), StoreError>;

    /// Add `tags` to the parameter, replacing values of keys already present.
    async fn tag(&self, path: &ParameterPath, tags: &TagSet) -> Result<(), StoreError>;
}
