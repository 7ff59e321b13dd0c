//! Reconciliation of a local env file against the parameter store.
//!
//! For each entry: fetch the remote value, then create it if missing, skip it if
//! equal, or ask the operator before overwriting a different value. Every
//! successful write is followed by a tag call. A failure on one key is reported
//! and the run continues with the next key.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use paramsync_core::env_file::{self, EnvEntry, EnvFile};
use paramsync_core::models::{ParameterPath, ParameterType, PutParameter, TagSet};

use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::store::{ParameterStore, StoreError};

/// Fixed settings for one run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub project: String,
    pub environment: String,
    pub parameter_type: ParameterType,
    pub description: Option<String>,
    /// Applied to every written parameter.
    pub tags: TagSet,
}

impl SyncOptions {
    pub fn path_for(&self, key: &str) -> ParameterPath {
        ParameterPath::new(&self.project, &self.environment, key)
    }
}

/// What to do with one entry, given its remote value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    Unchanged,
    /// The remote value differs; overwriting needs the operator's consent.
    Conflict { current: String },
}

pub fn plan(existing: Option<String>, local: &str) -> Plan {
    match existing {
        None => Plan::Create,
        Some(current) if current == local => Plan::Unchanged,
        Some(current) => Plan::Conflict { current },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    /// The operator declined to overwrite a different remote value.
    Declined,
    /// The value was written but tagging failed.
    Untagged(String),
    /// Nothing was written.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub path: ParameterPath,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<KeyOutcome>,
}

impl SyncReport {
    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged))
    }

    pub fn declined(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Declined))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_) | Outcome::Untagged(_)))
    }

    pub fn outcome_of(&self, key: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.path.key == key)
            .map(|o| &o.outcome)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} declined, {} failed",
            self.created(),
            self.updated(),
            self.unchanged(),
            self.declined(),
            self.failed()
        )
    }
}

/// Read `env_path` and reconcile every entry in it.
///
/// A missing file is reported as [`Error::EnvFileMissing`] before any store call.
pub async fn reconcile_file<S, R, W>(
    store: &S,
    prompter: &mut Prompter<R, W>,
    options: &SyncOptions,
    env_path: &Path,
) -> Result<SyncReport>
where
    S: ParameterStore,
    R: BufRead,
    W: Write,
{
    tracing::info!(
        "Creating parameters for project: {}, environment: {} from {}",
        options.project,
        options.environment,
        env_path.display()
    );

    let content = match fs::read_to_string(env_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::EnvFileMissing(env_path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let file = env_file::parse(&content);
    for key in &file.duplicates {
        tracing::warn!(
            "Key {} appears more than once in {}; using the last value",
            key,
            env_path.display()
        );
    }

    reconcile(store, prompter, options, &file).await
}

/// Reconcile already parsed entries. Only prompt I/O errors abort the run.
pub async fn reconcile<S, R, W>(
    store: &S,
    prompter: &mut Prompter<R, W>,
    options: &SyncOptions,
    file: &EnvFile,
) -> Result<SyncReport>
where
    S: ParameterStore,
    R: BufRead,
    W: Write,
{
    let mut report = SyncReport::default();
    for entry in &file.entries {
        let path = options.path_for(&entry.key);
        let outcome = reconcile_entry(store, prompter, options, &path, entry).await?;
        report.outcomes.push(KeyOutcome { path, outcome });
    }
    tracing::info!("Sync finished: {}", report);
    Ok(report)
}

async fn reconcile_entry<S, R, W>(
    store: &S,
    prompter: &mut Prompter<R, W>,
    options: &SyncOptions,
    path: &ParameterPath,
    entry: &EnvEntry,
) -> Result<Outcome>
where
    S: ParameterStore,
    R: BufRead,
    W: Write,
{
    let existing = match store.get(path).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::error!("Error reading parameter {}: {}", path, e);
            prompter.say(format!("Error reading parameter {}: {}. Skipping.", path, e))?;
            return Ok(Outcome::Failed(e.to_string()));
        }
    };

    let overwrite = match plan(existing, &entry.value) {
        Plan::Create => false,
        Plan::Unchanged => {
            prompter.say(format!(
                "Parameter {} already exists with the same value. Skipping update.",
                path
            ))?;
            tracing::info!(
                "Skipped updating parameter {} as the value is identical.",
                path
            );
            return Ok(Outcome::Unchanged);
        }
        Plan::Conflict { current } => {
            prompter.say(format!("\nParameter {} already exists.", path))?;
            prompter.say(format!("Current Value: {}", current))?;
            prompter.say(format!("New Value: {}", entry.value))?;

            if !prompter.confirm("Do you want to update it?")? {
                prompter.say(format!(
                    "Parameter {} was not updated as per your choice.",
                    path
                ))?;
                tracing::info!("User chose not to update parameter {}.", path);
                return Ok(Outcome::Declined);
            }
            true
        }
    };

    match write(store, options, path, &entry.value, overwrite).await {
        Ok(()) => {
            let verb = if overwrite { "updated" } else { "created" };
            prompter.say(format!("Parameter {} {} successfully.", path, verb))?;
            Ok(if overwrite {
                Outcome::Updated
            } else {
                Outcome::Created
            })
        }
        Err(WriteFailure::Put(e)) => {
            tracing::error!("Error creating/updating parameter {}: {}", path, e);
            prompter.say(format!("Error creating/updating parameter {}: {}", path, e))?;
            Ok(Outcome::Failed(e.to_string()))
        }
        Err(WriteFailure::Tag(e)) => {
            tracing::error!("Error adding tags to parameter {}: {}", path, e);
            prompter.say(format!("Error adding tags to parameter {}: {}", path, e))?;
            Ok(Outcome::Untagged(e.to_string()))
        }
    }
}

enum WriteFailure {
    Put(StoreError),
    Tag(StoreError),
}

async fn write<S: ParameterStore>(
    store: &S,
    options: &SyncOptions,
    path: &ParameterPath,
    value: &str,
    overwrite: bool,
) -> Result<(), WriteFailure> {
    let request = PutParameter {
        path: path.clone(),
        value: value.to_string(),
        parameter_type: options.parameter_type.clone(),
        description: options.description.clone(),
        overwrite,
    };
    store.put(&request).await.map_err(WriteFailure::Put)?;
    tracing::info!("Parameter {} created/updated successfully.", path);

    store
        .tag(path, &options.tags)
        .await
        .map_err(WriteFailure::Tag)?;
    tracing::info!("Tags added/updated for {}", path);
    Ok(())
}
