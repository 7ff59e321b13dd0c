//! Project and environment folders on disk.
//!
//! Layout: `{base}/{project}/{environment}/.env`. Folders are only ever
//! created here, never removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// What [`create_project`] put on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScaffold {
    pub path: PathBuf,
    pub environments: Vec<String>,
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("{} name cannot be empty", kind)));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidInput(format!(
            "{} name '{}' is not a valid folder name",
            kind, name
        )));
    }
    Ok(())
}

/// Split an operator-supplied `dev, stg,prod` list. Entries are trimmed and
/// empty entries dropped.
pub fn parse_environment_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Create `{base}/{name}` plus one sub-folder per entry of the comma-separated
/// `environments` list.
///
/// Fails with [`Error::AlreadyExists`] if the project folder is already there, in
/// which case nothing on disk changes.
pub fn create_project(base: &Path, name: &str, environments: &str) -> Result<ProjectScaffold> {
    let name = name.trim();
    validate_name("Project", name)?;

    let environments = parse_environment_list(environments);
    for env in &environments {
        validate_name("Environment", env)?;
    }

    fs::create_dir_all(base)?;
    let path = base.join(name);
    match fs::create_dir(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(path));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("Project folder '{}' created at {}", name, path.display());

    for env in &environments {
        fs::create_dir_all(path.join(env))?;
        tracing::info!("Environment folder '{}' created for project '{}'", env, name);
    }

    tracing::info!(
        "New project '{}' with environments {:?} created",
        name,
        environments
    );

    Ok(ProjectScaffold { path, environments })
}

/// Create a single environment folder under an existing project. Idempotent.
pub fn create_environment(base: &Path, project: &str, environment: &str) -> Result<PathBuf> {
    let project = project.trim();
    validate_name("Project", project)?;
    let environment = environment.trim();
    validate_name("Environment", environment)?;

    let project_path = base.join(project);
    if !project_path.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Project '{}' does not exist under {}",
            project,
            base.display()
        )));
    }

    let path = project_path.join(environment);
    fs::create_dir_all(&path)?;
    tracing::info!(
        "Environment folder '{}' created for project '{}'",
        environment,
        project
    );
    Ok(path)
}

/// Names of the immediate sub-folders of `path`, sorted. A missing `path` has none.
pub fn list_subfolders(path: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
