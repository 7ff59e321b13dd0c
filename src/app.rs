//! The interactive sync flow: optional project setup, profile/project/environment
//! selection, session logging, then reconciliation.

use std::io::{BufRead, Write};

use anyhow::Result;
use paramsync_core::models::{ParameterType, TagSet};

use crate::config::Config;
use crate::error::Error;
use crate::logging::{self, SessionSink};
use crate::prompt::Prompter;
use crate::reconcile::{self, SyncOptions};
use crate::scaffold;
use crate::store::AwsCli;

/// Offer to scaffold a new project. Name problems are reported, not returned.
pub fn offer_new_project<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    if !prompter.confirm("Do you want to add a new project?")? {
        return Ok(());
    }

    let name = prompter.ask_line("Enter the name of the new project: ")?;
    if name.is_empty() {
        prompter.say("Project name cannot be empty.")?;
        return Ok(());
    }
    if config.project_dir(&name).exists() {
        prompter.say(format!("Project '{}' already exists.", name))?;
        return Ok(());
    }

    prompter.say("Enter the environments to add (e.g., dev, stg, prod). Separate them by commas:")?;
    let environments = prompter.ask_line("")?;

    match scaffold::create_project(&config.environments_dir, &name, &environments) {
        Ok(created) => {
            prompter.say(format!("Project folder '{}' created successfully.", name))?;
            for env in &created.environments {
                prompter.say(format!(
                    "Environment folder '{}' created for project '{}'.",
                    env, name
                ))?;
            }
            prompter.say(format!("Project '{}' setup completed.", name))?;
        }
        Err(e @ (Error::InvalidInput(_) | Error::AlreadyExists(_))) => {
            tracing::warn!("Project creation rejected: {}", e);
            prompter.say(e)?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Choose one of `options`, or report `empty_message` and return `None` when
/// there is nothing to choose from.
pub fn select<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    options: &[String],
    prompt: &str,
    empty_message: &str,
) -> Result<Option<String>> {
    match prompter.choose(options, prompt) {
        Ok(choice) => Ok(Some(choice.clone())),
        Err(Error::EmptyOptionSet) => {
            prompter.say(empty_message)?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Pick a project, then one of its environments.
pub fn select_target<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<Option<(String, String)>> {
    let projects = scaffold::list_subfolders(&config.environments_dir)?;
    let Some(project) = select(
        prompter,
        &projects,
        "Available Projects:",
        &format!("No projects found in {}.", config.environments_dir.display()),
    )?
    else {
        return Ok(None);
    };

    let environments = scaffold::list_subfolders(&config.project_dir(&project))?;
    let Some(environment) = select(
        prompter,
        &environments,
        &format!("Available Environments for {}:", project),
        &format!("No environments found for project '{}'.", project),
    )?
    else {
        return Ok(None);
    };

    Ok(Some((project, environment)))
}

/// Tags derived from the selected project and environment. Extra tags never replace them.
pub const BASE_TAG_KEYS: [&str; 2] = ["Project", "Environment"];

pub fn sync_options(config: &Config, project: &str, environment: &str) -> SyncOptions {
    let mut tags = TagSet::for_environment(project, environment);
    for (key, value) in &config.tags {
        if BASE_TAG_KEYS.contains(&key.as_str()) {
            tracing::warn!("Ignoring extra tag {}={}: {} is set from the selection", key, value, key);
            continue;
        }
        tags.insert(key, value);
    }

    SyncOptions {
        project: project.to_string(),
        environment: environment.to_string(),
        parameter_type: ParameterType::from_flag(config.secure, config.kms_key_id.clone()),
        description: Some(config.description_for(project, environment)),
        tags,
    }
}

/// The full interactive run. Early exits (no profiles, nothing to select, no env
/// file) are reported to the operator and return `Ok`.
pub async fn run_sync<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
    sink: &SessionSink,
) -> Result<()> {
    offer_new_project(config, prompter)?;

    let cli = AwsCli::new(&config.aws_cli).with_region(config.region.clone());
    let profiles = cli.list_profiles().await?;
    if profiles.is_empty() {
        tracing::warn!("{}", Error::NoProfilesFound);
        prompter.say(Error::NoProfilesFound)?;
        return Ok(());
    }

    let profile = prompter.choose(&profiles, "Available AWS Profiles:")?.clone();
    let store = cli.with_profile(&profile);
    prompter.say(format!("AWS CLI profile set to: {}", profile))?;

    let Some((project, environment)) = select_target(config, prompter)? else {
        return Ok(());
    };

    let log_path = logging::init_logging(sink, &config.logs_dir, &profile, &project, &environment)?;
    prompter.say(format!("Logs will be stored in {}", log_path.display()))?;

    let options = sync_options(config, &project, &environment);
    let env_path = config.env_file_path(&project, &environment);

    match reconcile::reconcile_file(&store, prompter, &options, &env_path).await {
        Ok(report) => {
            prompter.say(format!("Sync complete: {}", report))?;
            Ok(())
        }
        Err(e @ Error::EnvFileMissing(_)) => {
            tracing::error!("{}", e);
            prompter.say(format!("{}. Please check the folder structure.", e))?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
