use std::process::{Output, Stdio};

use paramsync_core::models::{ParameterPath, PutParameter, TagSet};
use serde::Deserialize;
use tokio::process::Command;

use super::{ParameterStore, StoreError};

/// Error code the AWS CLI prints when a parameter name is unknown.
const NOT_FOUND_CODE: &str = "ParameterNotFound";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParameterOutput {
    parameter: ParameterValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterValue {
    value: String,
}

/// SSM Parameter Store client backed by the `aws` executable.
///
/// The credential profile is explicit state on the client: it is passed to each
/// child process as `AWS_PROFILE` and never touches this process's environment.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    profile: Option<String>,
    region: Option<String>,
}

impl AwsCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            profile: None,
            region: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    async fn run(&self, args: &[String]) -> Result<Output, StoreError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref profile) = self.profile {
            command.env("AWS_PROFILE", profile);
        }

        tracing::debug!("Running {} {}", self.program, redact_args(args));
        command.output().await.map_err(|source| StoreError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    fn ssm_args(&self, operation: &str) -> Vec<String> {
        let mut args = vec!["ssm".to_string(), operation.to_string()];
        if let Some(ref region) = self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }

    pub fn get_args(&self, path: &ParameterPath) -> Vec<String> {
        let mut args = self.ssm_args("get-parameter");
        args.extend([
            "--name".to_string(),
            path.to_string(),
            "--with-decryption".to_string(),
        ]);
        args
    }

    /// Value and description use the `--flag=value` form so text starting with `-`
    /// is not read as another flag.
    pub fn put_args(&self, request: &PutParameter) -> Vec<String> {
        let mut args = self.ssm_args("put-parameter");
        args.extend([
            "--name".to_string(),
            request.path.to_string(),
            format!("--value={}", request.value),
            "--type".to_string(),
            request.parameter_type.as_str().to_string(),
        ]);
        if let Some(key_id) = request.parameter_type.kms_key_id() {
            args.push("--key-id".to_string());
            args.push(key_id.to_string());
        }
        if let Some(ref description) = request.description {
            args.push(format!("--description={}", description));
        }
        if request.overwrite {
            args.push("--overwrite".to_string());
        }
        args
    }

    /// Tags go over as a JSON list so commas and equals signs in values survive.
    pub fn tag_args(&self, path: &ParameterPath, tags: &TagSet) -> Result<Vec<String>, StoreError> {
        let mut args = self.ssm_args("add-tags-to-resource");
        args.extend([
            "--resource-type".to_string(),
            "Parameter".to_string(),
            "--resource-id".to_string(),
            path.to_string(),
            "--tags".to_string(),
            serde_json::to_string(tags)?,
        ]);
        Ok(args)
    }

    /// Profiles known to the local AWS configuration, in CLI order.
    pub async fn list_profiles(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .run(&["configure".to_string(), "list-profiles".to_string()])
            .await?;
        if !output.status.success() {
            return Err(StoreError::Command(failure_message(&output)));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Arguments joined for logging, with any parameter value masked.
pub fn redact_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.starts_with("--value=") {
                "--value=****"
            } else {
                arg.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

impl ParameterStore for AwsCli {
    async fn get(&self, path: &ParameterPath) -> Result<Option<String>, StoreError> {
        let output = self.run(&self.get_args(path)).await?;

        if !output.status.success() {
            let message = failure_message(&output);
            if message.contains(NOT_FOUND_CODE) {
                return Ok(None);
            }
            return Err(StoreError::Read {
                name: path.to_string(),
                message,
            });
        }

        let parsed: GetParameterOutput = serde_json::from_slice(&output.stdout)?;
        Ok(Some(parsed.parameter.value))
    }

    async fn put(&self, request: &PutParameter) -> Result<(), StoreError> {
        let output = self.run(&self.put_args(request)).await?;
        if !output.status.success() {
            return Err(StoreError::Write {
                name: request.path.to_string(),
                message: failure_message(&output),
            });
        }
        tracing::debug!(
            "put-parameter {}: {}",
            request.path,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    async fn tag(&self, path: &ParameterPath, tags: &TagSet) -> Result<(), StoreError> {
        let output = self.run(&self.tag_args(path, tags)?).await?;
        if !output.status.success() {
            return Err(StoreError::Write {
                name: path.to_string(),
                message: failure_message(&output),
            });
        }
        Ok(())
    }
}
