use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified parameter name, rendered as `/{project}/{environment}/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterPath {
    pub project: String,
    pub environment: String,
    pub key: String,
}

impl ParameterPath {
    pub fn new(
        project: impl Into<String>,
        environment: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.project, self.environment, self.key)
    }
}

/// Storage type of a parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterType {
    /// Stored in plain text.
    String,
    /// Encrypted at rest. `None` lets the store pick its default key.
    SecureString { kms_key_id: Option<String> },
}

impl ParameterType {
    /// Build the type from the `secure` flag and an optional key id.
    pub fn from_flag(secure: bool, kms_key_id: Option<String>) -> Self {
        if secure {
            Self::SecureString { kms_key_id }
        } else {
            Self::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::SecureString { .. } => "SecureString",
        }
    }

    pub fn kms_key_id(&self) -> Option<&str> {
        match self {
            Self::String => None,
            Self::SecureString { kms_key_id } => kms_key_id.as_deref(),
        }
    }
}

/// Input for a single create or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParameter {
    pub path: ParameterPath,
    pub value: String,
    pub parameter_type: ParameterType,
    pub description: Option<String>,
    /// `false` creates only; the store rejects the call if the name is taken.
    pub overwrite: bool,
}
