//! Text rendering of tool results.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{SdkError, SdkResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Serialize `value` as YAML or pretty-printed JSON.
    pub fn render<T: Serialize>(&self, value: &T) -> SdkResult<String> {
        match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(SdkError::from),
            Self::Json => serde_json::to_string_pretty(value).map_err(SdkError::from),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected yaml or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}
