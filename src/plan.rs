//! Build plan files exchanged with the lifecycle
//!
//! Detect writes a [`BuildPlan`] declaring what this buildpack provides and
//! requires. Build reads back the resolved [`BuildpackPlan`] entries that
//! other buildpacks asked of it.

use crate::error::{CondaEnvError, CondaEnvResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Capability offered by this buildpack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlanProvision {
    pub name: String,
}

/// Capability required from another buildpack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlanRequirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub metadata: toml::Table,
}

/// Detect-phase output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<BuildPlanProvision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<BuildPlanRequirement>,
}

impl BuildPlan {
    /// Write the plan to the path given by the lifecycle
    pub async fn write(&self, path: &Path) -> CondaEnvResult<()> {
        let content = toml::to_string(self)?;
        fs::write(path, content).await.map_err(|e| {
            CondaEnvError::io(format!("writing build plan {}", path.display()), e)
        })
    }
}

/// One resolved requirement handed to this buildpack at build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildpackPlanEntry {
    pub name: String,
    #[serde(default)]
    pub metadata: toml::Table,
}

impl BuildpackPlanEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: toml::Table::new(),
        }
    }

    /// Set a boolean metadata flag (e.g. `launch`, `build`)
    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.metadata
            .insert(key.to_string(), toml::Value::Boolean(value));
        self
    }

    /// Whether a metadata key is present and set to boolean `true`
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(toml::Value::Boolean(true)))
    }
}

/// Build-phase input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<BuildpackPlanEntry>,
}

impl BuildpackPlan {
    /// Read the plan the lifecycle resolved for this buildpack
    pub async fn load(path: &Path) -> CondaEnvResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            CondaEnvError::io(format!("reading buildpack plan {}", path.display()), e)
        })?;
        Self::parse(&content).map_err(|reason| CondaEnvError::PlanInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}
