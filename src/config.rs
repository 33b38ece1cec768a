//! Buildpack descriptor (`buildpack.toml`)
//!
//! Only the `[buildpack]` table is read; it names the buildpack in the
//! build log.

use crate::error::{CondaEnvError, CondaEnvResult};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Descriptor file name inside the buildpack directory
pub const DESCRIPTOR_FILE_NAME: &str = "buildpack.toml";

/// Identity of the running buildpack
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildpackInfo {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    buildpack: BuildpackInfo,
}

impl BuildpackInfo {
    /// Load from `<buildpack_dir>/buildpack.toml`
    pub async fn load(buildpack_dir: &Path) -> CondaEnvResult<Self> {
        let path = buildpack_dir.join(DESCRIPTOR_FILE_NAME);
        let content = fs::read_to_string(&path).await.map_err(|e| {
            CondaEnvError::io(format!("reading buildpack descriptor {}", path.display()), e)
        })?;

        let info = Self::parse(&content).map_err(|reason| CondaEnvError::ConfigInvalid {
            path: path.clone(),
            reason,
        })?;
        debug!("Loaded buildpack {} {}", info.id, info.version);
        Ok(info)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str::<Descriptor>(content)
            .map(|descriptor| descriptor.buildpack)
            .map_err(|e| e.to_string())
    }
}
