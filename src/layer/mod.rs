//! Buildpack layers
//!
//! A layer is a directory under the lifecycle's layers dir plus a sibling
//! `<name>.toml` holding its types and content metadata:
//!
//! ```toml
//! [types]
//! launch = true
//! build = false
//! cache = false
//!
//! [metadata]
//! lockfile-sha = "..."
//! built_at = "..."
//! ```

pub mod metadata;

pub use metadata::LayerMetadata;

use crate::error::{CondaEnvError, CondaEnvResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// How the lifecycle treats a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    /// Available to subsequent buildpacks during the build
    pub build: bool,
    /// Exported into the application image
    pub launch: bool,
    /// Restored on the next build
    pub cache: bool,
}

/// A single layer and its in-memory state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    pub types: LayerTypes,
    pub metadata: LayerMetadata,
}

impl Layer {
    /// Empty the layer directory and clear its types and metadata.
    ///
    /// The persisted `<name>.toml` is left alone; it is rewritten only when
    /// the build succeeds.
    pub async fn reset(&mut self) -> CondaEnvResult<()> {
        if fs::try_exists(&self.path)
            .await
            .map_err(|e| CondaEnvError::stat(&self.path, e))?
        {
            fs::remove_dir_all(&self.path).await.map_err(|e| {
                CondaEnvError::io(format!("could not remove directory {}", self.path.display()), e)
            })?;
        }

        fs::create_dir_all(&self.path).await.map_err(|e| {
            CondaEnvError::io(format!("could not create directory {}", self.path.display()), e)
        })?;

        self.types = LayerTypes::default();
        self.metadata = LayerMetadata::default();
        debug!("Reset layer {}", self.name);
        Ok(())
    }

    /// Whether the layer directory exists and has at least one entry
    pub async fn has_contents(&self) -> CondaEnvResult<bool> {
        let mut entries = match fs::read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(CondaEnvError::io(
                    format!("reading layer directory {}", self.path.display()),
                    e,
                ))
            }
        };

        let first = entries.next_entry().await.map_err(|e| {
            CondaEnvError::io(format!("reading layer directory {}", self.path.display()), e)
        })?;
        Ok(first.is_some())
    }
}

/// On-disk form of `<name>.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default, skip_serializing_if = "LayerMetadata::is_empty")]
    metadata: LayerMetadata,
}

/// The buildpack's layers directory
#[derive(Debug, Clone)]
pub struct Layers {
    path: PathBuf,
}

impl Layers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.toml"))
    }

    /// Look up a layer, restoring types and metadata from a previous build.
    ///
    /// The layer directory is not created.
    pub async fn get(&self, name: &str) -> CondaEnvResult<Layer> {
        let file_path = self.file_path(name);
        let mut layer = Layer {
            name: name.to_string(),
            path: self.path.join(name),
            types: LayerTypes::default(),
            metadata: LayerMetadata::default(),
        };

        if !fs::try_exists(&file_path)
            .await
            .map_err(|e| CondaEnvError::stat(&file_path, e))?
        {
            debug!("No previous metadata for layer {}", name);
            return Ok(layer);
        }

        let content = fs::read_to_string(&file_path).await.map_err(|e| {
            CondaEnvError::io(format!("reading layer metadata {}", file_path.display()), e)
        })?;
        let file: LayerFile =
            toml::from_str(&content).map_err(|e| CondaEnvError::LayerInvalid {
                path: file_path.clone(),
                reason: e.to_string(),
            })?;

        layer.types = file.types;
        layer.metadata = file.metadata;
        debug!("Restored metadata for layer {}", name);
        Ok(layer)
    }

    /// Write `<name>.toml` for a layer the build is handing to the lifecycle
    pub async fn persist(&self, layer: &Layer) -> CondaEnvResult<()> {
        fs::create_dir_all(&self.path).await.map_err(|e| {
            CondaEnvError::io(format!("could not create directory {}", self.path.display()), e)
        })?;

        let file = LayerFile {
            types: layer.types,
            metadata: layer.metadata.clone(),
        };
        let content = toml::to_string(&file)?;
        let file_path = self.file_path(&layer.name);
        fs::write(&file_path, content).await.map_err(|e| {
            CondaEnvError::io(format!("writing layer metadata {}", file_path.display()), e)
        })?;

        debug!("Persisted layer {}", layer.name);
        Ok(())
    }

    /// Delete `<name>.toml` so the lifecycle drops a layer left over from a
    /// previous build. A missing file is not an error.
    pub async fn remove(&self, name: &str) -> CondaEnvResult<()> {
        let file_path = self.file_path(name);
        match fs::remove_file(&file_path).await {
            Ok(()) => {
                debug!("Removed metadata for layer {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CondaEnvError::io(
                format!("removing layer metadata {}", file_path.display()),
                e,
            )),
        }
    }
}
