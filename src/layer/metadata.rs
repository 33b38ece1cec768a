//! Typed layer content metadata
//!
//! The lifecycle stores layer metadata as an untyped TOML table. This
//! buildpack only ever reads and writes two keys, so they are modeled as a
//! struct and converted at the persistence boundary.

use serde::{Deserialize, Serialize};

/// Metadata stored in the `[metadata]` table of `conda-env.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// SHA256 of `package-list.txt` when the layer was built (empty if absent)
    #[serde(
        rename = "lockfile-sha",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lockfile_sha: Option<String>,

    /// RFC3339 build timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<String>,
}

impl LayerMetadata {
    /// Metadata for a freshly built environment
    pub fn built(lockfile_sha: impl Into<String>, built_at: impl Into<String>) -> Self {
        Self {
            lockfile_sha: Some(lockfile_sha.into()),
            built_at: Some(built_at.into()),
        }
    }

    /// Stored lockfile checksum, empty when none was recorded
    pub fn lockfile_sha(&self) -> &str {
        self.lockfile_sha.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.lockfile_sha.is_none() && self.built_at.is_none()
    }
}
