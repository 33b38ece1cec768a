//! Filesystem existence checks

use crate::error::{CondaEnvError, CondaEnvResult};
use std::path::Path;

/// Whether `path` exists.
///
/// A missing entry is `Ok(false)`; any other stat failure (e.g. permission
/// denied on a parent directory) is an error.
pub fn exists(path: &Path) -> CondaEnvResult<bool> {
    path.try_exists().map_err(|e| CondaEnvError::stat(path, e))
}
