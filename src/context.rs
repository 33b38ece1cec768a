//! Inputs handed to the detect and build phases

use crate::config::BuildpackInfo;
use crate::layer::Layers;
use crate::plan::BuildpackPlan;
use std::path::PathBuf;

/// Detect-phase inputs
#[derive(Debug, Clone)]
pub struct DetectContext {
    /// Application source directory
    pub working_dir: PathBuf,
}

/// Build-phase inputs
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Application source directory
    pub working_dir: PathBuf,
    /// This buildpack's layers directory
    pub layers: Layers,
    /// Entries other buildpacks required of this one
    pub plan: BuildpackPlan,
    pub buildpack_info: BuildpackInfo,
}
