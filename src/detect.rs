//! Detect phase
//!
//! Passes when the app declares a conda environment, either through an
//! `environment.yml` or an exported `package-list.txt`.

use crate::conda::probe;
use crate::constants::{
    CONDA_ENV_PLAN_ENTRY, CONDA_PLAN_ENTRY, ENVIRONMENT_FILE_NAME, LOCKFILE_NAME,
};
use crate::context::DetectContext;
use crate::error::CondaEnvResult;
use crate::plan::{BuildPlan, BuildPlanProvision, BuildPlanRequirement};
use tracing::debug;

/// Result of the detect phase
#[derive(Debug, Clone, PartialEq)]
pub enum DetectOutcome {
    /// The buildpack applies and contributes this plan
    Pass(BuildPlan),
    /// The buildpack does not apply to this app
    Fail,
}

/// Run detection against the app directory
pub fn detect(context: &DetectContext) -> CondaEnvResult<DetectOutcome> {
    let has_environment_file = probe::exists(&context.working_dir.join(ENVIRONMENT_FILE_NAME))?;
    let has_lockfile = probe::exists(&context.working_dir.join(LOCKFILE_NAME))?;

    if !has_environment_file && !has_lockfile {
        debug!(
            "Neither {} nor {} found in {}",
            ENVIRONMENT_FILE_NAME,
            LOCKFILE_NAME,
            context.working_dir.display()
        );
        return Ok(DetectOutcome::Fail);
    }

    Ok(DetectOutcome::Pass(plan()))
}

/// Provides the conda environment, requires conda itself at build time
fn plan() -> BuildPlan {
    let mut metadata = toml::Table::new();
    metadata.insert("build".to_string(), toml::Value::Boolean(true));

    BuildPlan {
        provides: vec![BuildPlanProvision {
            name: CONDA_ENV_PLAN_ENTRY.to_string(),
        }],
        requires: vec![BuildPlanRequirement {
            name: CONDA_PLAN_ENTRY.to_string(),
            metadata,
        }],
    }
}
