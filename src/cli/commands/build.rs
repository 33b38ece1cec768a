//! Build command - wire the production collaborators and persist the result

use crate::build::{self, BuildResult};
use crate::checksum::ChecksumCalculator;
use crate::cli::BuildArgs;
use crate::clock::SystemClock;
use crate::conda::{CondaExecutable, CondaRunner};
use crate::config::BuildpackInfo;
use crate::constants::{CONDA_ENV_CACHE_LAYER, CONDA_ENV_LAYER};
use crate::context::BuildContext;
use crate::emitter::Emitter;
use crate::error::CondaEnvResult;
use crate::layer::Layers;
use crate::plan::BuildpackPlan;
use crate::planner::PlanMerger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(
    args: BuildArgs,
    app_dir: PathBuf,
    buildpack_dir: &Path,
    conda: &Path,
) -> CondaEnvResult<()> {
    debug!("Platform dir: {}", args.platform_dir.display());

    let buildpack_info = BuildpackInfo::load(buildpack_dir).await?;
    let plan = BuildpackPlan::load(&args.plan).await?;
    let layers = Layers::new(&args.layers_dir);

    let context = BuildContext {
        working_dir: app_dir,
        layers: layers.clone(),
        plan,
        buildpack_info,
    };

    let logger = Emitter::stdout();
    let runner = CondaRunner::new(
        Arc::new(CondaExecutable::new(conda.as_os_str())),
        Arc::new(ChecksumCalculator::new()),
        logger.clone(),
    );

    let result = build::build(&context, &PlanMerger::new(), &runner, &SystemClock, &logger).await?;

    persist_result(&layers, &result).await
}

/// Write the TOML of every emitted layer and drop the TOML of any owned
/// layer the build left out, so a pruned layer does not survive from a
/// previous build.
async fn persist_result(layers: &Layers, result: &BuildResult) -> CondaEnvResult<()> {
    for layer in &result.layers {
        layers.persist(layer).await?;
    }

    for name in [CONDA_ENV_LAYER, CONDA_ENV_CACHE_LAYER] {
        if !result.layers.iter().any(|layer| layer.name == name) {
            layers.remove(name).await?;
        }
    }

    Ok(())
}
