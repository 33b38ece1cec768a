//! Build phase
//!
//! Installs the conda environment into the `conda-env` layer, reusing the
//! layer from the previous build when `package-list.txt` is unchanged, and
//! hands the package cache layer back to the lifecycle when it holds
//! anything worth keeping.

use crate::clock::{self, Clock};
use crate::conda::Runner;
use crate::constants::{CONDA_ENV_CACHE_LAYER, CONDA_ENV_LAYER, CONDA_ENV_PLAN_ENTRY};
use crate::context::BuildContext;
use crate::emitter::Emitter;
use crate::error::CondaEnvResult;
use crate::layer::{Layer, LayerMetadata};
use crate::planner::Planner;
use tracing::debug;

/// Layers produced by a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
}

/// Run the build phase.
///
/// Nothing is persisted here; the caller writes the returned layers. A
/// failed build therefore leaves the previous layer metadata in place.
pub async fn build(
    context: &BuildContext,
    planner: &dyn Planner,
    runner: &dyn Runner,
    clock: &dyn Clock,
    logger: &Emitter,
) -> CondaEnvResult<BuildResult> {
    logger.title(format!(
        "{} {}",
        context.buildpack_info.name, context.buildpack_info.version
    ));

    let mut env_layer = context.layers.get(CONDA_ENV_LAYER).await?;
    let mut cache_layer = context.layers.get(CONDA_ENV_CACHE_LAYER).await?;
    cache_layer.types.cache = true;

    let decision = runner.should_run(&context.working_dir, &env_layer.metadata)?;
    if decision.run {
        env_layer.reset().await?;
        env_layer.types.launch = true;

        logger.process("Executing build process");
        let start = clock.now();
        runner
            .execute(&env_layer.path, &cache_layer.path, &context.working_dir)
            .await?;
        let finished = clock.now();
        logger.action(format!(
            "Completed in {}",
            clock::format_duration(clock::elapsed(start, finished))
        ));
        logger.break_line();

        env_layer.metadata =
            LayerMetadata::built(decision.lockfile_sha, clock::format_timestamp(finished));
    } else {
        logger.process(format!(
            "Reusing cached layer {}",
            env_layer.path.display()
        ));
        logger.break_line();
    }

    let (launch, build) = planner.merge_layer_types(CONDA_ENV_PLAN_ENTRY, &context.plan.entries);
    env_layer.types.launch = launch;
    env_layer.types.build = build;
    env_layer.types.cache = build;
    debug!("Layer {} types: {:?}", env_layer.name, env_layer.types);

    let mut layers = vec![env_layer];
    if cache_layer.has_contents().await? {
        layers.push(cache_layer);
    } else {
        debug!("Omitting empty layer {}", cache_layer.name);
    }

    Ok(BuildResult { layers })
}
