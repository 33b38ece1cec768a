//! Conda environment materialization
//!
//! Decides whether the environment layer must be rebuilt and, if so, drives
//! `conda` to build it. The command shape depends on which inputs the app
//! ships, in this order of precedence:
//!
//! | Inputs present | Commands |
//! |----------------|----------|
//! | `vendor/` | `conda create --file package-list.txt ... --offline` |
//! | `package-list.txt` | `conda create --file package-list.txt ...`, `conda clean` |
//! | neither | `conda env update --file environment.yml ...`, `conda clean` |
//!
//! Vendored builds never touch the network, so they get no package cache
//! and no clean step, even when a lockfile sits next to `vendor/`.
//!
//! See <https://docs.conda.io/projects/conda/en/latest/commands/create.html>,
//! <https://docs.conda.io/projects/conda/en/latest/commands/env/update.html> and
//! <https://docs.conda.io/projects/conda/en/latest/commands/clean.html>.

use crate::checksum::Summer;
use crate::conda::exec::{Executable, Execution};
use crate::conda::probe;
use crate::constants::{CONDA_PKGS_DIRS, ENVIRONMENT_FILE_NAME, LOCKFILE_NAME, VENDOR_DIR_NAME};
use crate::emitter::Emitter;
use crate::error::{CondaEnvError, CondaEnvResult};
use crate::layer::LayerMetadata;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Outcome of the layer reuse check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseDecision {
    /// Whether the environment must be (re)built
    pub run: bool,
    /// Current SHA256 of `package-list.txt`, empty when there is none
    pub lockfile_sha: String,
}

/// Builds the conda environment layer
#[async_trait]
pub trait Runner: Send + Sync {
    /// Compare the app's lockfile against the metadata of the previous build
    fn should_run(
        &self,
        working_dir: &Path,
        metadata: &LayerMetadata,
    ) -> CondaEnvResult<ReuseDecision>;

    /// Install the environment into `env_layer`, using `cache_layer` as the
    /// package directory where applicable
    async fn execute(
        &self,
        env_layer: &Path,
        cache_layer: &Path,
        working_dir: &Path,
    ) -> CondaEnvResult<()>;
}

/// How the environment is installed for a given app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Offline install from the app's `vendor/` channel
    Vendored,
    /// Recreate the exact package list from `package-list.txt`
    Lockfile,
    /// Update from `environment.yml`
    Descriptor,
}

impl MaterializeMode {
    /// Pick the mode from the inputs present in the app directory
    pub fn select(vendor_dir_exists: bool, lockfile_exists: bool) -> Self {
        if vendor_dir_exists {
            Self::Vendored
        } else if lockfile_exists {
            Self::Lockfile
        } else {
            Self::Descriptor
        }
    }

    /// The conda invocations for this mode, in order
    pub fn executions(
        self,
        env_layer: &Path,
        cache_layer: &Path,
        working_dir: &Path,
    ) -> Vec<Execution> {
        let lockfile = path_arg(&working_dir.join(LOCKFILE_NAME));
        let prefix = path_arg(env_layer);
        let pkgs_dirs = path_arg(cache_layer);

        let create = [
            "create",
            "--file",
            lockfile.as_str(),
            "--prefix",
            prefix.as_str(),
            "--yes",
            "--quiet",
        ];
        let clean = Execution::new(["clean", "--packages", "--tarballs"])
            .with_env(CONDA_PKGS_DIRS, pkgs_dirs.as_str());

        match self {
            Self::Vendored => {
                let vendor_dir = path_arg(&working_dir.join(VENDOR_DIR_NAME));
                let offline = [
                    "--channel",
                    vendor_dir.as_str(),
                    "--override-channels",
                    "--offline",
                ];
                vec![Execution::new(create.into_iter().chain(offline))]
            }
            Self::Lockfile => vec![
                Execution::new(create).with_env(CONDA_PKGS_DIRS, pkgs_dirs.as_str()),
                clean,
            ],
            Self::Descriptor => {
                let descriptor = path_arg(&working_dir.join(ENVIRONMENT_FILE_NAME));
                vec![
                    Execution::new([
                        "env",
                        "update",
                        "--prefix",
                        prefix.as_str(),
                        "--file",
                        descriptor.as_str(),
                    ])
                    .with_env(CONDA_PKGS_DIRS, pkgs_dirs.as_str()),
                    clean,
                ]
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Runs the real conda workflow through an [`Executable`]
pub struct CondaRunner {
    executable: Arc<dyn Executable>,
    summer: Arc<dyn Summer>,
    logger: Emitter,
}

impl CondaRunner {
    pub fn new(executable: Arc<dyn Executable>, summer: Arc<dyn Summer>, logger: Emitter) -> Self {
        Self {
            executable,
            summer,
            logger,
        }
    }

    /// Run one invocation, turning a failed exit into an error that carries
    /// the captured output
    async fn run(&self, execution: &Execution) -> CondaEnvResult<()> {
        self.logger.subprocess(format!("Running {}", execution));

        let output = self.executable.execute(execution).await?;
        if output.success() {
            return Ok(());
        }

        self.logger.action(format!("Failed to run {}", execution));
        self.logger.detail(output.lines.join("\n"));
        Err(CondaEnvError::conda_command(
            output.failure_reason(),
            output.tail(),
        ))
    }
}

#[async_trait]
impl Runner for CondaRunner {
    fn should_run(
        &self,
        working_dir: &Path,
        metadata: &LayerMetadata,
    ) -> CondaEnvResult<ReuseDecision> {
        let lockfile = working_dir.join(LOCKFILE_NAME);
        if !probe::exists(&lockfile)? {
            debug!("No {} found, environment will be rebuilt", LOCKFILE_NAME);
            return Ok(ReuseDecision {
                run: true,
                lockfile_sha: String::new(),
            });
        }

        let sha = self.summer.sum(&[lockfile.as_path()])?;
        let run = sha != metadata.lockfile_sha();
        debug!(
            "Lockfile sha {} (previous: {:?}), run: {}",
            sha, metadata.lockfile_sha, run
        );

        Ok(ReuseDecision {
            run,
            lockfile_sha: sha,
        })
    }

    async fn execute(
        &self,
        env_layer: &Path,
        cache_layer: &Path,
        working_dir: &Path,
    ) -> CondaEnvResult<()> {
        let vendor_dir_exists = probe::exists(&working_dir.join(VENDOR_DIR_NAME))?;
        let lockfile_exists = probe::exists(&working_dir.join(LOCKFILE_NAME))?;
        let mode = MaterializeMode::select(vendor_dir_exists, lockfile_exists);
        debug!("Installing conda environment in {:?} mode", mode);

        for execution in mode.executions(env_layer, cache_layer, working_dir) {
            self.run(&execution).await?;
        }

        remove_history(env_layer).await
    }
}

/// Remove the changelog conda writes into `conda-meta/` on every install.
/// It would otherwise leak build-host details into the image.
async fn remove_history(env_layer: &Path) -> CondaEnvResult<()> {
    let history = env_layer.join("conda-meta").join("history");
    match fs::remove_file(&history).await {
        Ok(()) => {
            debug!("Removed {}", history.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CondaEnvError::io(
            format!("removing conda history {}", history.display()),
            e,
        )),
    }
}
