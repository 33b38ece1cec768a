//! CLI argument definitions using clap derive
//!
//! Every lifecycle input can come from a positional argument or from the
//! `CNB_*` variable the lifecycle exports.

use crate::error::{CondaEnvError, CondaEnvResult};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Conda environment buildpack
///
/// Installs an app's conda environment into a launch layer.
#[derive(Parser, Debug)]
#[command(name = "conda-env-update")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Lifecycle phase to run
    #[command(subcommand)]
    pub command: Commands,

    /// Buildpack root holding buildpack.toml (defaults to the parent of bin/)
    #[arg(long, global = true, env = "CNB_BUILDPACK_DIR")]
    pub buildpack_dir: Option<PathBuf>,

    /// Application directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub app_dir: Option<PathBuf>,

    /// Conda executable
    #[arg(long, global = true, env = "CONDA_EXE", default_value = "conda")]
    pub conda: PathBuf,

    /// Log verbosity
    #[arg(
        long,
        global = true,
        env = "BP_LOG_LEVEL",
        value_enum,
        ignore_case = true,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,
}

/// Lifecycle phases
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether this buildpack applies to the app
    Detect(DetectArgs),

    /// Install the conda environment into its layer
    Build(BuildArgs),
}

/// Arguments for the detect phase
#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    /// Platform directory
    #[arg(env = "CNB_PLATFORM_DIR")]
    pub platform_dir: PathBuf,

    /// Where to write the build plan
    #[arg(env = "CNB_BUILD_PLAN_PATH")]
    pub build_plan: PathBuf,
}

/// Arguments for the build phase
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Layers directory
    #[arg(env = "CNB_LAYERS_DIR")]
    pub layers_dir: PathBuf,

    /// Platform directory
    #[arg(env = "CNB_PLATFORM_DIR")]
    pub platform_dir: PathBuf,

    /// Buildpack plan handed over by the lifecycle
    #[arg(env = "CNB_BP_PLAN_PATH")]
    pub plan: PathBuf,
}

/// Accepted values of `BP_LOG_LEVEL`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Directive for the tracing subscriber
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Info => "conda_env_update=warn",
            Self::Debug => "conda_env_update=debug",
        }
    }
}

impl Cli {
    /// The application directory, falling back to the working directory
    pub fn app_dir(&self) -> CondaEnvResult<PathBuf> {
        match &self.app_dir {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir()
                .map_err(|e| CondaEnvError::io("getting current directory", e)),
        }
    }

    /// The buildpack root. Without an explicit value the executable is
    /// assumed to live in `<buildpack>/bin/`.
    pub fn buildpack_dir(&self) -> CondaEnvResult<PathBuf> {
        if let Some(path) = &self.buildpack_dir {
            return Ok(path.clone());
        }

        let exe = std::env::current_exe()
            .map_err(|e| CondaEnvError::io("locating the buildpack executable", e))?;
        exe.parent()
            .and_then(|bin| bin.parent())
            .map(|root| root.to_path_buf())
            .ok_or_else(|| {
                CondaEnvError::ConfigInvalid {
                    path: exe.clone(),
                    reason: "cannot derive the buildpack directory from the executable path"
                        .to_string(),
                }
            })
    }
}

/// Rewrite `argv` so that a binary invoked as `bin/detect` or `bin/build`
/// runs the matching subcommand.
pub fn lifecycle_args<I>(args: I) -> Vec<std::ffi::OsString>
where
    I: IntoIterator<Item = std::ffi::OsString>,
{
    let mut args: Vec<_> = args.into_iter().collect();
    let phase = args
        .first()
        .map(PathBuf::from)
        .and_then(|program| program.file_name().map(|name| name.to_os_string()));

    if let Some(phase) = phase {
        if phase == "detect" || phase == "build" {
            args.insert(1, phase);
        }
    }
    args
}
