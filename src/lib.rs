//! conda-env-update - Conda environment buildpack
//!
//! Installs an app's conda environment into a launch layer during a Cloud
//! Native Buildpacks build, from `environment.yml`, an exported
//! `package-list.txt`, or a vendored channel.

pub mod build;
pub mod checksum;
pub mod cli;
pub mod clock;
pub mod conda;
pub mod config;
pub mod constants;
pub mod context;
pub mod detect;
pub mod emitter;
pub mod error;
pub mod layer;
pub mod plan;
pub mod planner;

#[cfg(test)]
mod testing;

pub use error::{CondaEnvError, CondaEnvResult};
