//! Conda integration
//!
//! - `probe`: existence checks on the app's inputs
//! - `exec`: running the `conda` binary
//! - `runner`: the reuse decision and the install workflow

pub mod exec;
pub mod probe;
pub mod runner;

pub use exec::{CondaExecutable, Executable, Execution, ExecutionOutput};
pub use runner::{CondaRunner, MaterializeMode, ReuseDecision, Runner};
