//! Deterministic stand-ins for the build's collaborators

use crate::checksum::Summer;
use crate::clock::Clock;
use crate::conda::exec::{Executable, Execution, ExecutionOutput};
use crate::conda::runner::{ReuseDecision, Runner};
use crate::constants::CONDA_PKGS_DIRS;
use crate::error::{CondaEnvError, CondaEnvResult};
use crate::layer::LayerMetadata;
use crate::plan::BuildpackPlanEntry;
use crate::planner::Planner;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Records invocations and succeeds unless told otherwise
#[derive(Debug, Default)]
pub struct FakeExecutable {
    calls: Mutex<Vec<Execution>>,
    failure: Option<(usize, ExecutionOutput)>,
    write_history: bool,
    fill_cache: bool,
}

impl FakeExecutable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `index`-th call (0-based) exit with `code` and `lines` of output
    pub fn failing_on(mut self, index: usize, code: i32, lines: &[&str]) -> Self {
        let output = ExecutionOutput {
            code: Some(code),
            lines: lines.iter().map(|line| line.to_string()).collect(),
        };
        self.failure = Some((index, output));
        self
    }

    /// Write `conda-meta/history` into the `--prefix` directory, like conda does
    pub fn with_history(mut self) -> Self {
        self.write_history = true;
        self
    }

    /// Download a package archive into `CONDA_PKGS_DIRS` when it is set
    pub fn with_cache_fill(mut self) -> Self {
        self.fill_cache = true;
        self
    }

    pub fn calls(&self) -> Vec<Execution> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executable for FakeExecutable {
    async fn execute(&self, execution: &Execution) -> CondaEnvResult<ExecutionOutput> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(execution.clone());
            calls.len() - 1
        };

        if let Some((at, output)) = &self.failure {
            if *at == index {
                return Ok(output.clone());
            }
        }

        if self.write_history {
            let prefix = execution
                .args
                .iter()
                .position(|arg| arg == "--prefix")
                .and_then(|i| execution.args.get(i + 1));
            if let Some(prefix) = prefix {
                let conda_meta = Path::new(prefix).join("conda-meta");
                std::fs::create_dir_all(&conda_meta).unwrap();
                std::fs::write(conda_meta.join("history"), "==> create <==").unwrap();
            }
        }

        if self.fill_cache {
            if let Some(pkgs_dirs) = execution.env_var(CONDA_PKGS_DIRS) {
                std::fs::create_dir_all(pkgs_dirs).unwrap();
                std::fs::write(Path::new(pkgs_dirs).join("urls.txt"), "").unwrap();
            }
        }

        Ok(ExecutionOutput {
            code: Some(0),
            lines: vec![],
        })
    }
}

/// Returns a fixed digest, or a fixed failure
#[derive(Debug)]
pub struct FakeSummer {
    result: Result<String, String>,
}

impl FakeSummer {
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

impl Summer for FakeSummer {
    fn sum(&self, _paths: &[&Path]) -> CondaEnvResult<String> {
        self.result.clone().map_err(|message| {
            CondaEnvError::io("computing checksum", std::io::Error::other(message))
        })
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FakeClock(pub DateTime<Utc>);

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Arguments of the last `merge_layer_types` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerCall {
    pub name: String,
    pub entries: Vec<BuildpackPlanEntry>,
}

/// Returns fixed `(launch, build)` flags and records what it was asked
#[derive(Debug, Default)]
pub struct FakePlanner {
    pub launch: bool,
    pub build: bool,
    calls: Mutex<Vec<PlannerCall>>,
}

impl FakePlanner {
    pub fn new(launch: bool, build: bool) -> Self {
        Self {
            launch,
            build,
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<PlannerCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Planner for FakePlanner {
    fn merge_layer_types(&self, name: &str, entries: &[BuildpackPlanEntry]) -> (bool, bool) {
        self.calls.lock().unwrap().push(PlannerCall {
            name: name.to_string(),
            entries: entries.to_vec(),
        });
        (self.launch, self.build)
    }
}

/// Arguments of an `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCall {
    pub env_layer: PathBuf,
    pub cache_layer: PathBuf,
    pub working_dir: PathBuf,
}

type ExecuteStub = Box<dyn Fn(&ExecuteCall) -> CondaEnvResult<()> + Send + Sync>;

/// Scripted runner
pub struct FakeRunner {
    pub decision: ReuseDecision,
    execute_stub: Option<ExecuteStub>,
    should_run_calls: Mutex<Vec<(PathBuf, LayerMetadata)>>,
    execute_calls: Mutex<Vec<ExecuteCall>>,
}

impl FakeRunner {
    pub fn new(run: bool, lockfile_sha: &str) -> Self {
        Self {
            decision: ReuseDecision {
                run,
                lockfile_sha: lockfile_sha.to_string(),
            },
            execute_stub: None,
            should_run_calls: Mutex::default(),
            execute_calls: Mutex::default(),
        }
    }

    pub fn on_execute(
        mut self,
        stub: impl Fn(&ExecuteCall) -> CondaEnvResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.execute_stub = Some(Box::new(stub));
        self
    }

    pub fn should_run_calls(&self) -> Vec<(PathBuf, LayerMetadata)> {
        self.should_run_calls.lock().unwrap().clone()
    }

    pub fn execute_calls(&self) -> Vec<ExecuteCall> {
        self.execute_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Runner for FakeRunner {
    fn should_run(
        &self,
        working_dir: &Path,
        metadata: &LayerMetadata,
    ) -> CondaEnvResult<ReuseDecision> {
        self.should_run_calls
            .lock()
            .unwrap()
            .push((working_dir.to_path_buf(), metadata.clone()));
        Ok(self.decision.clone())
    }

    async fn execute(
        &self,
        env_layer: &Path,
        cache_layer: &Path,
        working_dir: &Path,
    ) -> CondaEnvResult<()> {
        let call = ExecuteCall {
            env_layer: env_layer.to_path_buf(),
            cache_layer: cache_layer.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
        };
        self.execute_calls.lock().unwrap().push(call.clone());
        match &self.execute_stub {
            Some(stub) => stub(&call),
            None => Ok(()),
        }
    }
}
