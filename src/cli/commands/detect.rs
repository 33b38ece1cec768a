//! Detect command - decide whether the app ships a conda environment

use crate::cli::DetectArgs;
use crate::context::DetectContext;
use crate::detect::{self, DetectOutcome};
use crate::error::CondaEnvResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Lifecycle exit code for "this buildpack does not apply"
pub const DETECT_FAIL_CODE: u8 = 100;

/// Execute the detect command
pub async fn execute(args: DetectArgs, app_dir: PathBuf) -> CondaEnvResult<ExitCode> {
    debug!("Platform dir: {}", args.platform_dir.display());

    let context = DetectContext {
        working_dir: app_dir,
    };

    match detect::detect(&context)? {
        DetectOutcome::Pass(plan) => {
            plan.write(&args.build_plan).await?;
            debug!("Wrote build plan to {}", args.build_plan.display());
            Ok(ExitCode::SUCCESS)
        }
        DetectOutcome::Fail => Ok(ExitCode::from(DETECT_FAIL_CODE)),
    }
}
