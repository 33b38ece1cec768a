//! Names shared between the detect and build phases

/// Layer into which the conda environment is installed.
pub const CONDA_ENV_LAYER: &str = "conda-env";

/// Layer used as the conda package directory.
pub const CONDA_ENV_CACHE_LAYER: &str = "conda-env-cache";

/// Build plan entry this buildpack provides.
pub const CONDA_ENV_PLAN_ENTRY: &str = "conda-environment";

/// Build plan entry for the conda distribution this buildpack requires.
pub const CONDA_PLAN_ENTRY: &str = "conda";

/// Exported package list (`conda list --explicit`) used to recreate the environment.
pub const LOCKFILE_NAME: &str = "package-list.txt";

/// Conda environment descriptor.
pub const ENVIRONMENT_FILE_NAME: &str = "environment.yml";

/// Directory holding an offline channel of pre-fetched packages.
pub const VENDOR_DIR_NAME: &str = "vendor";

/// Environment variable pointing conda at its package directory.
pub const CONDA_PKGS_DIRS: &str = "CONDA_PKGS_DIRS";
