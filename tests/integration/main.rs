//! Integration tests for conda-env-update

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn conda_env_update() -> Command {
        let mut cmd = cargo_bin_cmd!("conda-env-update");
        cmd.env_remove("BP_LOG_LEVEL").env_remove("CONDA_EXE");
        cmd
    }

    #[test]
    fn help_displays() {
        conda_env_update()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Conda environment buildpack"));
    }

    #[test]
    fn version_displays() {
        conda_env_update()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("conda-env-update"));
    }

    #[test]
    fn detect_passes_with_environment_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("environment.yml"), "name: app\n").unwrap();
        let plan = dir.path().join("plan.toml");

        conda_env_update()
            .arg("--app-dir")
            .arg(dir.path())
            .arg("detect")
            .arg(dir.path().join("platform"))
            .arg(&plan)
            .assert()
            .success();

        let written = std::fs::read_to_string(&plan).unwrap();
        assert!(written.contains("conda-environment"));
        assert!(written.contains("build = true"));
    }

    #[test]
    fn detect_reads_lifecycle_environment() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package-list.txt"), "").unwrap();
        let plan = dir.path().join("plan.toml");

        conda_env_update()
            .current_dir(dir.path())
            .env("CNB_PLATFORM_DIR", dir.path().join("platform"))
            .env("CNB_BUILD_PLAN_PATH", &plan)
            .arg("detect")
            .assert()
            .success();

        assert!(plan.is_file());
    }

    #[test]
    fn detect_fails_with_code_100() {
        let dir = TempDir::new().unwrap();
        let plan = dir.path().join("plan.toml");

        conda_env_update()
            .arg("--app-dir")
            .arg(dir.path())
            .arg("detect")
            .arg(dir.path().join("platform"))
            .arg(&plan)
            .assert()
            .code(100);

        assert!(!plan.exists());
    }

    #[test]
    fn build_without_descriptor_errors() {
        let dir = TempDir::new().unwrap();
        let layers = dir.path().join("layers");
        let plan = dir.path().join("plan.toml");
        std::fs::write(&plan, "").unwrap();

        conda_env_update()
            .arg("--app-dir")
            .arg(dir.path())
            .arg("--buildpack-dir")
            .arg(dir.path().join("missing"))
            .arg("build")
            .arg(&layers)
            .arg(dir.path().join("platform"))
            .arg(&plan)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("reading buildpack descriptor"));
    }
}

#[cfg(unix)]
mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Lifecycle {
        dir: TempDir,
    }

    impl Lifecycle {
        fn new(exit_code: i32) -> Self {
            let dir = TempDir::new().unwrap();
            for sub in ["app", "buildpack", "layers", "platform"] {
                std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            }

            std::fs::write(
                dir.path().join("buildpack/buildpack.toml"),
                r#"api = "0.8"

[buildpack]
id = "paketo-community/conda-env-update"
name = "Conda Env Update Buildpack"
version = "1.2.3"
"#,
            )
            .unwrap();

            std::fs::write(
                dir.path().join("plan.toml"),
                r#"[[entries]]
name = "conda-environment"

[entries.metadata]
launch = true
"#,
            )
            .unwrap();

            // Records its arguments, writes conda-meta/history into --prefix
            // and drops a package into CONDA_PKGS_DIRS
            let script = format!(
                r#"#!/bin/sh
echo "$@" >> "{calls}"
prefix=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--prefix" ]; then prefix="$2"; fi
  shift
done
if [ -n "$prefix" ]; then
  mkdir -p "$prefix/conda-meta"
  echo "==> create <==" > "$prefix/conda-meta/history"
fi
if [ -n "$CONDA_PKGS_DIRS" ]; then
  mkdir -p "$CONDA_PKGS_DIRS"
  touch "$CONDA_PKGS_DIRS/urls.txt"
fi
echo "conda output line"
exit {exit_code}
"#,
                calls = dir.path().join("calls.log").display(),
                exit_code = exit_code,
            );
            let conda = dir.path().join("conda");
            std::fs::write(&conda, script).unwrap();
            std::fs::set_permissions(&conda, std::fs::Permissions::from_mode(0o755)).unwrap();

            Self { dir }
        }

        fn path(&self, sub: &str) -> PathBuf {
            self.dir.path().join(sub)
        }

        fn write_app_file(&self, name: &str, content: &str) {
            std::fs::write(self.path("app").join(name), content).unwrap();
        }

        fn calls(&self) -> Vec<String> {
            std::fs::read_to_string(self.path("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn build(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("conda-env-update");
            cmd.env_remove("BP_LOG_LEVEL")
                .env("CONDA_EXE", self.path("conda"))
                .env("CNB_BUILDPACK_DIR", self.path("buildpack"))
                .current_dir(self.path("app"))
                .arg("build")
                .arg(self.path("layers"))
                .arg(self.path("platform"))
                .arg(self.path("plan.toml"));
            cmd
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn lockfile_build_then_reuse() {
        let lifecycle = Lifecycle::new(0);
        lifecycle.write_app_file(
            "package-list.txt",
            "https://conda.anaconda.org/conda-forge/linux-64/numpy-1.26.4.conda\n",
        );

        lifecycle
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Conda Env Update Buildpack 1.2.3"))
            .stdout(predicate::str::contains("  Executing build process"))
            .stdout(predicate::str::contains("    Running CONDA_PKGS_DIRS="))
            .stdout(predicate::str::contains("      Completed in"));

        let calls = lifecycle.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("create --file"));
        assert!(calls[1].starts_with("clean --packages --tarballs"));

        let env_toml = read(&lifecycle.path("layers/conda-env.toml"));
        assert!(env_toml.contains("launch = true"));
        assert!(env_toml.contains("lockfile-sha"));
        assert!(lifecycle.path("layers/conda-env-cache.toml").is_file());
        assert!(!lifecycle
            .path("layers/conda-env/conda-meta/history")
            .exists());

        lifecycle
            .build()
            .assert()
            .success()
            .stdout(predicate::str::contains("  Reusing cached layer"));

        assert_eq!(lifecycle.calls().len(), 2);
        assert_eq!(read(&lifecycle.path("layers/conda-env.toml")), env_toml);
    }

    #[test]
    fn invoked_as_bin_build() {
        let lifecycle = Lifecycle::new(0);
        lifecycle.write_app_file("environment.yml", "name: app\n");

        let bin_dir = lifecycle.path("buildpack/bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let build = bin_dir.join("build");
        std::fs::copy(assert_cmd::cargo_bin!("conda-env-update"), &build).unwrap();

        Command::new(&build)
            .env_remove("BP_LOG_LEVEL")
            .env_remove("CNB_BUILDPACK_DIR")
            .env("CONDA_EXE", lifecycle.path("conda"))
            .current_dir(lifecycle.path("app"))
            .arg(lifecycle.path("layers"))
            .arg(lifecycle.path("platform"))
            .arg(lifecycle.path("plan.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Conda Env Update Buildpack 1.2.3"));

        let calls = lifecycle.calls();
        assert!(calls[0].starts_with("env update --prefix"));
    }

    #[test]
    fn failing_conda_reports_output() {
        let lifecycle = Lifecycle::new(1);
        lifecycle.write_app_file("environment.yml", "name: app\n");

        lifecycle
            .build()
            .assert()
            .code(1)
            .stdout(predicate::str::contains("      Failed to run"))
            .stdout(predicate::str::contains("        conda output line"))
            .stderr(predicate::str::contains("failed to run conda command"));

        assert!(!lifecycle.path("layers/conda-env.toml").exists());
    }
}
