#![cfg(unix)]
#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// Stand-in for `npx vite`. Fails with one write of resolver diagnostics for
/// every package listed in `needs` that has no `installed/<name>` directory, asks
/// for Tailwind while `tailwind.flag` exists without a config, and otherwise
/// prints its arguments and exits with the code in `exit_code` (default 0).
const FAKE_NPX: &str = r#"#!/bin/sh
echo "npx $*" >> npx.log
if [ -f tailwind.flag ] && [ ! -f tailwind.config.js ]; then
  echo "[postcss] Cannot find module 'tailwindcss'" >&2
  exit 1
fi
errs=""
if [ -f needs ]; then
  while read -r pkg; do
    if [ -n "$pkg" ] && [ ! -d "installed/$pkg" ]; then
      errs="${errs}X [ERROR] Could not resolve \"$pkg\"
"
    fi
  done < needs
fi
if [ -n "$errs" ]; then
  printf '%s' "$errs" >&2
  exit 1
fi
shift
echo "ready $*"
if [ -f exit_code ]; then
  exit "$(cat exit_code)"
fi
exit 0
"#;

/// Stand-in for `npm`. Logs every call; `npm install <pkgs>` marks them
/// installed unless `npm_noop` exists; `npm_fails` makes every call fail.
const FAKE_NPM: &str = r#"#!/bin/sh
echo "$*" >> npm.log
if [ -f npm_fails ]; then
  echo "npm ERR! 404 Not Found" >&2
  exit 1
fi
[ "$1" = "install" ] || exit 0
shift
[ -f npm_noop ] && exit 0
for arg in "$@"; do
  case "$arg" in
    -*) ;;
    *) mkdir -p "installed/$arg" ;;
  esac
done
exit 0
"#;

struct Fixture {
    project: TempDir,
    bin: TempDir,
}

impl Fixture {
    /// An npm project (package-lock.json) with fake tools on PATH.
    fn npm() -> Self {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("package.json"), r#"{"name":"app"}"#).unwrap();
        std::fs::write(project.path().join("package-lock.json"), "{}").unwrap();

        let bin = TempDir::new().unwrap();
        write_script(&bin.path().join("npx"), FAKE_NPX);
        write_script(&bin.path().join("npm"), FAKE_NPM);
        Self { project, bin }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.project.path().join(rel)
    }

    fn touch(&self, rel: &str, contents: &str) {
        std::fs::write(self.path(rel), contents).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).unwrap_or_default()
    }

    fn retrofit(&self) -> Command {
        let path = format!(
            "{}:{}",
            self.bin.path().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::cargo_bin("retrofit").unwrap();
        cmd.current_dir(self.project.path())
            .env("RETROFIT_ROOT", self.project.path())
            .env("PATH", path)
            .env_remove("RETROFIT_DEBUG")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

// ---------------------------------------------------------------------------
// retrofit run
// ---------------------------------------------------------------------------

#[test]
fn run_clean_project_runs_once() {
    let fx = Fixture::npm();
    fx.retrofit()
        .args(["run", "dev", "--port", "3000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready dev --port 3000"));

    assert_eq!(fx.read("npx.log").lines().count(), 1);
    assert_eq!(fx.read("npm.log"), "");
}

#[test]
fn run_installs_missing_package_and_retries() {
    let fx = Fixture::npm();
    fx.touch("needs", "left-pad\n");

    fx.retrofit()
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("missing package(s): left-pad"))
        .stderr(predicate::str::contains("installing: npm install left-pad"));

    assert_eq!(fx.read("npm.log"), "install left-pad\n");
    assert_eq!(fx.read("npx.log").lines().count(), 2);
}

#[test]
fn run_installs_all_packages_from_one_failure_together() {
    let fx = Fixture::npm();
    fx.touch("needs", "zod\n@scope/pkg\n");

    fx.retrofit().arg("run").assert().success();

    assert_eq!(fx.read("npm.log"), "install @scope/pkg zod\n");
}

#[test]
fn run_dev_install_from_config() {
    let fx = Fixture::npm();
    fx.touch("needs", "left-pad\n");
    fx.touch("retrofit.yaml", "install:\n  dev: true\n");

    fx.retrofit().arg("run").assert().success();

    assert_eq!(fx.read("npm.log"), "install --save-dev left-pad\n");
}

#[test]
fn run_gives_up_after_five_attempts() {
    let fx = Fixture::npm();
    fx.touch("needs", "left-pad\n");
    fx.touch("npm_noop", "");

    fx.retrofit()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "still unresolved after 5 attempt(s): left-pad",
        ));

    assert_eq!(fx.read("npx.log").lines().count(), 5);
    assert_eq!(fx.read("npm.log").lines().count(), 4);
}

#[test]
fn run_stops_when_install_fails() {
    let fx = Fixture::npm();
    fx.touch("needs", "left-pad\n");
    fx.touch("npm_fails", "");

    fx.retrofit()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("npm ERR! 404 Not Found"))
        .stderr(predicate::str::contains(
            "'npm install left-pad' exited with code 1",
        ));

    assert_eq!(fx.read("npx.log").lines().count(), 1);
}

#[test]
fn run_propagates_wrapped_exit_code() {
    let fx = Fixture::npm();
    fx.touch("exit_code", "3");

    fx.retrofit()
        .arg("run")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error:").not());
}

#[test]
fn run_sets_up_tailwind_then_retries() {
    let fx = Fixture::npm();
    fx.touch("tailwind.flag", "");

    fx.retrofit()
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("setting up tailwind"))
        .stderr(predicate::str::contains("reinstalling: npm install"));

    assert!(fx.path("tailwind.config.js").exists());
    assert!(fx.read("package.json").contains("\"tailwindcss\""));
    assert_eq!(fx.read("npm.log"), "install\n");
}

#[test]
fn run_debug_logging_follows_rust_log() {
    let fx = Fixture::npm();
    fx.retrofit()
        .env("RUST_LOG", "debug")
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("spawning"));

    fx.retrofit()
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("spawning").not());
}

#[test]
fn run_missing_framework_binary_is_an_error() {
    let fx = Fixture::npm();
    std::fs::remove_file(fx.bin.path().join("npx")).unwrap();

    let mut cmd = fx.retrofit();
    // Only the fake bin dir, so the real npx cannot be found either.
    cmd.env("PATH", fx.bin.path());
    cmd.arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: failed to launch 'npx'"));
}

#[test]
fn run_rejects_invalid_config() {
    let fx = Fixture::npm();
    fx.touch("retrofit.yaml", "framework:\n  command: \"vite dev\"\n");

    fx.retrofit()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load retrofit.yaml"));
    assert_eq!(fx.read("npx.log"), "");
}

// ---------------------------------------------------------------------------
// retrofit detect
// ---------------------------------------------------------------------------

#[test]
fn detect_prints_project_summary() {
    let fx = Fixture::npm();
    fx.retrofit()
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("manager  npm"))
        .stdout(predicate::str::contains("exec     npx"))
        .stdout(predicate::str::contains("add      npm install"));
}

#[test]
fn detect_relative_root_is_reported_absolute() {
    let fx = Fixture::npm();
    let out = fx
        .retrofit()
        .env_remove("RETROFIT_ROOT")
        .args(["--root", ".", "detect", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let root = Path::new(v["root"].as_str().unwrap());
    assert!(root.is_absolute(), "{}", root.display());
    assert_eq!(root.file_name(), fx.project.path().file_name());
    assert_eq!(v["manager"], "npm");
}

#[test]
fn detect_json_reports_pnpm() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();

    let out = Command::cargo_bin("retrofit")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("RETROFIT_ROOT")
        .args(["detect", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["manager"], "pnpm");
}

#[test]
fn detect_walks_up_from_subdirectory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
    let nested = dir.path().join("src/components");
    std::fs::create_dir_all(&nested).unwrap();

    Command::cargo_bin("retrofit")
        .unwrap()
        .current_dir(&nested)
        .env_remove("RETROFIT_ROOT")
        .args(["detect", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"manager\": \"yarn\""));
}

// ---------------------------------------------------------------------------
// retrofit tailwind
// ---------------------------------------------------------------------------

#[test]
fn tailwind_scaffolds_then_is_idempotent() {
    let fx = Fixture::npm();
    fx.retrofit()
        .arg("tailwind")
        .assert()
        .success()
        .stdout(predicate::str::contains("created  tailwind.config.js"))
        .stdout(predicate::str::contains("npm install"));

    assert!(fx.read("src/index.css").starts_with("@tailwind base;"));

    fx.retrofit()
        .arg("tailwind")
        .assert()
        .success()
        .stdout(predicate::str::contains("already set up"));
}

// ---------------------------------------------------------------------------
// retrofit fix-imports
// ---------------------------------------------------------------------------

#[test]
fn fix_imports_outside_git_repo_fails() {
    if !has_git() {
        return;
    }
    let fx = Fixture::npm();
    fx.retrofit()
        .args(["fix-imports", "--to", "~/"])
        .env("GIT_CEILING_DIRECTORIES", fx.project.path().parent().unwrap())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to rewrite '@/' imports"));
}

fn has_git() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}
