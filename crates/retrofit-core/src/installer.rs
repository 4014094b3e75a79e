use std::path::Path;

use crate::error::{Result, RetrofitError};
use crate::project::PackageManager;
use crate::runner::{self, CommandSpec, ProcessResult};

/// The command that adds `packages` with `manager`.
pub fn add_command(
    root: &Path,
    manager: PackageManager,
    packages: &[String],
    dev: bool,
) -> CommandSpec {
    CommandSpec::captured(manager.binary(), root)
        .args(manager.add_args(dev))
        .args(packages.iter().cloned())
}

/// The command that installs the full dependency tree.
pub fn install_all_command(root: &Path, manager: PackageManager) -> CommandSpec {
    CommandSpec::captured(manager.binary(), root).args(manager.install_all_args().iter().copied())
}

/// Add `packages` to the project. A non-zero exit is fatal: the captured
/// output is written to stderr and [`RetrofitError::InstallFailed`] returned.
pub async fn install(
    root: &Path,
    manager: PackageManager,
    packages: &[String],
    dev: bool,
) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    execute(&add_command(root, manager, packages, dev)).await
}

/// Run the manager's plain `install` so the lock file and `node_modules`
/// match `package.json` again.
pub async fn install_all(root: &Path, manager: PackageManager) -> Result<()> {
    execute(&install_all_command(root, manager)).await
}

async fn execute(spec: &CommandSpec) -> Result<()> {
    tracing::info!(command = %spec.display(), "installing");
    let result = runner::run(spec, None).await?;
    if result.success() {
        return Ok(());
    }
    surface_output(&result);
    Err(RetrofitError::InstallFailed {
        command: spec.display(),
        code: result.code(),
    })
}

fn surface_output(result: &ProcessResult) {
    for text in [&result.stdout, &result.stderr] {
        let trimmed = text.trim_end();
        if !trimmed.is_empty() {
            eprintln!("{trimmed}");
        }
    }
}
