use retrofit_core::project::{self, ProjectContext};
use std::path::{Component, Path, PathBuf};

/// Resolve the project this invocation works on.
///
/// Priority:
/// 1. `--root` flag / `RETROFIT_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` containing `package.json`
/// 3. `cwd`
///
/// The root is always absolute, and the package manager is always read from
/// the lock files in it.
pub fn resolve_root(explicit: Option<&Path>) -> ProjectContext {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if let Some(p) = explicit {
        return ProjectContext::at(&anchor(p, &cwd));
    }

    project::resolve_project(&cwd)
}

/// `path` made absolute against `cwd`, without `.` components.
fn anchor(path: &Path, cwd: &Path) -> PathBuf {
    cwd.join(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
