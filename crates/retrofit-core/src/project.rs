//! Project root discovery and package-manager detection.
//!
//! The root is the nearest ancestor holding a `package.json`; the manager is
//! read off whichever lock file sits in that root.

use crate::paths;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// PackageManager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    Bun,
    Pnpm,
    Yarn,
    Npm,
}

/// Lock files in detection order. The first one present wins.
const LOCK_FILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
    ("npm-shrinkwrap.json", PackageManager::Npm),
];

impl PackageManager {
    /// Detect from lock files in `root`. Falls back to npm.
    pub fn detect(root: &Path) -> Self {
        LOCK_FILES
            .iter()
            .find(|(file, _)| root.join(file).is_file())
            .map(|(_, pm)| *pm)
            .unwrap_or(PackageManager::Npm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Bun => "bun",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Npm => "npm",
        }
    }

    /// The executable that manages dependencies.
    pub fn binary(&self) -> &'static str {
        self.as_str()
    }

    /// Subcommand and flags that add packages to the manifest.
    pub fn add_args(&self, dev: bool) -> Vec<&'static str> {
        match (self, dev) {
            (PackageManager::Bun, false) => vec!["add"],
            (PackageManager::Bun, true) => vec!["add", "--dev"],
            (PackageManager::Pnpm, false) => vec!["add"],
            (PackageManager::Pnpm, true) => vec!["add", "-D"],
            (PackageManager::Yarn, false) => vec!["add"],
            (PackageManager::Yarn, true) => vec!["add", "-D"],
            (PackageManager::Npm, false) => vec!["install"],
            (PackageManager::Npm, true) => vec!["install", "--save-dev"],
        }
    }

    /// Subcommand that installs the whole dependency tree.
    pub fn install_all_args(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Bun
            | PackageManager::Pnpm
            | PackageManager::Yarn
            | PackageManager::Npm => &["install"],
        }
    }

    /// Program and leading args used to run a locally installed CLI.
    pub fn exec_shim(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            PackageManager::Bun => ("bunx", &[]),
            PackageManager::Pnpm => ("pnpm", &["exec"]),
            PackageManager::Yarn => ("yarn", &[]),
            PackageManager::Npm => ("npx", &[]),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub manager: PackageManager,
}

impl ProjectContext {
    /// Build a context for a root chosen by the caller (`--root`).
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            manager: PackageManager::detect(root),
        }
    }
}

/// Walk upward from `start` to the first directory containing `package.json`.
/// If none is found, `start` itself is the root.
pub fn resolve_project(start: &Path) -> ProjectContext {
    let root = find_manifest_root(start).unwrap_or_else(|| start.to_path_buf());
    ProjectContext::at(&root)
}

fn find_manifest_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::manifest_path(dir).is_file())
        .map(Path::to_path_buf)
}
