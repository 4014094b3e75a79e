use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const MANIFEST_FILE: &str = "package.json";
pub const CONFIG_FILE: &str = "retrofit.yaml";

pub const DEBUG_STDOUT_FILE: &str = "retrofit-debug-stdout.txt";
pub const DEBUG_STDERR_FILE: &str = "retrofit-debug-stderr.txt";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a project-relative path from config. Absolute paths pass through.
pub fn project_file(root: &Path, relative: &str) -> PathBuf {
    let p = Path::new(relative);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
