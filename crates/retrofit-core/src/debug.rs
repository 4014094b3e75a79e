use crate::paths;
use std::path::PathBuf;

/// Diagnostic switches passed explicitly into the classifier.
///
/// When `dump_dir` is set, every classified stdout/stderr pair is written to
/// fixed files in that directory so a failing run can be inspected offline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugOptions {
    pub dump_dir: Option<PathBuf>,
}

impl DebugOptions {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Dump into the system temp dir when `flag` is truthy (`1`, `true`, `yes`, `on`).
    pub fn from_flag(flag: Option<&str>) -> Self {
        let enabled = flag
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        Self {
            dump_dir: enabled.then(std::env::temp_dir),
        }
    }

    pub fn stdout_path(&self) -> Option<PathBuf> {
        self.dump_dir.as_deref().map(|d| d.join(paths::DEBUG_STDOUT_FILE))
    }

    pub fn stderr_path(&self) -> Option<PathBuf> {
        self.dump_dir.as_deref().map(|d| d.join(paths::DEBUG_STDERR_FILE))
    }

    /// Persist classifier inputs. Failures are logged and swallowed.
    pub(crate) fn dump(&self, stdout: &str, stderr: &str) {
        let (Some(out_path), Some(err_path)) = (self.stdout_path(), self.stderr_path()) else {
            return;
        };
        for (path, text) in [(out_path, stdout), (err_path, stderr)] {
            if let Err(e) = std::fs::write(&path, text) {
                tracing::warn!(path = %path.display(), "failed to write debug dump: {e}");
            }
        }
    }
}
