//! Rewrites import specifiers in freshly generated files.
//!
//! Component generators emit imports like `@/lib/utils`; projects that alias
//! their source root differently need those rewritten. Only files git reports
//! as changed or untracked are touched.

use crate::error::{Result, RetrofitError};
use crate::io;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "astro",
];

/// Files git considers changed against HEAD, plus untracked files, under
/// `root` (which may be a subdirectory of the repository).
/// Paths are absolute, deduplicated and limited to source extensions.
pub fn changed_files(root: &Path) -> Result<Vec<PathBuf>> {
    // Before the first commit everything is untracked.
    let mut names = if has_head(root)? {
        git_lines(root, &["diff", "--name-only", "--relative", "HEAD"])?
    } else {
        tracing::debug!(root = %root.display(), "no commits yet; using untracked files only");
        Vec::new()
    };
    names.extend(git_lines(root, &["ls-files", "--others", "--exclude-standard"])?);
    names.sort();
    names.dedup();

    Ok(names
        .into_iter()
        .map(|n| root.join(n))
        .filter(|p| is_source_file(p) && p.is_file())
        .collect())
}

/// False in a repository with no commits (unborn HEAD).
fn has_head(root: &Path) -> Result<bool> {
    let inside = git(root, &["rev-parse", "--is-inside-work-tree"])?;
    if !inside.status.success() {
        let stderr = String::from_utf8_lossy(&inside.stderr);
        return Err(RetrofitError::Git(format!(
            "{} is not in a git work tree: {}",
            root.display(),
            stderr.trim()
        )));
    }
    Ok(git(root, &["rev-parse", "--verify", "--quiet", "HEAD"])?
        .status
        .success())
}

fn git(root: &Path, args: &[&str]) -> Result<std::process::Output> {
    Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| RetrofitError::Git(format!("failed to run git: {e}")))
}

fn git_lines(root: &Path, args: &[&str]) -> Result<Vec<String>> {
    let output = git(root, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RetrofitError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

// ---------------------------------------------------------------------------
// ImportRewriter
// ---------------------------------------------------------------------------

/// Replaces the `from` prefix of quoted module specifiers with `to`.
pub struct ImportRewriter {
    re: Regex,
    to: String,
}

impl ImportRewriter {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        if from.is_empty() {
            return Err(RetrofitError::InvalidConfig(
                "import prefix to replace must not be empty".into(),
            ));
        }
        // Only the start of a quoted specifier, so `x@/y` and comments stay put.
        let pattern = format!(r#"(["'`]){}"#, regex::escape(from));
        let re = Regex::new(&pattern)
            .map_err(|e| RetrofitError::InvalidConfig(format!("bad import prefix: {e}")))?;
        Ok(Self {
            re,
            to: to.to_string(),
        })
    }

    /// Rewritten text, or `None` when nothing matched.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        if !self.re.is_match(text) {
            return None;
        }
        let to = self.to.as_str();
        let out = self
            .re
            .replace_all(text, |caps: &regex::Captures| format!("{}{to}", &caps[1]));
        Some(out.into_owned())
    }

    /// Apply to each file in place. Returns the files that changed.
    pub fn rewrite_files(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        for path in files {
            let text = std::fs::read_to_string(path)?;
            if let Some(updated) = self.rewrite(&text) {
                io::atomic_write(path, updated.as_bytes())?;
                tracing::debug!(path = %path.display(), "rewrote imports");
                changed.push(path.clone());
            }
        }
        Ok(changed)
    }
}

/// Rewrite `from` to `to` in every changed source file under `root`.
pub fn fix_imports(root: &Path, from: &str, to: &str) -> Result<Vec<PathBuf>> {
    let rewriter = ImportRewriter::new(from, to)?;
    let files = changed_files(root)?;
    tracing::info!(candidates = files.len(), "rewriting imports");
    rewriter.rewrite_files(&files)
}
