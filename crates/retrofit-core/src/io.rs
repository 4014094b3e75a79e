use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting project files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Prepend `text` to a file unless it already contains `marker`.
/// Creates the file when missing. Returns true if the file changed.
pub fn prepend_unless_present(path: &Path, marker: &str, text: &str) -> Result<bool> {
    let existing = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if existing.contains(marker) {
        return Ok(false);
    }
    let mut updated = String::with_capacity(text.len() + existing.len() + 1);
    updated.push_str(text);
    if !existing.is_empty() {
        if !text.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&existing);
    }
    atomic_write(path, updated.as_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");
        atomic_write(&path, b"hi").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi");
    }

    #[test]
    fn write_if_missing_leaves_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.txt");
        std::fs::write(&path, "original").unwrap();
        assert!(!write_if_missing(&path, b"new").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn prepend_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.css");
        std::fs::write(&path, "body { margin: 0; }\n").unwrap();

        assert!(prepend_unless_present(&path, "@tailwind base", "@tailwind base;\n").unwrap());
        assert!(!prepend_unless_present(&path, "@tailwind base", "@tailwind base;\n").unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("@tailwind base;\nbody"));
        assert_eq!(content.matches("@tailwind base").count(), 1);
    }

    #[test]
    fn prepend_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("src/index.css");
        assert!(prepend_unless_present(&path, "@tailwind", "@tailwind base;\n").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "@tailwind base;\n");
    }
}
