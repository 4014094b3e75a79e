//! Tailwind scaffolding. Every step is idempotent: running it on a project
//! that is already set up changes nothing.

use crate::config::TailwindConfig;
use crate::error::Result;
use crate::io;
use crate::paths;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Packages the PostCSS pipeline needs, added to `devDependencies` with these ranges.
pub const TAILWIND_PACKAGES: &[(&str, &str)] = &[
    ("tailwindcss", "^3.4.0"),
    ("postcss", "^8.4.0"),
    ("autoprefixer", "^10.4.0"),
];

const TAILWIND_DIRECTIVES: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n";

const POSTCSS_CONFIG: &str = "\
export default {
  plugins: {
    tailwindcss: {},
    autoprefixer: {},
  },
};
";

/// What a setup run touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub added_packages: Vec<String>,
    pub warnings: Vec<String>,
}

impl SetupReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.added_packages.is_empty()
    }
}

/// Configure Tailwind for the project at `root`.
///
/// Writes the Tailwind and PostCSS configs when missing, puts the
/// `@tailwind` directives at the top of the css entry, and records the
/// required packages in `package.json` so a plain install fetches them.
pub fn setup_tailwind(root: &Path, cfg: &TailwindConfig) -> Result<SetupReport> {
    let mut report = SetupReport::default();

    let config_path = paths::project_file(root, &cfg.config_file);
    if io::write_if_missing(&config_path, tailwind_config(&cfg.content).as_bytes())? {
        report.created.push(config_path);
    }

    let postcss_path = paths::project_file(root, &cfg.postcss_file);
    if io::write_if_missing(&postcss_path, POSTCSS_CONFIG.as_bytes())? {
        report.created.push(postcss_path);
    }

    let css_path = paths::project_file(root, &cfg.css_file);
    let css_existed = css_path.exists();
    if io::prepend_unless_present(&css_path, "@tailwind base", TAILWIND_DIRECTIVES)? {
        if css_existed {
            report.updated.push(css_path);
        } else {
            report.created.push(css_path);
        }
    }

    let manifest = paths::manifest_path(root);
    if manifest.exists() {
        let added = add_dev_dependencies(&manifest, TAILWIND_PACKAGES)?;
        if !added.is_empty() {
            report.updated.push(manifest);
            report.added_packages = added;
        }
    } else {
        let msg = format!(
            "{} not found; add {} yourself",
            manifest.display(),
            TAILWIND_PACKAGES
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        tracing::warn!("{msg}");
        report.warnings.push(msg);
    }

    tracing::info!(
        created = report.created.len(),
        updated = report.updated.len(),
        "tailwind setup finished"
    );
    Ok(report)
}

fn tailwind_config(content: &[String]) -> String {
    let globs = content
        .iter()
        .map(|g| format!("    {},", Value::String(g.clone())))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "/** @type {{import('tailwindcss').Config}} */\n\
         export default {{\n  content: [\n{globs}\n  ],\n  theme: {{\n    extend: {{}},\n  }},\n  plugins: [],\n}};\n"
    )
}

/// Add each `(name, range)` to `devDependencies` unless it is already listed
/// under `dependencies` or `devDependencies`. Key order is preserved.
/// Returns the names that were added.
fn add_dev_dependencies(manifest: &Path, packages: &[(&str, &str)]) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(manifest)?;
    let mut root: Value = serde_json::from_str(&data)?;
    let Some(obj) = root.as_object_mut() else {
        tracing::warn!(path = %manifest.display(), "package.json is not an object; skipping");
        return Ok(Vec::new());
    };

    let missing: Vec<(&str, &str)> = {
        let listed: &Map<String, Value> = obj;
        packages
            .iter()
            .copied()
            .filter(|(name, _)| !is_listed(listed, name))
            .collect()
    };
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    let dev = obj
        .entry("devDependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(dev) = dev.as_object_mut() else {
        tracing::warn!(path = %manifest.display(), "devDependencies is not an object; skipping");
        return Ok(Vec::new());
    };
    for (name, range) in &missing {
        dev.insert(name.to_string(), Value::String(range.to_string()));
    }

    let mut out = serde_json::to_string_pretty(&root)?;
    out.push('\n');
    io::atomic_write(manifest, out.as_bytes())?;

    Ok(missing.into_iter().map(|(name, _)| name.to_string()).collect())
}

fn is_listed(manifest: &Map<String, Value>, name: &str) -> bool {
    ["dependencies", "devDependencies"]
        .iter()
        .any(|section| manifest.get(*section).and_then(|d| d.get(name)).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name":"app","scripts":{"dev":"vite"},"dependencies":{"react":"^18.0.0"}}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn fresh_project_gets_everything() {
        let dir = project();
        let report = setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();

        assert!(dir.path().join("tailwind.config.js").exists());
        assert!(dir.path().join("postcss.config.js").exists());
        let css = std::fs::read_to_string(dir.path().join("src/index.css")).unwrap();
        assert!(css.starts_with("@tailwind base;"));
        assert_eq!(
            report.added_packages,
            vec!["tailwindcss", "postcss", "autoprefixer"]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = project();
        setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        let before = std::fs::read_to_string(dir.path().join("package.json")).unwrap();

        let report = setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        assert!(report.is_noop(), "unexpected changes: {report:?}");
        let after = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn manifest_key_order_is_preserved() {
        let dir = project();
        setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        let name = text.find("\"name\"").unwrap();
        let scripts = text.find("\"scripts\"").unwrap();
        let deps = text.find("\"dependencies\"").unwrap();
        let dev = text.find("\"devDependencies\"").unwrap();
        assert!(name < scripts && scripts < deps && deps < dev);
    }

    #[test]
    fn existing_dependency_is_not_duplicated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"tailwindcss":"4.0.0"}}"#,
        )
        .unwrap();
        let report = setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        assert_eq!(report.added_packages, vec!["postcss", "autoprefixer"]);

        let v: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("package.json")).unwrap())
                .unwrap();
        assert!(v["devDependencies"].get("tailwindcss").is_none());
        assert_eq!(v["dependencies"]["tailwindcss"], "4.0.0");
    }

    #[test]
    fn existing_css_is_kept_below_directives() {
        let dir = project();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/index.css"), "body { margin: 0; }\n").unwrap();

        let report = setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        assert!(report.updated.contains(&dir.path().join("src/index.css")));
        let css = std::fs::read_to_string(dir.path().join("src/index.css")).unwrap();
        assert!(css.ends_with("body { margin: 0; }\n"));
    }

    #[test]
    fn missing_manifest_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let report = setup_tailwind(dir.path(), &TailwindConfig::default()).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.added_packages.is_empty());
        assert!(dir.path().join("tailwind.config.js").exists());
    }

    #[test]
    fn config_lists_content_globs() {
        let text = tailwind_config(&["./app/**/*.tsx".to_string()]);
        assert!(text.contains("\"./app/**/*.tsx\","));
        assert!(text.contains("export default {"));
    }
}
