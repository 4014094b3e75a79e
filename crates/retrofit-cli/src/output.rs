use retrofit_core::project::ProjectContext;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// The resolved project as aligned `key  value` lines.
pub fn print_project(project: &ProjectContext) {
    let (shim, shim_args) = project.manager.exec_shim();
    let exec = std::iter::once(shim)
        .chain(shim_args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    let install = std::iter::once(project.manager.binary())
        .chain(project.manager.add_args(false))
        .collect::<Vec<_>>()
        .join(" ");

    for (key, value) in [
        ("root", project.root.display().to_string()),
        ("manager", project.manager.to_string()),
        ("exec", exec),
        ("add", install),
    ] {
        println!("{key:<8} {value}");
    }
}

/// One `verb  path` line per file, paths shown relative to the project root.
pub fn print_paths(project: &ProjectContext, verb: &str, paths: &[PathBuf]) {
    for path in paths {
        println!("{verb:<8} {}", relative(project, path).display());
    }
}

fn relative<'a>(project: &ProjectContext, path: &'a Path) -> &'a Path {
    path.strip_prefix(&project.root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrofit_core::project::PackageManager;

    #[test]
    fn paths_inside_root_are_shown_relative() {
        let project = ProjectContext {
            root: PathBuf::from("/app"),
            manager: PackageManager::Npm,
        };
        assert_eq!(
            relative(&project, Path::new("/app/src/index.css")),
            Path::new("src/index.css")
        );
        assert_eq!(
            relative(&project, Path::new("/elsewhere/x.css")),
            Path::new("/elsewhere/x.css")
        );
    }
}
