use crate::output::print_paths;
use anyhow::Context;
use retrofit_core::imports;
use retrofit_core::project::ProjectContext;

pub fn run(project: &ProjectContext, from: &str, to: &str) -> anyhow::Result<()> {
    let changed = imports::fix_imports(&project.root, from, to)
        .with_context(|| format!("failed to rewrite '{from}' imports"))?;

    if changed.is_empty() {
        println!("No imports starting with '{from}' in changed files.");
        return Ok(());
    }
    print_paths(project, "rewrote", &changed);
    println!("\n{} file(s): '{from}' -> '{to}'", changed.len());
    Ok(())
}
