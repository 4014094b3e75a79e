use crate::output::print_paths;
use anyhow::Context;
use retrofit_core::config::Config;
use retrofit_core::project::ProjectContext;
use retrofit_core::scaffold;

pub fn run(project: &ProjectContext) -> anyhow::Result<()> {
    let config = Config::load(&project.root).context("failed to load retrofit.yaml")?;
    let report = scaffold::setup_tailwind(&project.root, &config.tailwind)
        .context("tailwind setup failed")?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if report.is_noop() {
        println!("Tailwind is already set up.");
        return Ok(());
    }
    print_paths(project, "created", &report.created);
    print_paths(project, "updated", &report.updated);
    if !report.added_packages.is_empty() {
        println!(
            "\nAdded {} to devDependencies. Run `{} install` to fetch them.",
            report.added_packages.join(", "),
            project.manager.binary()
        );
    }
    Ok(())
}
