use crate::output::{print_json, print_project};
use retrofit_core::project::ProjectContext;

pub fn run(project: &ProjectContext, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(project);
    }
    print_project(project);
    Ok(())
}
