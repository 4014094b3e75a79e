use anyhow::Context;
use retrofit_core::{
    classifier::Classifier,
    config::{Config, WarnLevel},
    debug::DebugOptions,
    installer,
    project::ProjectContext,
    supervisor::{ProcessToolchain, Supervisor, SupervisorEvent},
};

// ---------------------------------------------------------------------------
// RunExit: the wrapped command's non-zero exit code, carried to main
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RunExit(pub i32);

impl RunExit {
    pub fn exit_code(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for RunExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wrapped command exited with code {}", self.0)
    }
}

impl std::error::Error for RunExit {}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(project: &ProjectContext, args: Vec<String>) -> anyhow::Result<()> {
    let config = Config::load(&project.root).context("failed to load retrofit.yaml")?;
    for warning in config.validate() {
        if warning.level == WarnLevel::Warning {
            eprintln!("warning: {}", warning.message);
        }
    }

    let debug = DebugOptions::from_flag(std::env::var("RETROFIT_DEBUG").ok().as_deref());
    if let Some(dir) = &debug.dump_dir {
        tracing::info!(dir = %dir.display(), "dumping classifier input");
    }

    let toolchain = ProcessToolchain::new(project, &config, args)
        .with_reporter(|event| report(project, &config, event));
    let mut supervisor = Supervisor::new(toolchain, Classifier::new(debug));

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let outcome = rt.block_on(supervisor.run())?;

    tracing::debug!(?outcome, "run finished");
    if outcome.exit_code != 0 {
        return Err(RunExit(outcome.exit_code).into());
    }
    Ok(())
}

fn report(project: &ProjectContext, config: &Config, event: &SupervisorEvent) {
    match event {
        // The first run is the normal case; only retries are worth a line.
        SupervisorEvent::Attempt { attempt, max } if *attempt > 1 => {
            eprintln!("\n\u{21bb} attempt {attempt}/{max}");
        }
        SupervisorEvent::Attempt { .. } => {}
        SupervisorEvent::MissingPackages { attempt, packages } => {
            eprintln!(
                "\nattempt {attempt}: missing package(s): {}",
                packages.join(", ")
            );
        }
        SupervisorEvent::Installing { packages } => {
            let cmd = installer::add_command(
                &project.root,
                project.manager,
                packages,
                config.install.dev,
            );
            eprintln!("installing: {}", cmd.display());
        }
        SupervisorEvent::FeatureMissing { module } => {
            eprintln!("\n'{module}' is not set up");
        }
        SupervisorEvent::FeatureSetup { feature } => {
            eprintln!("setting up {feature}");
        }
        SupervisorEvent::Reinstalling => {
            let cmd = installer::install_all_command(&project.root, project.manager);
            eprintln!("reinstalling: {}", cmd.display());
        }
        SupervisorEvent::Exhausted { packages } => {
            eprintln!("\ngiving up; still missing: {}", packages.join(", "));
        }
    }
}
