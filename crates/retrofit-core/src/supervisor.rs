//! The retry loop around the framework CLI.
//!
//! ```text
//! RUNNING(n) ──► feature missing? ──► scaffold + full install ──► RUNNING(n)
//!     │
//!     └──► classify ──► empty ───────────────► Success(exit code)
//!                  └──► n == MAX_ATTEMPTS ───► Exhausted
//!                  └──► install ─────────────► RUNNING(n + 1)
//! ```
//!
//! Process spawning lives behind [`Toolchain`] so the policy here can be
//! exercised without real children.

use std::sync::Arc;

use crate::classifier::{self, Classifier, MissingFeature, MissingPackages};
use crate::config::Config;
use crate::error::{Result, RetrofitError};
use crate::installer;
use crate::project::ProjectContext;
use crate::runner::{self, CommandSpec, EarlyExit, ProcessResult};
use crate::scaffold;

pub const MAX_ATTEMPTS: u32 = 5;

/// Feature scaffolding runs allowed per invocation. Setup does not consume
/// an attempt, so it needs its own bound.
pub const MAX_FEATURE_SETUPS: u32 = 2;

// ─── Events ───────────────────────────────────────────────────────────────

/// Announcements made before each step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Attempt {
        attempt: u32,
        max: u32,
    },
    MissingPackages {
        attempt: u32,
        packages: Vec<String>,
    },
    Installing {
        packages: Vec<String>,
    },
    FeatureMissing {
        module: String,
    },
    FeatureSetup {
        feature: &'static str,
    },
    Reinstalling,
    Exhausted {
        packages: Vec<String>,
    },
}

// ─── Toolchain ────────────────────────────────────────────────────────────

/// The side effects the supervisor drives.
#[allow(async_fn_in_trait)]
pub trait Toolchain {
    /// Run the framework once. `early_exit` is `None` on the final attempt.
    async fn run_target(&mut self, early_exit: Option<EarlyExit>) -> Result<ProcessResult>;

    /// Add packages to the project.
    async fn install(&mut self, packages: &MissingPackages) -> Result<()>;

    /// Scaffold the feature's configuration, then reinstall everything.
    async fn setup_feature(&mut self, feature: &MissingFeature) -> Result<()>;

    fn announce(&mut self, event: &SupervisorEvent) {
        tracing::info!(?event, "supervisor");
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Exit code of the last framework run.
    pub exit_code: i32,
    /// RUNNING cycles that consumed an attempt.
    pub attempts: u32,
    pub feature_setups: u32,
}

// ─── Supervisor ───────────────────────────────────────────────────────────

pub struct Supervisor<T> {
    toolchain: T,
    classifier: Classifier,
    max_attempts: u32,
    max_feature_setups: u32,
}

impl<T: Toolchain> Supervisor<T> {
    pub fn new(toolchain: T, classifier: Classifier) -> Self {
        Self {
            toolchain,
            classifier,
            max_attempts: MAX_ATTEMPTS,
            max_feature_setups: MAX_FEATURE_SETUPS,
        }
    }

    /// Drive the framework until it stops reporting unresolved packages.
    ///
    /// Returns the framework's own exit code on success. Exhausting the
    /// attempt budget, a failed install or a launch failure is an error.
    pub async fn run(&mut self) -> Result<Outcome> {
        let mut attempt: u32 = 1;
        let mut feature_setups: u32 = 0;

        loop {
            self.toolchain.announce(&SupervisorEvent::Attempt {
                attempt,
                max: self.max_attempts,
            });

            let early_exit: Option<EarlyExit> = (attempt < self.max_attempts)
                .then(|| Arc::new(classifier::is_fatal_chunk) as EarlyExit);
            let result = self.toolchain.run_target(early_exit).await?;

            if let Some(missing) = self.classifier.missing_feature(&result.stdout, &result.stderr) {
                if feature_setups >= self.max_feature_setups {
                    return Err(RetrofitError::FeatureSetupExhausted {
                        module: missing.module,
                        setups: feature_setups,
                    });
                }
                self.toolchain.announce(&SupervisorEvent::FeatureMissing {
                    module: missing.module.clone(),
                });
                feature_setups += 1;
                self.toolchain.setup_feature(&missing).await?;
                continue;
            }

            let packages = self.classifier.classify(&result.stdout, &result.stderr);
            if packages.is_empty() {
                tracing::debug!(attempt, exit_code = result.code(), "no unresolved packages");
                return Ok(Outcome {
                    exit_code: result.code(),
                    attempts: attempt,
                    feature_setups,
                });
            }

            self.toolchain.announce(&SupervisorEvent::MissingPackages {
                attempt,
                packages: packages.to_vec(),
            });

            if attempt >= self.max_attempts {
                self.toolchain.announce(&SupervisorEvent::Exhausted {
                    packages: packages.to_vec(),
                });
                return Err(RetrofitError::Exhausted {
                    attempts: attempt,
                    packages: packages.to_vec(),
                });
            }

            self.toolchain.announce(&SupervisorEvent::Installing {
                packages: packages.to_vec(),
            });
            self.toolchain.install(&packages).await?;
            attempt += 1;
        }
    }
}

// ─── ProcessToolchain ─────────────────────────────────────────────────────

/// The real toolchain: the framework through the manager's exec shim,
/// installs through the manager, Tailwind through [`scaffold`].
pub struct ProcessToolchain<'a> {
    project: &'a ProjectContext,
    config: &'a Config,
    forwarded: Vec<String>,
    reporter: Box<dyn FnMut(&SupervisorEvent) + Send + 'a>,
}

impl<'a> ProcessToolchain<'a> {
    pub fn new(project: &'a ProjectContext, config: &'a Config, forwarded: Vec<String>) -> Self {
        Self {
            project,
            config,
            forwarded,
            reporter: Box::new(|event: &SupervisorEvent| tracing::info!(?event, "supervisor")),
        }
    }

    /// Route announcements somewhere the operator will see them.
    pub fn with_reporter(mut self, reporter: impl FnMut(&SupervisorEvent) + Send + 'a) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// `<shim> <framework> <framework args> <forwarded args>` in the project root.
    pub fn target_command(&self) -> CommandSpec {
        let (shim, shim_args) = self.project.manager.exec_shim();
        CommandSpec::new(shim, &self.project.root)
            .args(shim_args.iter().copied())
            .arg(self.config.framework.command.as_str())
            .args(self.config.framework.args.iter().cloned())
            .args(self.forwarded.iter().cloned())
    }
}

impl Toolchain for ProcessToolchain<'_> {
    async fn run_target(&mut self, early_exit: Option<EarlyExit>) -> Result<ProcessResult> {
        runner::run(&self.target_command(), early_exit).await
    }

    async fn install(&mut self, packages: &MissingPackages) -> Result<()> {
        installer::install(
            &self.project.root,
            self.project.manager,
            &packages.to_vec(),
            self.config.install.dev,
        )
        .await
    }

    async fn setup_feature(&mut self, feature: &MissingFeature) -> Result<()> {
        match feature.feature {
            classifier::Feature::Tailwind => {
                self.announce(&SupervisorEvent::FeatureSetup {
                    feature: feature.feature.as_str(),
                });
                let report = scaffold::setup_tailwind(&self.project.root, &self.config.tailwind)?;
                tracing::debug!(?report, "tailwind scaffolded");
            }
        }
        self.announce(&SupervisorEvent::Reinstalling);
        installer::install_all(&self.project.root, self.project.manager).await
    }

    fn announce(&mut self, event: &SupervisorEvent) {
        (self.reporter)(event);
    }
}
