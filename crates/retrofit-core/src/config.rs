use crate::error::{Result, RetrofitError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FrameworkConfig
// ---------------------------------------------------------------------------

/// The wrapped CLI, run through the package manager's exec shim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    #[serde(default = "default_framework_command")]
    pub command: String,
    /// Inserted between the command and the forwarded arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_framework_command() -> String {
    "vite".to_string()
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            command: default_framework_command(),
            args: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// InstallConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Add detected packages as dev dependencies.
    #[serde(default)]
    pub dev: bool,
}

// ---------------------------------------------------------------------------
// TailwindConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailwindConfig {
    #[serde(default = "default_tailwind_config_file")]
    pub config_file: String,
    #[serde(default = "default_postcss_file")]
    pub postcss_file: String,
    #[serde(default = "default_css_file")]
    pub css_file: String,
    #[serde(default = "default_content_globs")]
    pub content: Vec<String>,
}

fn default_tailwind_config_file() -> String {
    "tailwind.config.js".to_string()
}

fn default_postcss_file() -> String {
    "postcss.config.js".to_string()
}

fn default_css_file() -> String {
    "src/index.css".to_string()
}

fn default_content_globs() -> Vec<String> {
    vec![
        "./index.html".to_string(),
        "./src/**/*.{js,ts,jsx,tsx}".to_string(),
    ]
}

impl Default for TailwindConfig {
    fn default() -> Self {
        Self {
            config_file: default_tailwind_config_file(),
            postcss_file: default_postcss_file(),
            css_file: default_css_file(),
            content: default_content_globs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Contents of `retrofit.yaml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub framework: FrameworkConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub tailwind: TailwindConfig,
}

impl Config {
    /// Load `retrofit.yaml` from `root`, or defaults when it does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        let errors: Vec<String> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(RetrofitError::InvalidConfig(errors.join("; ")));
        }
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.framework.command.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "framework.command is empty".to_string(),
            });
        } else if self.framework.command.contains(char::is_whitespace) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "framework.command '{}' contains whitespace; put extra words in framework.args",
                    self.framework.command
                ),
            });
        }

        for (key, value) in [
            ("tailwind.config_file", &self.tailwind.config_file),
            ("tailwind.postcss_file", &self.tailwind.postcss_file),
            ("tailwind.css_file", &self.tailwind.css_file),
        ] {
            if Path::new(value).is_absolute() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{key} '{value}' is absolute; it will be written outside the project"),
                });
            }
        }

        if self.tailwind.content.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "tailwind.content is empty; no classes will be generated".to_string(),
            });
        }

        warnings
    }
}
