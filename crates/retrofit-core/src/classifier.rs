//! Reads framework output and decides what is missing.
//!
//! Two diagnostics matter:
//! - `could not resolve "<specifier>"`: a dependency the bundler could not
//!   find. Seen plain, bracket-tagged (`✘ [ERROR] Could not resolve "x"`) and
//!   prefixed (`error: could not resolve 'x'`), in any case.
//! - `Cannot find module 'tailwindcss'`: the CSS pipeline expects Tailwind but
//!   the project was never set up for it.

use crate::debug::DebugOptions;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static UNRESOLVED_RE: OnceLock<Regex> = OnceLock::new();
static FEATURE_RE: OnceLock<Regex> = OnceLock::new();

fn unresolved_re() -> &'static Regex {
    UNRESOLVED_RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:\[error\]\s*|\berror:\s*)?could not resolve\s+(?:"([^"\r\n]+)"|'([^'\r\n]+)')"#,
        )
        .unwrap()
    })
}

fn feature_re() -> &'static Regex {
    FEATURE_RE.get_or_init(|| {
        Regex::new(
            r#"(?i)cannot find (?:module|package) ["'](tailwindcss|@tailwindcss/[^"'\s]+)["']"#,
        )
        .unwrap()
    })
}

// ---------------------------------------------------------------------------
// MissingPackages
// ---------------------------------------------------------------------------

/// Package specifiers the framework could not resolve, exactly as quoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingPackages(BTreeSet<String>);

impl MissingPackages {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for MissingPackages {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for MissingPackages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(String::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

// ---------------------------------------------------------------------------
// MissingFeature
// ---------------------------------------------------------------------------

/// Optional features whose absence is repaired by scaffolding, not by `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Tailwind,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Tailwind => "tailwind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFeature {
    pub feature: Feature,
    /// The module named in the diagnostic, e.g. `@tailwindcss/vite`.
    pub module: String,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract every unresolved specifier from `text`.
pub fn missing_packages(text: &str) -> MissingPackages {
    unresolved_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// First optional-feature diagnostic in `text`, if any.
pub fn missing_feature(text: &str) -> Option<MissingFeature> {
    feature_re().captures(text).and_then(|caps| caps.get(1)).map(|m| MissingFeature {
        feature: Feature::Tailwind,
        module: m.as_str().to_string(),
    })
}

/// True when `text` already shows an error the supervisor knows how to repair.
/// Used to stop the child early instead of waiting for it to give up.
pub fn is_fatal_chunk(text: &str) -> bool {
    unresolved_re().is_match(text) || feature_re().is_match(text)
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    let mut combined = String::with_capacity(stdout.len() + stderr.len() + 1);
    combined.push_str(stdout);
    combined.push('\n');
    combined.push_str(stderr);
    combined
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    debug: DebugOptions,
}

impl Classifier {
    pub fn new(debug: DebugOptions) -> Self {
        Self { debug }
    }

    pub fn classify(&self, stdout: &str, stderr: &str) -> MissingPackages {
        self.debug.dump(stdout, stderr);
        missing_packages(&join_streams(stdout, stderr))
    }

    pub fn missing_feature(&self, stdout: &str, stderr: &str) -> Option<MissingFeature> {
        missing_feature(&join_streams(stdout, stderr))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DebugOptions::disabled())
    }
}
