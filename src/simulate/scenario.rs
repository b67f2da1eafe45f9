//! Scenario files for the simulator.
//!
//! A scenario describes a form, how its validation and submit handler
//! complete, which hooks to install, and how many times to submit.

use crate::error::{Error, Result};
use crate::form::FieldErrors;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A complete simulation scenario.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Scenario {
    /// Fields and initial values.
    pub form: FormSection,

    /// Validation step, if the form validates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<StepSection>,

    /// Submit handler step.
    pub submit: StepSection,

    /// Hooks to install.
    pub hooks: HooksSection,

    /// Run parameters.
    pub run: RunSection,
}

/// Form fields and values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FormSection {
    /// Field names to register.
    pub fields: Vec<String>,

    /// Initial values.
    pub values: Map<String, Value>,
}

/// How a validator or submit handler completes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StepSection {
    /// Completes during the submit call or later.
    pub mode: Timing,

    /// Errors produced; empty means the step passes.
    pub errors: FieldErrors,
}

/// When a step completes.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    /// Inside the submit call.
    #[default]
    Sync,
    /// After the submit call returns, when the simulator settles it.
    Async,
}

/// Hooks to install.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HooksSection {
    /// Before-submit hook behavior.
    pub before_submit: BeforeSubmitMode,

    /// Install an after-submit-succeeded hook.
    pub after_submit_succeeded: bool,

    /// Install an after-submit-failed hook.
    pub after_submit_failed: bool,
}

/// Before-submit hook behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BeforeSubmitMode {
    /// No before-submit hook.
    #[default]
    Absent,
    /// Hook runs and lets the submission through.
    Proceed,
    /// Hook runs and returns `false`.
    Veto,
}

/// Run parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunSection {
    /// Number of submit calls.
    pub submits: u32,

    /// Uninstall after this submit call (0 = never).
    pub uninstall_after: u32,

    /// Uninstall before pending steps of that call are settled.
    pub uninstall_before_settle: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            submits: 1,
            uninstall_after: 0,
            uninstall_before_settle: false,
        }
    }
}

impl Scenario {
    /// Parse a scenario from TOML text and check it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the run section is
    /// inconsistent.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.check()?;
        Ok(scenario)
    }

    /// Check run parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scenario`] if there is nothing to run or the
    /// uninstall point lies beyond the last submit.
    pub fn check(&self) -> Result<()> {
        if self.run.submits == 0 {
            return Err(Error::Scenario("run.submits must be at least 1".to_string()));
        }
        if self.run.uninstall_after > self.run.submits {
            return Err(Error::Scenario(format!(
                "run.uninstall_after ({}) is beyond run.submits ({})",
                self.run.uninstall_after, self.run.submits
            )));
        }
        if self.run.uninstall_before_settle && self.run.uninstall_after == 0 {
            return Err(Error::Scenario(
                "run.uninstall_before_settle needs run.uninstall_after".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and check a scenario file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid scenario.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = fs::read_to_string(path)?;
    Scenario::from_toml(&contents)
}
