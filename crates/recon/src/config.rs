use serde::Deserialize;

use crate::error::ReconError;
use crate::report::DEFAULT_REVIEW_THRESHOLD;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    /// Component whose documents are reconciled (`<data_dir>/<source>/<component>.txt`).
    pub component: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Optional human decision file (JSON), relative to the config file.
    #[serde(default)]
    pub decisions: Option<String>,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_data_dir() -> String {
    "data".into()
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    /// Fields with overall confidence strictly below this need review.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_REVIEW_THRESHOLD
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStrategy {
    #[default]
    Recency,
    Majority,
}

impl std::fmt::Display for PolicyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recency => write!(f, "recency"),
            Self::Majority => write!(f, "majority"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub strategy: PolicyStrategy,
    /// Confidence given to a source that does not carry the field.
    #[serde(default = "default_absent_confidence")]
    pub absent_confidence: f64,
    /// Overall confidence when no source carries the field.
    #[serde(default)]
    pub no_truth_confidence: f64,
}

fn default_absent_confidence() -> f64 {
    0.3
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            strategy: PolicyStrategy::Recency,
            absent_confidence: default_absent_confidence(),
            no_truth_confidence: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "enabled")]
    pub report: bool,
    #[serde(default = "enabled")]
    pub document: bool,
    #[serde(default = "enabled")]
    pub evaluated: bool,
}

fn default_output_dir() -> String {
    "output".into()
}

fn enabled() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            report: true,
            document: true,
            evaluated: true,
        }
    }
}

impl OutputConfig {
    pub fn report_file(&self, component: &str) -> String {
        format!("{component}_report.csv")
    }

    pub fn document_file(&self, component: &str) -> String {
        format!("{component}_unified.txt")
    }

    pub fn evaluated_file(&self, component: &str) -> String {
        format!("{component}_evaluated.json")
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.component.trim().is_empty() {
            return Err(ReconError::ConfigValidation("component must not be empty".into()));
        }
        if self.component.contains(['/', '\\']) {
            return Err(ReconError::ConfigValidation(format!(
                "component '{}' must not contain path separators",
                self.component
            )));
        }

        let unit = [
            ("review.threshold", self.review.threshold),
            ("policy.absent_confidence", self.policy.absent_confidence),
            ("policy.no_truth_confidence", self.policy.no_truth_confidence),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
