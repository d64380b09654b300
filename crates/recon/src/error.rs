use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Malformed alignment or extraction input.
    #[error("validation error: {0}")]
    Validation(String),
    /// Decision policy failed or returned a structurally invalid verdict.
    #[error("policy error on field '{field}': {message}")]
    Policy { field: String, message: String },
    /// Report or document destination could not be written.
    #[error("render error: {0}")]
    Render(String),
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty component, out-of-range threshold, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl ReconError {
    pub(crate) fn policy(field: &str, message: impl Into<String>) -> Self {
        Self::Policy {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Render(e.to_string())
    }
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Render(e.to_string())
    }
}
