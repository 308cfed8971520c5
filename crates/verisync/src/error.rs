use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Fields that must be non-empty before verification can start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredField {
    ClientId,
    FlowId,
    RedirectUrl,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::ClientId => "client_id",
            RequiredField::FlowId => "flow_id",
            RequiredField::RedirectUrl => "redirect_url",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller error: one or more required request fields were empty at start.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
#[error("missing required verification parameters: {}", join(.missing))]
#[diagnostic(
    code(verisync::config),
    help("client_id, flow_id, and redirect_url are required to start verification")
)]
pub struct ConfigError {
    missing: Vec<RequiredField>,
}

impl ConfigError {
    pub fn new(missing: Vec<RequiredField>) -> Self {
        Self { missing }
    }

    /// The fields that were empty, in declaration order.
    pub fn missing(&self) -> &[RequiredField] {
        &self.missing
    }
}

fn join(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(RequiredField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors emitted by the verification controller.
#[derive(Debug, Error, Diagnostic)]
pub enum VerisyncError {
    /// Required request fields were empty
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
    /// Metadata did not serialize to a JSON object
    #[error("metadata must serialize to a JSON object, got {0}")]
    #[diagnostic(
        code(verisync::metadata),
        help("pass a map or a struct; scalars and arrays are not accepted")
    )]
    Metadata(&'static str),
    /// Serialization error
    #[error(transparent)]
    #[diagnostic(code(verisync::serde))]
    Serde(#[from] serde_json::Error),
    /// URL error
    #[error(transparent)]
    #[diagnostic(code(verisync::url))]
    Url(#[from] url::ParseError),
    /// URL error
    #[error(transparent)]
    #[diagnostic(code(verisync::url))]
    UrlEncoding(#[from] serde_html_form::ser::Error),
    /// Shared controller was borrowed when a bound control fired
    #[error("verification controller is already borrowed")]
    #[diagnostic(
        code(verisync::busy),
        help("release borrows of the shared controller before dispatching control events")
    )]
    Busy,
    /// Loopback listener error
    #[error("loopback server error: {0}")]
    #[diagnostic(
        code(verisync::loopback),
        help("check that the configured host and port are free to bind")
    )]
    Loopback(String),
}

impl VerisyncError {
    /// True for the caller error raised when required fields are empty.
    pub fn is_config(&self) -> bool {
        matches!(self, VerisyncError::Config(_))
    }
}

pub type Result<T> = core::result::Result<T, VerisyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_lists_every_missing_field() {
        let err = ConfigError::new(vec![RequiredField::ClientId, RequiredField::RedirectUrl]);
        assert_eq!(
            err.to_string(),
            "missing required verification parameters: client_id, redirect_url"
        );
        assert_eq!(
            err.missing(),
            &[RequiredField::ClientId, RequiredField::RedirectUrl]
        );
    }

    #[test]
    fn config_error_converts_into_verisync_error() {
        let err: VerisyncError = ConfigError::new(vec![RequiredField::FlowId]).into();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "missing required verification parameters: flow_id"
        );
    }
}
