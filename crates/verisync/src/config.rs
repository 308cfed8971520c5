use smol_str::SmolStr;
use url::Url;

use crate::{DEFAULT_BASE_URL, error::Result};

/// Service-side configuration for building verification URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerisyncConfig {
    /// Synchronizer endpoint the query string is appended to.
    pub base_url: Url,
}

impl VerisyncConfig {
    /// Point the controller at a different synchronizer deployment.
    pub fn with_base_url(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
        })
    }
}

impl Default for VerisyncConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

/// Labels a host may use when rendering the trigger and the close control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
    pub button_text: SmolStr,
    pub close_text: SmolStr,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            button_text: SmolStr::new_static("Perform KYC"),
            close_text: SmolStr::new_static("Close"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_synchronizer() {
        assert_eq!(
            VerisyncConfig::default().base_url.as_str(),
            "https://app.verisync.co/synchronizer"
        );
    }

    #[test]
    fn custom_base_url_must_parse() {
        let config = VerisyncConfig::with_base_url("https://staging.verisync.co/synchronizer")
            .expect("valid url");
        assert_eq!(config.base_url.host_str(), Some("staging.verisync.co"));
        assert!(VerisyncConfig::with_base_url("not a url").is_err());
    }
}
