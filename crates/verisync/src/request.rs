use serde::Serialize;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use url::Url;

use crate::{
    config::VerisyncConfig,
    error::{ConfigError, RequiredField, Result, VerisyncError},
    redirect::with_sentinel,
};

/// Parameters for one verification session.
///
/// Snapshotted on every start action and discarded when the modal closes.
#[derive(Clone, Debug, PartialEq, bon::Builder)]
#[builder(start_fn = new)]
pub struct VerificationRequest {
    /// Client identifier issued by Verisync
    #[builder(into)]
    pub client_id: SmolStr,
    /// Verification flow to run
    #[builder(into)]
    pub flow_id: SmolStr,
    /// Where the service sends the user when the flow ends
    #[builder(into)]
    pub redirect_url: SmolStr,
    /// Prefills the flow's email field
    #[builder(into)]
    pub email: Option<SmolStr>,
    /// Arbitrary caller data forwarded to the service as JSON
    #[builder(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize)]
struct SynchronizerParameters<'a> {
    client_id: &'a str,
    flow_id: &'a str,
    redirect_url: String,
    email: &'a str,
    metadata: String,
}

impl VerificationRequest {
    /// Replace the metadata with any value that serializes to a JSON object.
    pub fn with_metadata<T: Serialize + ?Sized>(mut self, metadata: &T) -> Result<Self> {
        self.metadata = match serde_json::to_value(metadata)? {
            Value::Object(map) => map,
            Value::Null => return Err(VerisyncError::Metadata("null")),
            Value::Bool(_) => return Err(VerisyncError::Metadata("a boolean")),
            Value::Number(_) => return Err(VerisyncError::Metadata("a number")),
            Value::String(_) => return Err(VerisyncError::Metadata("a string")),
            Value::Array(_) => return Err(VerisyncError::Metadata("an array")),
        };
        Ok(self)
    }

    /// Check that every required field is non-empty.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        let missing: Vec<_> = [
            (RequiredField::ClientId, &self.client_id),
            (RequiredField::FlowId, &self.flow_id),
            (RequiredField::RedirectUrl, &self.redirect_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(missing))
        }
    }

    /// Build the synchronizer URL the embedded browser should load.
    ///
    /// Parameters are form-encoded in a fixed order:
    /// `client_id`, `flow_id`, `redirect_url`, `email`, `metadata`.
    pub fn verification_url(&self, config: &VerisyncConfig) -> Result<Url> {
        self.validate()?;

        let query = serde_html_form::to_string(SynchronizerParameters {
            client_id: &self.client_id,
            flow_id: &self.flow_id,
            redirect_url: with_sentinel(&self.redirect_url),
            email: self.email.as_deref().unwrap_or_default(),
            metadata: serde_json::to_string(&self.metadata)?,
        })?;

        let mut url = config.base_url.clone();
        url.set_query(Some(&query));
        Ok(url)
    }
}
