use std::fmt;

use url::Url;

use crate::{
    config::{Presentation, VerisyncConfig},
    error::Result,
    redirect::is_completion_redirect,
    request::VerificationRequest,
};

/// Zero-argument notification supplied by the host.
pub type Callback = Box<dyn FnMut() + 'static>;

/// Optional notifications fired on the way out of a session.
#[derive(Default)]
pub struct Callbacks {
    on_completed: Option<Callback>,
    on_close: Option<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired when a navigation carries the completion sentinel.
    pub fn on_completed(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_completed = Some(Box::new(f));
        self
    }

    /// Fired when the user closes the modal through the close control.
    pub fn on_close(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub(crate) fn completed(&mut self) {
        if let Some(f) = self.on_completed.as_mut() {
            f();
        }
    }

    pub(crate) fn closed(&mut self) {
        if let Some(f) = self.on_close.as_mut() {
            f();
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_completed", &self.on_completed.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Whether the verification modal is showing, and what it is showing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum VerificationState {
    #[default]
    Hidden,
    Visible { url: Url },
}

impl VerificationState {
    pub fn is_visible(&self) -> bool {
        matches!(self, VerificationState::Visible { .. })
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            VerificationState::Visible { url } => Some(url),
            VerificationState::Hidden => None,
        }
    }
}

/// Controller behind the verification trigger and its modal.
///
/// All methods are synchronous reactions to host events. The host renders
/// the modal from [`state`](Self::state) and reports navigations from its
/// embedded browser to [`handle_navigation`](Self::handle_navigation).
#[derive(Debug)]
pub struct Verisync {
    request: VerificationRequest,
    config: VerisyncConfig,
    presentation: Presentation,
    callbacks: Callbacks,
    state: VerificationState,
}

impl Verisync {
    pub fn new(request: VerificationRequest, callbacks: Callbacks) -> Self {
        Self {
            request,
            config: VerisyncConfig::default(),
            presentation: Presentation::default(),
            callbacks,
            state: VerificationState::Hidden,
        }
    }

    pub fn with_config(mut self, config: VerisyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// Caller-supplied values used by the next start action.
    pub fn request(&self) -> &VerificationRequest {
        &self.request
    }

    /// Update caller-supplied values. A session already open is unaffected.
    pub fn request_mut(&mut self) -> &mut VerificationRequest {
        &mut self.request
    }

    pub fn config(&self) -> &VerisyncConfig {
        &self.config
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn verification_url(&self) -> Option<&Url> {
        self.state.url()
    }

    /// Build a fresh verification URL and show the modal.
    ///
    /// Fails with a configuration error, leaving the state untouched, if any
    /// required field is empty. Starting while visible replaces the URL.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(client_id = %self.request.client_id, flow_id = %self.request.flow_id)))]
    pub fn start(&mut self) -> Result<Url> {
        let url = match self.request.verification_url(&self.config) {
            Ok(url) => url,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "refusing to start verification");
                return Err(e);
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(%url, "verification started");

        self.state = VerificationState::Visible { url: url.clone() };
        Ok(url)
    }

    /// React to the embedded browser navigating to `url`.
    ///
    /// Returns true if the navigation completed the flow, in which case the
    /// completion callback has fired and the modal is hidden. Navigations
    /// while hidden are ignored.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub fn handle_navigation(&mut self, url: &str) -> bool {
        if !self.is_visible() || !is_completion_redirect(url) {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::info!("verification completed");

        self.callbacks.completed();
        self.state = VerificationState::Hidden;
        true
    }

    /// Close through the close control: fires `on_close`, then hides.
    ///
    /// Returns false without firing anything if already hidden.
    pub fn close(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("verification closed by user");

        self.callbacks.closed();
        self.state = VerificationState::Hidden;
        true
    }

    /// Hide and lend out the callbacks, so a holder of a `RefCell` borrow can
    /// release it before firing them. Hand them back with `reattach`.
    pub(crate) fn hide_detached(&mut self) -> Option<Callbacks> {
        if !self.is_visible() {
            return None;
        }
        self.state = VerificationState::Hidden;
        Some(std::mem::take(&mut self.callbacks))
    }

    pub(crate) fn reattach(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    /// Host-level dismissal (back gesture, system close). No callbacks fire.
    pub fn dismiss(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("verification dismissed by host");

        self.state = VerificationState::Hidden;
        true
    }
}
