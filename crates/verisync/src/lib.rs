//! Session controller for the Verisync identity-verification ("KYC") flow.
//!
//! A host application shows a trigger; activating it builds a verification
//! URL from caller-supplied identifiers and opens a modal with an embedded
//! browser pointed at that URL. Every navigation the browser reports is
//! checked for the `verisync-redirect` sentinel, which marks completion.
//!
//! Rendering is left to the host. The host observes [`Verisync::state`],
//! forwards navigation URLs to [`Verisync::handle_navigation`], and wires its
//! buttons through [`trigger::Pressable`].
//!
//! ```
//! use verisync::{Callbacks, VerificationRequest, Verisync};
//!
//! let request = VerificationRequest::new()
//!     .client_id("c1")
//!     .flow_id("f1")
//!     .redirect_url("https://app.example/done")
//!     .build();
//! let mut verisync = Verisync::new(request, Callbacks::new().on_completed(|| println!("done")));
//!
//! let url = verisync.start().unwrap();
//! assert!(url.as_str().starts_with("https://app.verisync.co/synchronizer?client_id=c1"));
//!
//! assert!(verisync.handle_navigation("https://app.example/done?verisync-redirect"));
//! assert!(!verisync.is_visible());
//! ```

pub mod config;
pub mod error;
pub mod redirect;
pub mod request;
pub mod session;
pub mod trigger;

#[cfg(feature = "loopback")]
pub mod loopback;

pub use config::{Presentation, VerisyncConfig};
pub use error::{ConfigError, RequiredField, Result, VerisyncError};
pub use redirect::is_completion_redirect;
pub use request::VerificationRequest;
pub use session::{Callbacks, VerificationState, Verisync};

/// Verification service entry point.
pub const DEFAULT_BASE_URL: &str = "https://app.verisync.co/synchronizer";

/// Query key whose presence on a navigated URL marks the flow as finished.
pub const REDIRECT_SENTINEL: &str = "verisync-redirect";
