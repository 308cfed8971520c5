#![cfg(feature = "loopback")]

//! Desktop host for the verification flow.
//!
//! Stands in for the embedded browser: the verification page opens in the
//! system browser and the redirect lands on a one-shot local HTTP server,
//! whose requests are fed to [`Verisync::handle_navigation`].

use std::{net::SocketAddr, time::Duration};

use tokio::sync::mpsc;

use crate::{
    error::{Result, VerisyncError},
    session::Verisync,
};

/// Path the local server accepts redirects on.
pub const CALLBACK_PATH: &str = "/verisync/callback";

#[derive(Clone, Debug)]
pub enum LoopbackPort {
    Fixed(u16),
    Ephemeral,
}

#[derive(Clone, Debug)]
pub struct LoopbackConfig {
    pub host: String,
    pub port: LoopbackPort,
    pub open_browser: bool,
    pub timeout_ms: u64,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: LoopbackPort::Fixed(4000),
            open_browser: true,
            timeout_ms: 5 * 60 * 1000,
        }
    }
}

/// How a loopback-driven verification ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopbackOutcome {
    Completed,
    TimedOut,
}

#[cfg(feature = "browser-open")]
fn try_open_in_browser(url: &str) -> bool {
    webbrowser::open(url).is_ok()
}
#[cfg(not(feature = "browser-open"))]
fn try_open_in_browser(_url: &str) -> bool {
    false
}

fn callback_router(request: &rouille::Request, tx: &mpsc::Sender<String>) -> rouille::Response {
    if request.method() != "GET" || request.url() != CALLBACK_PATH {
        return rouille::Response::empty_404();
    }
    // full buffer means the controller is already behind; dropping is fine
    let _ = tx.try_send(request.raw_url().to_owned());
    rouille::Response::text("Verification redirect received. You can close this window.")
}

struct CallbackServer {
    addr: SocketAddr,
    stop: std::sync::mpsc::Sender<()>,
    rx: mpsc::Receiver<String>,
}

impl CallbackServer {
    fn bind(host: &str, port: u16) -> Result<Self> {
        let (tx, rx) = mpsc::channel(8);
        let server = rouille::Server::new((host, port), move |request| {
            callback_router(request, &tx)
        })
        .map_err(|e| VerisyncError::Loopback(e.to_string()))?;
        let addr = server.server_addr();
        let (_handle, stop) = server.stoppable();
        Ok(Self { addr, stop, rx })
    }

    fn shutdown(&self) {
        let _ = self.stop.send(());
    }
}

fn origin(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

impl Verisync {
    /// Drive a full verification through the system browser and a local
    /// redirect listener.
    ///
    /// Overwrites the request's `redirect_url` with the listener's callback
    /// URL; the caller's value is put back if the session fails to start.
    /// On timeout the modal is dismissed without firing callbacks.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(host = %cfg.host)))]
    pub async fn run_with_local_server(&mut self, cfg: LoopbackConfig) -> Result<LoopbackOutcome> {
        let port = match cfg.port {
            LoopbackPort::Fixed(p) => p,
            LoopbackPort::Ephemeral => 0,
        };
        let mut server = CallbackServer::bind(&cfg.host, port)?;
        let origin = origin(&cfg.host, server.addr.port());

        #[cfg(feature = "tracing")]
        tracing::info!(addr = %server.addr, "listening for verification redirect");

        let previous = std::mem::replace(
            &mut self.request_mut().redirect_url,
            format!("{origin}{CALLBACK_PATH}").into(),
        );
        let url = match self.start() {
            Ok(url) => url,
            Err(e) => {
                self.request_mut().redirect_url = previous;
                server.shutdown();
                return Err(e);
            }
        };

        println!("To verify your identity, visit:\n{url}\n");
        if cfg.open_browser {
            let _ = try_open_in_browser(url.as_str());
        }

        let deadline = deadline_after(tokio::time::Instant::now(), cfg.timeout_ms);
        let outcome = loop {
            match tokio::time::timeout_at(deadline, server.rx.recv()).await {
                Ok(Some(path)) => {
                    if self.handle_navigation(&format!("{origin}{path}")) {
                        break Ok(LoopbackOutcome::Completed);
                    }
                }
                Ok(None) => {
                    self.dismiss();
                    break Err(VerisyncError::Loopback(
                        "callback server stopped unexpectedly".into(),
                    ));
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(timeout_ms = cfg.timeout_ms, "verification timed out");
                    self.dismiss();
                    break Ok(LoopbackOutcome::TimedOut);
                }
            }
        };

        server.shutdown();
        outcome
    }
}

/// Longest wait honoured; larger timeouts are clamped to it.
const MAX_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

fn deadline_after(now: tokio::time::Instant, timeout_ms: u64) -> tokio::time::Instant {
    now + Duration::from_millis(timeout_ms).min(MAX_WAIT)
}
