use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use verisync::{
    Callbacks, DEFAULT_BASE_URL, VerificationRequest, Verisync, VerisyncConfig,
    is_completion_redirect,
    loopback::{LoopbackConfig, LoopbackOutcome, LoopbackPort},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Verisync identity verification from the terminal")]
struct Cli {
    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the verification URL for a request
    Url(RequestArgs),
    /// Check whether a redirect URL marks the flow as completed
    Check {
        /// URL the browser navigated to
        url: String,
    },
    /// Open verification in the system browser and wait for the redirect
    Open {
        #[command(flatten)]
        request: RequestArgs,

        /// Local port for the redirect listener (0 picks a free one)
        #[arg(long, default_value_t = 4000)]
        port: u16,

        /// Print the URL without opening a browser
        #[arg(long)]
        no_browser: bool,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Client identifier issued by Verisync
    #[arg(long)]
    client_id: String,

    /// Verification flow to run
    #[arg(long)]
    flow_id: String,

    /// Where the service redirects when the flow ends (replaced by `open`)
    #[arg(long)]
    redirect_url: Option<String>,

    /// Email to prefill
    #[arg(long)]
    email: Option<String>,

    /// JSON object forwarded to the service
    #[arg(long)]
    metadata: Option<String>,

    /// Synchronizer endpoint
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl RequestArgs {
    fn into_verisync(self, callbacks: Callbacks) -> Result<Verisync> {
        let mut request = VerificationRequest::new()
            .client_id(self.client_id)
            .flow_id(self.flow_id)
            .redirect_url(self.redirect_url.unwrap_or_default())
            .maybe_email(self.email)
            .build();
        if let Some(raw) = self.metadata {
            let metadata: Value = serde_json::from_str(&raw)
                .into_diagnostic()
                .wrap_err("--metadata is not valid JSON")?;
            request = request.with_metadata(&metadata)?;
        }
        let config = VerisyncConfig::with_base_url(&self.base_url)?;
        Ok(Verisync::new(request, callbacks).with_config(config))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Url(request) => {
            let mut verisync = request.into_verisync(Callbacks::new())?;
            println!("{}", verisync.start()?);
        }
        Command::Check { url } => {
            if is_completion_redirect(&url) {
                println!("completed");
            } else {
                println!("pending");
                std::process::exit(1);
            }
        }
        Command::Open {
            request,
            port,
            no_browser,
            timeout_secs,
        } => {
            let mut verisync = request.into_verisync(
                Callbacks::new().on_completed(|| tracing::info!("redirect carried completion marker")),
            )?;
            let port = match port {
                0 => LoopbackPort::Ephemeral,
                p => LoopbackPort::Fixed(p),
            };
            let outcome = verisync
                .run_with_local_server(LoopbackConfig {
                    port,
                    open_browser: !no_browser,
                    timeout_ms: timeout_ms(timeout_secs),
                    ..Default::default()
                })
                .await?;
            match outcome {
                LoopbackOutcome::Completed => println!("verification completed"),
                LoopbackOutcome::TimedOut => {
                    return Err(miette!(
                        help = "rerun with a larger --timeout-secs",
                        "no completion redirect within {}s",
                        timeout_secs
                    ));
                }
            }
        }
    }

    Ok(())
}

fn timeout_ms(secs: u64) -> u64 {
    secs.saturating_mul(1000)
}
