use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use launch_client::{
    ClientConfig, Correlation, CorrelationMode, ErrorSurface, HttpLaunchApi, LaunchError, LaunchOutcome, LaunchSession,
    LaunchView,
};

const BAR_WIDTH: usize = 30;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("health check failed with HTTP {0}")]
    Unhealthy(u16),
    #[error("launch stalled: {0}")]
    Stalled(String),
    #[error("launch failed: {0}")]
    Alerted(String),
    #[error("launch skipped; pass --email or use --correlation session_id|none")]
    Skipped,
}

#[derive(Parser, Debug)]
#[command(name = "launch-cli", about = "Launch a notebook and wait for its URL")]
struct Cli {
    /// Overrides `LAUNCH_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `LAUNCH_CORRELATION`.
    #[arg(long, value_parser = parse_correlation)]
    correlation: Option<CorrelationMode>,

    /// Overrides `LAUNCH_ERROR_SURFACE`.
    #[arg(long, value_parser = parse_surface)]
    error_surface: Option<ErrorSurface>,

    #[arg(long, help = "Hide the progress bar")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request a launch and follow it until the notebook URL is ready.
    Launch {
        #[arg(long)]
        email: Option<String>,
    },
    /// Poll an already started launch.
    Poll(PollArgs),
    Ping,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct PollArgs {
    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    session_id: Option<String>,
}

impl PollArgs {
    fn correlation(self) -> Option<Correlation> {
        self.email
            .map(Correlation::Email)
            .or_else(|| self.session_id.map(Correlation::SessionId))
    }
}

fn parse_correlation(raw: &str) -> Result<CorrelationMode, String> {
    launch_client::config::parse_correlation_mode(Some(raw)).map_err(|e| e.to_string())
}

fn parse_surface(raw: &str) -> Result<ErrorSurface, String> {
    launch_client::config::parse_error_surface(Some(raw)).map_err(|e| e.to_string())
}

/// Progress bar on stderr; the final URL goes to stdout so it can be piped.
struct TerminalView {
    quiet: bool,
}

impl LaunchView for TerminalView {
    fn disable_trigger(&self) {}

    fn show_progress(&self) {
        if !self.quiet {
            eprintln!("launching notebook...");
        }
    }

    fn render_progress(&self, value: u8) {
        if self.quiet {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r{}", render_bar(value));
        let _ = stderr.flush();
    }

    fn navigate(&self, url: &str) {
        if !self.quiet {
            eprintln!();
        }
        println!("{url}");
    }

    fn alert(&self, message: &str) {
        eprintln!("\n{message}");
    }
}

fn render_bar(value: u8) -> String {
    let value = value.min(100);
    let filled = BAR_WIDTH * usize::from(value) / 100;
    format!("[{}{}] {value:>3}%", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

fn outcome_result(outcome: LaunchOutcome) -> Result<(), CliError> {
    match outcome {
        LaunchOutcome::Redirected { .. } => Ok(()),
        LaunchOutcome::Stalled { reason } => Err(CliError::Stalled(reason)),
        LaunchOutcome::Alerted { message } => Err(CliError::Alerted(message)),
        LaunchOutcome::Skipped => Err(CliError::Skipped),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(mode) = cli.correlation {
        config.correlation_mode = mode;
    }
    if let Some(surface) = cli.error_surface {
        config.error_surface = surface;
    }

    let view = TerminalView { quiet: cli.quiet };
    match cli.command {
        Command::Launch { email } => run_launch(&config, &view, email.as_deref()).await,
        Command::Poll(args) => run_poll(&config, &view, args).await,
        Command::Ping => run_ping(&config).await,
    }
}

async fn run_launch(config: &ClientConfig, view: &TerminalView, email: Option<&str>) -> Result<(), CliError> {
    let api = HttpLaunchApi::new(&config.base_url, config.request_timeout)?;
    let mut session = LaunchSession::new(&api, view, config);
    outcome_result(session.start_process(email).await)
}

async fn run_poll(config: &ClientConfig, view: &TerminalView, args: PollArgs) -> Result<(), CliError> {
    let Some(correlation) = args.correlation() else {
        return Err(CliError::Skipped);
    };
    let api = HttpLaunchApi::new(&config.base_url, config.request_timeout)?;
    let mut session = LaunchSession::new(&api, view, config);
    view.show_progress();
    outcome_result(session.poll_for_url(correlation).await)
}

async fn run_ping(config: &ClientConfig) -> Result<(), CliError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout.min(Duration::from_secs(10)))
        .build()?;
    let url = format!("{}/healthz", config.base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
