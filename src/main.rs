//! askops - ask a local Ollama server short sysadmin questions.
//!
//! Sends the question to the Ollama generate API, prints the one-line answer,
//! and appends the exchange to `chat_history.txt`.

mod config;
mod dispatch;
mod history;
mod protocol;
mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, HistoryConfig};
use dispatch::{Dispatcher, Reply};
use history::{History, LogRecord, HISTORY_FILE};
use protocol::Endpoint;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use transport::{FallbackSource, HttpTransport, Resolver};

#[derive(Parser)]
#[command(name = "askops")]
#[command(author, version, about = "Send a prompt to a local Ollama server")]
#[command(long_about = "Send a prompt to a local Ollama server.\n\nThe answer is printed as a single line and the exchange is appended to chat_history.txt next to the executable.")]
struct Cli {
    /// The prompt to send to the model
    #[arg(value_name = "PROMPT", required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// The model to use (default: gemma3:12b)
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Ollama server URL (default: http://localhost:11434)
    #[arg(long, value_name = "URL")]
    host: Option<String>,

    /// Per-attempt timeout in seconds (default: 10)
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Never retry against the resolver's nameserver address
    #[arg(long)]
    no_fallback: bool,

    /// Do not append to the history file
    #[arg(long)]
    no_history: bool,

    /// Exit with status 1 when the server could not be reached
    #[arg(long)]
    strict: bool,

    /// Print debug diagnostics to stderr (added on top of RUST_LOG)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// The prompt words joined with single spaces.
    fn question(&self) -> String {
        self.prompt.join(" ")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    let model = cli.model.clone().unwrap_or_else(|| config.model.clone());
    let host = cli.host.as_deref().unwrap_or(&config.host);
    let endpoint = Endpoint::parse(host)?;
    let timeout = match cli.timeout {
        Some(secs) => Duration::from_secs(secs),
        None => config.timeout(),
    };
    if timeout.is_zero() {
        anyhow::bail!("timeout_secs must be at least 1");
    }
    let fallback = if cli.no_fallback {
        FallbackSource::Disabled
    } else {
        config.fallback.source()
    };
    debug!(
        "Using {} (model {}, timeout {:?}, fallback {:?})",
        endpoint, model, timeout, fallback
    );

    let transport = HttpTransport::new(timeout)?;
    let dispatcher = Dispatcher::new(Resolver::new(transport, fallback), endpoint);

    let question = cli.question();
    let reply = dispatcher.ask(&question, &model).await;
    println!(">> {}", reply.text());

    if config.history.enabled && !cli.no_history {
        record_history(&config.history, &model, &question, reply.text());
    }

    if let Reply::Unreachable(e) = &reply {
        if cli.strict {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Initialize diagnostics on stderr. HTTP client internals stay at warn.
fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` if set and valid, else the default; `--verbose` adds `askops=debug` on top.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = rust_log
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("askops=warn,reqwest=warn,hyper=warn,hyper_util=warn"));

    if !verbose {
        return filter;
    }
    match "askops=debug".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Append the exchange to history. Failures only produce a warning.
fn record_history(config: &HistoryConfig, model: &str, prompt: &str, response: &str) {
    let history = match &config.path {
        Some(path) => Ok(History::at(path)),
        None => History::beside_executable(),
    };

    let record = LogRecord::now(model, prompt, response);
    let result = history.and_then(|h| {
        debug!("Recording exchange in {}", h.path().display());
        h.append(&record)
    });
    if let Err(e) = result {
        eprintln!("Warning: Could not log to {}: {:#}", HISTORY_FILE, e);
    }
}
