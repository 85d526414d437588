use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use prbot_core::{BotConfig, HandlerResponse, ReviewResult};
use prbot_github::GitHubClient;
use prbot_review::handler::{handle_event, HandlerOptions};
use prbot_review::llm::LlmClient;
use prbot_review::pipeline::ReviewModel;
use prbot_review::reviewer::{FixedReviewer, LlmReviewer};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "prbot",
    version,
    about = "Pull request reviewer driven by webhook events",
    long_about = "prbot reviews a pull request when a webhook event arrives and keeps a single\n\
                  AI review comment on it up to date.\n\n\
                  Examples:\n  \
                    prbot handle --event event.json     Handle one webhook envelope\n  \
                    cat event.json | prbot handle       Same, reading from stdin\n  \
                    prbot simulate                      Run the sample event offline\n  \
                    prbot simulate --review r.json      Offline, with a canned review"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .prbot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one `{"body": "<webhook json>"}` envelope and print the response
    Handle {
        /// Envelope file (reads stdin when omitted)
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Run the sample pull request event with every GitHub call suppressed
    Simulate {
        /// Review this changeset text instead of the stub
        #[arg(long)]
        changeset: Option<PathBuf>,
        /// Use a prepared `{pullRequestDescription, feedback}` file instead of the model
        #[arg(long)]
        review: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn sample_envelope() -> String {
    let body = serde_json::json!({
        "action": "opened",
        "pull_request": {
            "title": "Sample Pull Request Title",
            "number": 1,
            "body": "Sample Pull Request Description",
            "base": { "ref": "main" },
            "head": { "ref": "feature-branch" }
        },
        "repository": {
            "name": "sample-repo",
            "full_name": "user/sample-repo"
        }
    });
    serde_json::json!({ "body": body.to_string() }).to_string()
}

fn build_model(config: &BotConfig, review: Option<&Path>) -> Result<Box<dyn ReviewModel>> {
    match review {
        Some(path) => {
            let prepared: ReviewResult = serde_json::from_str(&read_file(path)?)
                .into_diagnostic()
                .wrap_err("review file must be {\"pullRequestDescription\", \"feedback\"} JSON")?;
            Ok(Box::new(FixedReviewer::new(prepared)))
        }
        None => {
            let llm = LlmClient::new(&config.llm).into_diagnostic()?;
            Ok(Box::new(LlmReviewer::new(llm)))
        }
    }
}

fn print_response(response: &HandlerResponse) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(response).into_diagnostic()?
    );
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = BotConfig::load(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Command::Handle { event } => {
            let raw = match event {
                Some(path) => read_file(&path)?,
                None => {
                    let mut input = String::new();
                    std::io::stdin()
                        .read_to_string(&mut input)
                        .into_diagnostic()
                        .wrap_err("failed to read event from stdin")?;
                    input
                }
            };

            let source = GitHubClient::new(&config).into_diagnostic()?;
            let model = build_model(&config, None)?;
            let options = HandlerOptions {
                offline: config.offline,
                changeset_override: None,
            };
            let report = handle_event(&raw, &source, &*model, &options).await;
            debug!(stage = %report.stage, failure = ?report.failure, "invocation finished");
            print_response(&report.response)?;
        }
        Command::Simulate { changeset, review } => {
            config.offline = true;
            let changeset_override = changeset.as_deref().map(read_file).transpose()?;

            let source = GitHubClient::new(&config).into_diagnostic()?;
            let model = build_model(&config, review.as_deref())?;
            let options = HandlerOptions {
                offline: true,
                changeset_override,
            };
            let report = handle_event(&sample_envelope(), &source, &*model, &options).await;
            debug!(stage = %report.stage, failure = ?report.failure, "simulation finished");
            print_response(&report.response)?;
        }
    }

    Ok(())
}
