//! Querysmith - AI-assisted advanced search commands
//!
//! Describe what you are looking for and get one advanced-search
//! command back, or ask for an explanation of a command you already
//! have.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use querysmith::config::Config;
use querysmith::core::normalizer::NormalizedReply;
use querysmith::error::QueryError;
use querysmith::service::KeywordService;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Model identifier override
    #[arg(short, long)]
    model: Option<String>,

    /// Dispatch deadline override in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one advanced-search command from a described intent
    Generate {
        /// What you are looking for, in your own words
        query: String,
    },
    /// Explain an advanced-search command you already have
    Explain {
        /// The search command to explain
        command: String,
    },
    /// Check that the model endpoint is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🔎 Querysmith v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.deadline_ms = timeout_ms;
    }
    if config.api_url.trim().is_empty() {
        return Err(QueryError::Config("api_url must not be empty".to_string()).into());
    }

    let service = KeywordService::new(config);

    match args.command {
        Command::Generate { query } => {
            let reply = service.generate(&query).await;
            render(reply);
        }
        Command::Explain { command } => {
            let reply = service.explain(&command).await;
            render(reply);
        }
        Command::Health => {
            if service.health_check().await {
                println!("endpoint reachable");
            } else {
                println!("endpoint NOT reachable");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn render(reply: Result<NormalizedReply, QueryError>) {
    match reply {
        Ok(reply) => {
            if reply.is_degraded() {
                println!("(low confidence - the model reply did not match the expected shape)");
            }
            println!("keyword:     {}", reply.record.keyword);
            println!("explanation: {}", reply.record.explanation);
        }
        // Each failure class gets its own message; never collapse them
        Err(QueryError::Timeout { elapsed_ms }) => {
            eprintln!("The request timed out after {}ms. Please try again later.", elapsed_ms);
            std::process::exit(1);
        }
        Err(QueryError::Transport { message, code }) => {
            eprintln!("The service is unavailable ({}): {}", code, message);
            std::process::exit(1);
        }
        Err(QueryError::Http {
            status,
            status_text,
            body_preview,
        }) => {
            eprintln!("The model endpoint returned {} {}: {}", status, status_text, body_preview);
            std::process::exit(1);
        }
        Err(QueryError::Envelope { detail }) => {
            eprintln!("The model endpoint replied in an unexpected shape: {}", detail);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
