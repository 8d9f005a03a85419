use std::path::PathBuf;

use clap::Parser;
use quizroyale::prelude::*;
use quizroyale::logging;

/// Real-time elimination quiz game server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), QuizError> {
    let args = Args::parse();
    logging::init(&args.log_level, args.json_logs)?;

    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    let mut builder = QuizServer::builder().config(config);
    if let Some(addr) = &args.bind {
        builder = builder.bind(addr);
    }
    let server = builder.build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
