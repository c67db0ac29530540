use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use video_gen_proxy::{
    models::generation::GenerationRequest,
    services::{
        poller::{run_generation, PollConfig},
        proxy_client::{ProxyClient, DEFAULT_PROXY_URL},
    },
};

/// Submit a video generation request through the proxy and wait for the result.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Video width in pixels
    #[arg(long, default_value_t = 1920, value_parser = clap::value_parser!(u32).range(480..=3840))]
    width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 1080, value_parser = clap::value_parser!(u32).range(360..=2160))]
    height: u32,

    /// Duration in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(5..=300))]
    duration: u32,

    /// What the video should show
    #[arg(short, long)]
    description: String,

    /// Base URL of the proxy API
    #[arg(long, env = "PROXY_URL", default_value = DEFAULT_PROXY_URL)]
    proxy_url: String,

    /// Milliseconds between status checks
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Stop after this many status checks
    #[arg(long)]
    max_polls: Option<u32>,
}

fn validate_description(description: &str) -> Result<(), &'static str> {
    if description.trim().is_empty() {
        return Err("description must not be empty");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(message) = validate_description(&args.description) {
        eprintln!("Error: {message}");
        return ExitCode::FAILURE;
    }

    let client = ProxyClient::new(&args.proxy_url);
    let request = GenerationRequest {
        width: args.width,
        height: args.height,
        duration: args.duration,
        description: args.description,
    };
    let config = PollConfig {
        interval: Duration::from_millis(args.interval_ms),
        max_polls: args.max_polls,
    };

    let result = run_generation(&client, &request, &config, |progress| {
        println!("[{:>3}%] {}", progress.percent, progress.message);
    })
    .await;

    match result {
        Ok(video) => {
            println!("Prediction {} finished: {}", video.id, video.url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
