//! # auto-tech-blog
//!
//! Command-line entry point. Generates one blog post into `--output-dir`, or
//! with `--compression-stats` reports accumulated image savings.
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=your-key auto-tech-blog --output-dir ./site
//! ```

use auto_tech_blog::cli::Cli;
use auto_tech_blog::compression::{compression_log_path, compression_stats};
use auto_tech_blog::config::{GeminiSettings, PipelineConfig};
use auto_tech_blog::utils::ensure_writable_dir;
use auto_tech_blog::{GeminiClient, Pipeline};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(
        output_dir = ?args.output_dir,
        date = ?args.date,
        seed = ?args.seed,
        "Parsed CLI arguments"
    );

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Blog post generation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> auto_tech_blog::Result<()> {
    let config = PipelineConfig::from(&args);

    if args.compression_stats {
        let stats = compression_stats(&compression_log_path(&config.asset_dir())).await;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let gemini = GeminiSettings::try_from(&args)?;
    ensure_writable_dir(&config.output_dir).await?;

    info!(
        output_dir = %config.output_dir.display(),
        date = %config.date,
        "Starting blog post generation"
    );
    let model = GeminiClient::new(reqwest::Client::new(), gemini);
    let post = Pipeline::new(model, config)?.run().await?;

    println!("Generated: {}", post.folder_name);
    println!("Title: {}", post.metadata.title);
    println!("Reading time: {}", post.metadata.reading_time);
    Ok(())
}
