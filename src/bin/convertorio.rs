//! CLI binary for the convertorio SDK.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`/`ConversionRequest`, renders workflow events as a
//! terminal spinner, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use convertorio::{
    ClientConfig, ConversionRequest, ConvertorioClient, Event, EventKind, JobStatus, ListJobsQuery,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (output lands next to the input)
  convertorio convert photo.png --to webp

  # Explicit output path and quality
  convertorio convert photo.png --to jpg -o out/photo.jpg --quality 85

  # Check points balance
  convertorio account

  # Recent failed jobs
  convertorio jobs --status failed --limit 10

ENVIRONMENT VARIABLES:
  CONVERTORIO_API_KEY    API key (create one at https://convertorio.com/account)
  CONVERTORIO_BASE_URL   Override the API root (staging, self-hosted)
"#;

/// Convert images with the Convertorio API.
#[derive(Parser, Debug)]
#[command(
    name = "convertorio",
    version,
    about = "Convert images with the Convertorio API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// API key; falls back to CONVERTORIO_API_KEY.
    #[arg(long, env = "CONVERTORIO_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API root override.
    #[arg(long, env = "CONVERTORIO_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress the progress spinner.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local image file.
    Convert {
        /// Path to the input file.
        input: PathBuf,

        /// Target format: jpg, png, webp, avif, ico, ...
        #[arg(long = "to", value_name = "FORMAT")]
        target_format: String,

        /// Output path (defaults to the input path with the new extension).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression quality 1-100 (JPG, WebP, AVIF).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        quality: Option<u32>,

        /// Target aspect ratio: original, 1:1, 4:3, 16:9, 9:16, 21:9.
        #[arg(long)]
        aspect_ratio: Option<String>,

        /// Crop strategy: fit, crop-center, crop-top, crop-bottom, crop-left, crop-right.
        #[arg(long)]
        crop_strategy: Option<String>,

        /// Icon size in pixels for ICO output: 16, 32, 48, 64, 128, 256.
        #[arg(long)]
        icon_size: Option<u32>,

        /// Polling attempt budget.
        #[arg(long, default_value_t = 60)]
        max_attempts: u32,

        /// Polling interval in milliseconds.
        #[arg(long, default_value_t = 2000)]
        poll_interval: u64,
    },
    /// Show account details and points balance.
    Account,
    /// List conversion jobs.
    Jobs {
        /// Number of jobs to return.
        #[arg(long)]
        limit: Option<u32>,

        /// Pagination offset.
        #[arg(long)]
        offset: Option<u32>,

        /// Filter by status: queued, processing, completed, failed, expired.
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Spinner and INFO logs fight over the terminal; keep one of them.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let client = build_client(&cli)?;

    match &cli.command {
        Command::Convert {
            input,
            target_format,
            output,
            quality,
            aspect_ratio,
            crop_strategy,
            icon_size,
            ..
        } => {
            let mut request = ConversionRequest::new(input, target_format);
            if let Some(output) = output {
                request = request.output_path(output);
            }
            if let Some(q) = quality {
                request = request.option("quality", *q);
            }
            if let Some(r) = aspect_ratio {
                request = request.option("aspect_ratio", r.as_str());
            }
            if let Some(c) = crop_strategy {
                request = request.option("crop_strategy", c.as_str());
            }
            if let Some(s) = icon_size {
                request = request.option("icon_size", *s);
            }

            if !cli.quiet {
                attach_spinner(&client);
            }

            let result = client.convert(&request).await.context("Conversion failed")?;

            eprintln!(
                "{}  {} → {}  {}",
                green("✔"),
                result.source_format,
                result.target_format,
                bold(&result.output_path.display().to_string()),
            );
            eprintln!(
                "   {} bytes{}",
                dim(&result.file_size.to_string()),
                result
                    .processing_time_ms
                    .map(|ms| dim(&format!("  —  converted in {ms}ms")))
                    .unwrap_or_default(),
            );
        }

        Command::Account => {
            let account = client.get_account().await.context("Failed to get account")?;
            println!("Email:   {}", account.email);
            if let Some(ref name) = account.name {
                println!("Name:    {name}");
            }
            if let Some(ref plan) = account.plan {
                println!("Plan:    {plan}");
            }
            if let Some(points) = account.points {
                println!("Points:  {points}");
            }
            if let Some(remaining) = account.daily_conversions_remaining {
                println!("Today:   {remaining} conversions remaining");
            }
            if let Some(total) = account.total_conversions {
                println!("Total:   {total} conversions");
            }
        }

        Command::Jobs {
            limit,
            offset,
            status,
        } => {
            let mut query = ListJobsQuery::default();
            if let Some(limit) = limit {
                query = query.limit(*limit);
            }
            if let Some(offset) = offset {
                query = query.offset(*offset);
            }
            if let Some(status) = status {
                query = query.status(JobStatus::from(status.clone()));
            }

            let jobs = client.list_jobs(&query).await.context("Failed to list jobs")?;
            if jobs.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }
            for job in jobs {
                let marker = match job.status {
                    JobStatus::Completed => green("✔"),
                    JobStatus::Failed | JobStatus::Expired => red("✗"),
                    _ => dim("…"),
                };
                println!(
                    "{marker} {}  {:<10}  {} → {}",
                    job.id,
                    job.status,
                    job.source_format.as_deref().unwrap_or("?"),
                    job.target_format.as_deref().unwrap_or("?"),
                );
            }
        }
    }

    Ok(())
}

fn build_client(cli: &Cli) -> Result<ConvertorioClient> {
    let mut builder = ClientConfig::builder().api_key(cli.api_key.clone().unwrap_or_default());
    if let Some(ref base_url) = cli.base_url {
        builder = builder.base_url(base_url);
    }
    if let Command::Convert {
        max_attempts,
        poll_interval,
        ..
    } = &cli.command
    {
        builder = builder
            .max_attempts(*max_attempts)
            .poll_interval_ms(*poll_interval);
    }
    let config = builder.build().context(
        "Missing API key. Pass --api-key or set CONVERTORIO_API_KEY \
         (create one at https://convertorio.com/account)",
    )?;
    ConvertorioClient::new(config).context("Failed to build HTTP client")
}

/// Render workflow events as a single bottom-anchored spinner.
fn attach_spinner(client: &ConvertorioClient) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.enable_steady_tick(Duration::from_millis(80));

    {
        let bar = bar.clone();
        client.on(EventKind::Start, move |event| {
            if let Event::Start {
                file_name,
                source_format,
                target_format,
                ..
            } = event
            {
                bar.set_prefix("Converting");
                bar.set_message(format!("{file_name} ({source_format} → {target_format})"));
            }
        });
    }
    {
        let bar = bar.clone();
        client.on(EventKind::Progress, move |event| {
            if let Event::Progress { step, .. } = event {
                bar.set_message(step.as_str().to_string());
            }
        });
    }
    {
        let bar = bar.clone();
        client.on(EventKind::Status, move |event| {
            if let Event::Status {
                status,
                attempt,
                max_attempts,
                ..
            } = event
            {
                bar.set_message(format!("{status} (poll {attempt}/{max_attempts})"));
            }
        });
    }
    {
        let bar = bar.clone();
        client.on(EventKind::Complete, move |_| {
            bar.finish_and_clear();
        });
    }
    client.on(EventKind::Error, move |event| {
        bar.finish_and_clear();
        if let Event::Error { message, .. } = event {
            eprintln!("{} {}", red("✗"), message);
        }
    });
}
