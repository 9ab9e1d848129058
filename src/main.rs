use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ctfwatch::{Config, Secrets, Settings, Watcher};

#[derive(Parser)]
#[command(name = "ctfwatch")]
#[command(about = "Watch a CTF platform for new challenges and send Pushover notifications")]
#[command(
    long_about = "Watch a CTF platform for new challenges and send Pushover notifications.\n\n\
                  Requires the environment variables CTF_TOKEN, PUSHOVER_API_TOKEN and PUSHOVER_USER_KEY."
)]
#[command(version)]
struct Cli {
    /// CTF platform URL [default: https://ctf.donotecho.dev]
    #[arg(long)]
    url: Option<String>,

    /// CTF name, used as the challenge directory name [default: ctf_name]
    #[arg(long)]
    ctf_name: Option<String>,

    /// Base directory for downloaded challenges [default: .]
    #[arg(long)]
    dir: Option<String>,

    /// Time between checks, in seconds or as 30s, 2m, 1h [default: 15]
    #[arg(long)]
    interval: Option<String>,

    /// Alert sound file [default: alert.wav]
    #[arg(long)]
    sound: Option<String>,

    /// Downloader executable [default: ctfd-downloader]
    #[arg(long)]
    downloader: Option<String>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command line flags on top of file or default settings
    fn apply_to(&self, settings: &mut Settings) {
        let overrides = [
            (&self.url, &mut settings.url),
            (&self.ctf_name, &mut settings.ctf_name),
            (&self.dir, &mut settings.output_dir),
            (&self.interval, &mut settings.interval),
            (&self.sound, &mut settings.alert_sound),
            (&self.downloader, &mut settings.downloader),
        ];

        for (flag, setting) in overrides {
            if let Some(value) = flag {
                *setting = value.clone();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Arc::new(load_config(&cli)?);

    print_banner(&config);
    info!("Starting ctfwatch v{}", env!("CARGO_PKG_VERSION"));

    let watcher = Watcher::with_defaults(config)?;
    watcher.run().await
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Resolve settings file, CLI flags and environment secrets into one config
fn load_config(cli: &Cli) -> Result<Config> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default()?,
    };
    cli.apply_to(&mut settings);

    let secrets = Secrets::from_env()?;

    Config::new(settings, secrets)
}

fn print_banner(config: &Config) {
    println!("--- CTF Watcher with Pushover Notifications ---");
    println!("🔍 Watching: {}", config.url);
    println!("📁 Saving to: {}", config.content_dir().display());
    println!("⏱️  Check interval: {}s", config.interval.as_secs());
    println!("🚀 Watcher started. Press Ctrl+C to stop.");
}
