use clap::Parser;
use flight_search::{ChromeTransport, Config, FlightSearch};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flight-search")]
#[command(about = "Goibibo flight search automation")]
#[command(version)]
struct Cli {
    /// Config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Use logged-in session
    #[arg(long)]
    login: bool,

    /// Chrome user data directory for logged-in session
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Origin city name
    #[arg(long)]
    from: Option<String>,

    /// Origin airport code
    #[arg(long)]
    from_code: Option<String>,

    /// Destination city name
    #[arg(long)]
    to: Option<String>,

    /// Destination airport code
    #[arg(long)]
    to_code: Option<String>,

    /// Departure date, in days from today
    #[arg(long)]
    days: Option<u32>,

    /// Screenshot directory
    #[arg(long, value_name = "DIR")]
    screenshots: Option<PathBuf>,

    /// Log file, appended to on every run
    #[arg(long, default_value = "flight_search.log")]
    log_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors on the console)
    #[arg(short, long)]
    quiet: bool,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Print the run result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if self.headless {
            config.browser.headless = true;
        }
        if self.login {
            config.browser.use_login_session = true;
        }
        if let Some(ref dir) = self.user_data_dir {
            config.browser.profile_dir = Some(dir.clone());
        }
        if let Some(ref city) = self.from {
            config.search.origin_city = city.clone();
        }
        if let Some(ref code) = self.from_code {
            config.search.origin_code = code.clone();
        }
        if let Some(ref city) = self.to {
            config.search.destination_city = city.clone();
        }
        if let Some(ref code) = self.to_code {
            config.search.destination_code = code.clone();
        }
        if let Some(days) = self.days {
            config.search.departure_days = days;
        }
        if let Some(ref dir) = self.screenshots {
            config.artifacts.dir = dir.clone();
        }
    }
}

/// Console output filtered by verbosity (or `RUST_LOG`), plus a plain-text
/// log file at info level.
fn init_logging(cli: &Cli) -> anyhow::Result<WorkerGuard> {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let dir = match cli.log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = cli
        .log_file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("invalid log file: {}", cli.log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::INFO),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    if cli.check {
        let search = &config.search;
        println!("Config valid");
        println!(
            "  Route: {} ({}) -> {} ({})",
            search.origin_city, search.origin_code, search.destination_city, search.destination_code
        );
        println!("  Departure: today + {} days", search.departure_days);
        println!(
            "  Mode: {}",
            if config.browser.use_login_session { "Login" } else { "Guest" }
        );
        println!("  Screenshots: {}", config.artifacts.dir.display());
        return Ok(());
    }

    let guard = init_logging(&cli)?;
    info!("Starting Goibibo Flight Search");

    let result = FlightSearch::new(config).run::<ChromeTransport>().await;
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            error!("Could not start browser session: {}", e);
            drop(guard);
            return Err(e.into());
        }
    };

    if result.success() {
        info!("Flight search completed successfully!");
    } else {
        error!("Flight search failed.");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        if result.success() {
            println!("✓ Success");
        } else {
            println!("✗ Failed");
            if let (Some(step), Some(reason)) = (result.failed_step(), result.failure_reason()) {
                println!("  Step: {}", step);
                println!("  Error: {}", reason);
            }
        }
        println!("  Steps: {}", result.steps_executed);
        println!("  Duration: {}ms", result.duration_ms);
        println!("  Screenshots: {}", result.artifacts.len());
        for artifact in &result.artifacts {
            println!("    - {}", artifact.path.display());
        }
    }

    drop(guard);
    if !result.success() {
        std::process::exit(1);
    }

    Ok(())
}
