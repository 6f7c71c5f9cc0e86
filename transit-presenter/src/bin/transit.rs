//! Transit CLI - find the best departure or work schedule via the optimization backend
//!
//! Usage:
//!   transit [--api-key <KEY>] trip --origin <ADDR> --destination <ADDR> [window options]
//!   transit [--api-key <KEY>] work --origins <ADDR>... --destination <ADDR> \
//!       --work-duration-hours <H>
//!   transit page [--tab optimize-work]
//!
//! Example:
//!   transit --api-key AIza... trip --origin "1 Market St" --destination "SFO" \
//!       --window-start-time 07:00 --window-end-time 09:00 --out results.html

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use transit::page::{render_page, PageModel};
use transit::store::LocalStorage;
use transit::{FormFields, HttpBackend, Presenter, PresenterConfig, Tab};

const DEFAULT_CONFIG: &str = "transit.toml";

#[derive(Parser, Debug)]
#[command(
    name = "transit",
    version,
    about = "Find the fastest transit departure or commute schedule"
)]
struct Cli {
    /// Config file (default: transit.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Google Maps API key; saved for later runs
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Write HTML here instead of stdout
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// -v for debug logging, -vv for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shortest travel time within a departure window
    Trip(TripArgs),
    /// Round-trip schedule with the shortest total commute
    Work(WorkArgs),
    /// Render the full page for a tab
    Page {
        #[arg(long)]
        tab: Option<Tab>,
    },
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// YYYY-MM-DD (default: today)
    #[arg(long)]
    window_start_date: Option<String>,
    /// HH:MM (default: now)
    #[arg(long)]
    window_start_time: Option<String>,
    #[arg(long)]
    window_end_date: Option<String>,
    #[arg(long)]
    window_end_time: Option<String>,
}

#[derive(Args, Debug)]
struct TripArgs {
    #[arg(long)]
    origin: String,
    #[arg(long)]
    destination: String,
    #[command(flatten)]
    window: WindowArgs,
    #[arg(long)]
    departure_date: Option<String>,
    #[arg(long)]
    departure_time: Option<String>,
}

#[derive(Args, Debug)]
struct WorkArgs {
    /// Starting address; repeat for several
    #[arg(long = "origins", num_args = 1..)]
    origins: Vec<String>,
    /// File with one starting address per line
    #[arg(long)]
    origins_file: Option<PathBuf>,
    #[arg(long)]
    destination: String,
    #[arg(long)]
    work_duration_hours: String,
    #[command(flatten)]
    window: WindowArgs,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PresenterConfig> {
    let mut config = match path {
        Some(path) => PresenterConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            PresenterConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => PresenterConfig::default(),
    };

    if let Ok(base_url) = std::env::var("TRANSIT_BASE_URL") {
        config.base_url = base_url;
    }

    Ok(config)
}

fn apply_window(fields: &mut FormFields, window: WindowArgs) {
    let pairs = [
        ("window_start_date", window.window_start_date),
        ("window_start_time", window.window_start_time),
        ("window_end_date", window.window_end_date),
        ("window_end_time", window.window_end_time),
    ];
    for (name, value) in pairs {
        if let Some(value) = value {
            fields.set(name, value);
        }
    }
}

fn form_for(command: Command) -> Result<(Tab, FormFields)> {
    let now = Local::now().naive_local();

    match command {
        Command::Trip(args) => {
            let mut fields = FormFields::prefilled(Tab::OptimizeTrip, now)
                .with("origin", args.origin)
                .with("destination", args.destination);
            apply_window(&mut fields, args.window);
            // An explicitly requested departure replaces the pre-filled one
            match args.departure_date {
                Some(date) => {
                    fields.set("departure_date", date);
                    fields.set("departure_time", args.departure_time.unwrap_or_default());
                }
                None => fields.set("departure_date", ""),
            }
            Ok((Tab::OptimizeTrip, fields))
        }
        Command::Work(args) => {
            let mut origins = args.origins.join("\n");
            if let Some(path) = &args.origins_file {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read origins file: {}", path.display()))?;
                origins.push('\n');
                origins.push_str(&contents);
            }

            let mut fields = FormFields::prefilled(Tab::OptimizeWork, now)
                .with("origins", origins)
                .with("destination", args.destination)
                .with("work_duration_hours", args.work_duration_hours);
            apply_window(&mut fields, args.window);
            Ok((Tab::OptimizeWork, fields))
        }
        Command::Page { .. } => anyhow::bail!("page has no form to submit"),
    }
}

fn write_output(out: Option<&Path>, html: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, html)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;
    info!(base_url = %config.base_url, "Loaded configuration");

    let backend = HttpBackend::with_timeout(
        &config.base_url,
        config.request_timeout_secs.map(std::time::Duration::from_secs),
    );
    let storage = LocalStorage::from_config(config.storage_path.as_deref());
    let presenter = Presenter::new(config, Arc::new(backend), storage);

    if let Some(key) = cli.api_key {
        presenter.set_api_key(key).await;
    }

    if let Command::Page { tab } = &cli.command {
        if let Some(tab) = tab {
            presenter.switch_tab(*tab).await;
        }
        let model = PageModel::capture(&presenter, Local::now().naive_local()).await;
        return write_output(cli.out.as_deref(), &render_page(&model));
    }

    let (tab, fields) = form_for(cli.command)?;
    presenter.switch_tab(tab).await;

    eprintln!(
        "{} {} via {}",
        "Submitting".blue().bold(),
        tab.title(),
        presenter.config().endpoint_for(tab)
    );

    let outcome = presenter.submit(tab, &fields).await;
    debug!(outcome = ?outcome, "Submission finished");

    if let Some(alert) = outcome.alert() {
        eprintln!("{}", alert.red().bold());
        std::process::exit(1);
    }

    let view = presenter.view().await;
    write_output(cli.out.as_deref(), view.results.html())
}
