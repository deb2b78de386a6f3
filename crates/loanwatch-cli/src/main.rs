use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use loanwatch_core::classify::classify;
use loanwatch_core::format::{format_amount, format_date, format_risk_percent, summary_line};
use loanwatch_core::{ApplicationStore, Config, HttpBackend, Session, StatusFilter};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "loanwatch")]
#[command(version, about = "Live terminal dashboard for loan application review", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and LOANWATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the live dashboard (default)
    Dashboard,
    /// Fetch once and print the applications
    List {
        /// all, approved, review_required or rejected
        #[arg(long, default_value = "all")]
        filter: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Follow server changes and log every refresh
    Watch,
    /// Check that the backend is up
    Health,
    /// Ask the backend to wake every connected dashboard
    TriggerRefresh,
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Dashboard);

    // The dashboard owns the terminal, so its logs go to a file instead
    if matches!(command, Commands::Dashboard) {
        init_file_logging()?;
    } else {
        init_stderr_logging();
    }

    let config = load_config(cli.config.as_deref(), cli.api_url)?;
    tracing::debug!("Using backend at {}", config.api.base_url);

    match command {
        Commands::Dashboard => run_dashboard(config).await,
        Commands::List { filter, json } => run_list(config, &filter, json).await,
        Commands::Watch => run_watch(config).await,
        Commands::Health => run_health(config).await,
        Commands::TriggerRefresh => run_trigger_refresh(config).await,
        Commands::Config { save } => run_config(config, cli.config, save),
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "loanwatch=info".into())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_file_logging() -> anyhow::Result<()> {
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("loanwatch");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("loanwatch.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

fn load_config(path: Option<&std::path::Path>, cli_url: Option<String>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config.with_overrides(Config::env_api_url(), cli_url))
}

fn backend(config: &Config) -> anyhow::Result<Arc<HttpBackend>> {
    Ok(Arc::new(HttpBackend::from_base_url(&config.api.base_url)?))
}

async fn run_dashboard(config: Config) -> anyhow::Result<()> {
    let backend = backend(&config)?;
    let session = Session::start(backend.clone(), backend, &config.sync);
    let app = loanwatch_tui::App::new(session);
    loanwatch_tui::run_tui(app, config.ui.tick_rate()).await
}

#[derive(Serialize)]
struct ListedApplication<'a> {
    #[serde(flatten)]
    application: &'a loanwatch_core::LoanApplication,
    classification: loanwatch_core::Classification,
}

async fn run_list(config: Config, filter: &str, json: bool) -> anyhow::Result<()> {
    let filter: StatusFilter = filter.parse()?;

    let mut store = ApplicationStore::new(backend(&config)?);
    store.refresh().await;
    if let Some(error) = store.error() {
        anyhow::bail!("{}", error);
    }
    store.set_filter(filter);

    let rows = store.filtered_view();

    if json {
        let listed: Vec<ListedApplication> = rows
            .iter()
            .map(|application| ListedApplication {
                application,
                classification: classify(application),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    println!("{}", summary_line(store.applications().len()));
    if rows.is_empty() {
        println!("No applications found");
        return Ok(());
    }

    println!(
        "{:>6}  {:<24} {:>6} {:>16} {:>8}  {:<7} {:<16} {}",
        "ID", "APPLICANT", "SCORE", "AMOUNT", "RISK", "LEVEL", "STATUS", "CREATED"
    );
    for application in rows {
        let classification = classify(application);
        println!(
            "{:>6}  {:<24} {:>6} {:>16} {:>8}  {:<7} {:<16} {}",
            application.id,
            application.applicant_name,
            application.credit_score,
            format_amount(application.amount_requested),
            format_risk_percent(application.risk_factor),
            classification.risk_label,
            classification.status_label,
            format_date(&application.created_at),
        );
    }
    Ok(())
}

async fn run_watch(config: Config) -> anyhow::Result<()> {
    let backend = backend(&config)?;
    let mut session = Session::start(backend.clone(), backend, &config.sync);
    let mut sync_updates = session.sync_updates();

    tracing::info!("Watching {} (Ctrl-C to stop)", config.api.base_url);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                break;
            }
            _ = session.next_change() => {
                let store = session.store();
                match store.error() {
                    Some(error) => tracing::warn!("{}", error),
                    None => {
                        let counts = store.counts();
                        tracing::info!(
                            "{} (approved {}, review required {}, rejected {})",
                            summary_line(counts.all),
                            counts.approved,
                            counts.review_required,
                            counts.rejected
                        );
                    }
                }
            }
            Some(state) = next_sync_state(&mut sync_updates) => {
                tracing::info!("Sync {}", state);
            }
        }
    }

    session.stop();
    Ok(())
}

async fn next_sync_state(
    updates: &mut Option<tokio::sync::watch::Receiver<loanwatch_core::SyncState>>,
) -> Option<loanwatch_core::SyncState> {
    let receiver = updates.as_mut()?;
    if receiver.changed().await.is_err() {
        *updates = None;
        return None;
    }
    let state = *receiver.borrow_and_update();
    Some(state)
}

async fn run_health(config: Config) -> anyhow::Result<()> {
    let backend = backend(&config)?;
    let health = backend
        .client()
        .health()
        .await
        .with_context(|| format!("Backend at {} is not reachable", config.api.base_url))?;
    println!("{}: {}", config.api.base_url, health.status);
    Ok(())
}

async fn run_trigger_refresh(config: Config) -> anyhow::Result<()> {
    let backend = backend(&config)?;
    let response = backend
        .client()
        .trigger_refresh()
        .await
        .context("Failed to trigger refresh")?;
    println!("{}", response.message);
    Ok(())
}

fn run_config(config: Config, path: Option<PathBuf>, save: bool) -> anyhow::Result<()> {
    if save {
        let path = match path {
            Some(path) => path,
            None => Config::config_path()?,
        };
        config.save_to(&path)?;
        println!("Saved config to {}", path.display());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
