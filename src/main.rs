use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use app_update::app_info::AppInfo;
use app_update::config::{EngineConfig, data_dir, db_path, log_path};
use app_update::update::engine::{CheckOutcome, UpdateEngine};
use app_update::update::presenter::{Presenter, UpdateAction, UserIntent};
use app_update::update::store::SqliteStore;
use app_update::version::sources::ItunesLookup;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "app-update")]
#[command(version, about = "Check the App Store for a newer version of an app")]
struct Cli {
    #[command(flatten)]
    app: AppArgs,

    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State database (defaults to the data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct AppArgs {
    /// Bundle identifier to look up
    #[arg(long, global = true, default_value = "com.example.app")]
    bundle_id: String,

    /// Installed version
    #[arg(long, global = true, default_value = "1.0")]
    installed: String,

    /// Installed build number
    #[arg(long, global = true, default_value = "1")]
    build: String,

    /// Display name
    #[arg(long, global = true, default_value = "App Name")]
    name: String,

    /// Storefront country code
    #[arg(long, global = true)]
    country: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Record a launch, then check if the update frequency allows it
    Launch,
    /// Check for an update
    Check {
        /// Ignore the update frequency
        #[arg(long)]
        force: bool,
    },
    /// Print the stored update state
    Status,
    /// Clear the stored update state
    Reset,
}

/// Prompts on the terminal and reads the chosen option from stdin
struct TerminalPresenter;

#[async_trait::async_trait]
impl Presenter for TerminalPresenter {
    async fn present(&self, action: &UpdateAction) -> UserIntent {
        let intents = action.offered_intents();

        let mut stdout = tokio::io::stdout();
        if let Err(e) = write_prompt(&mut stdout, &render_prompt(action)).await {
            warn!("Failed to write prompt: {}", e);
        }

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await;

        let chosen = read
            .ok()
            .and_then(|_| line.trim().parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| intents.get(i).copied());

        match chosen {
            Some(intent) => intent,
            None if action.allows_dismiss() => UserIntent::Dismiss,
            None => UserIntent::Update,
        }
    }
}

fn render_prompt(action: &UpdateAction) -> String {
    let mut prompt = format!("{}\n{}\n", action.title(), action.message());
    for (i, intent) in action.offered_intents().iter().enumerate() {
        prompt.push_str(&format!("  [{}] {}\n", i + 1, intent));
    }
    prompt.push_str("> ");
    prompt
}

/// Writes the prompt and flushes it so it shows before stdin is read
async fn write_prompt<W>(out: &mut W, prompt: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(prompt.as_bytes()).await?;
    out.flush().await
}

fn init_logging() -> anyhow::Result<WorkerGuard> {
    let path = log_path();
    let dir = path.parent().map(PathBuf::from).unwrap_or_else(data_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let file_name = path
        .file_name()
        .context("Log path has no file name")?
        .to_owned();
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {:?}", path))
}

fn describe(outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::NotDue => "Too early to check".to_string(),
        CheckOutcome::UpToDate => "Up to date".to_string(),
        CheckOutcome::Suppressed(reason) => format!("Update available, not shown ({:?})", reason),
        CheckOutcome::Presented { action, intent } => format!(
            "{} update to {}: {}",
            action.severity, action.version, intent
        ),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.clone().unwrap_or_else(db_path);
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;
    }
    let store = Arc::new(SqliteStore::new(&db_path)?);

    let config = load_config(cli.config.as_ref())?;
    let app = AppInfo {
        name: cli.app.name,
        version: cli.app.installed,
        build: cli.app.build,
        bundle_id: cli.app.bundle_id,
    };

    let mut source = ItunesLookup::for_bundle(&app.bundle_id)?;
    if let Some(country) = &cli.app.country {
        source = source.with_country(country);
    }

    let engine = UpdateEngine::new(
        &app,
        config,
        store,
        Arc::new(source),
        Arc::new(TerminalPresenter),
    );

    match cli.command {
        Command::Launch => {
            let outcome = engine.on_launch().await?;
            println!("{}", describe(&outcome));
        }
        Command::Check { force } => {
            let outcome = engine.check(force).await?;
            println!("{}", describe(&outcome));
        }
        Command::Status => {
            let history: BTreeMap<String, u32> = engine
                .launch_history()?
                .into_iter()
                .map(|(version, count)| (version.to_string(), count))
                .collect();
            let status = serde_json::json!({
                "installedVersion": engine.installed_version(),
                "lastCheckDate": engine.last_check_date()?.map(|d| d.to_rfc3339()),
                "skippedVersion": engine.skipped_version()?,
                "neverShowAgain": engine.never_show_again()?,
                "launchesForThisVersion": engine.launches_for_this_version()?,
                "launchHistory": history,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Reset => {
            engine.reset()?;
            info!("Update state reset for {}", engine.app_info().bundle_id);
            println!("Update state cleared");
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
