use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use newsdesk::api::ApiClient;
use newsdesk::app::ViewState;
use newsdesk::config::Config;
use newsdesk::controller::Controller;
use newsdesk::predictions::MatchStore;
use newsdesk::render::TextPresenter;
use newsdesk::shell;

/// Synthetic app origin backing the browser-style location/history model.
const APP_ORIGIN: &str = "app://newsdesk/";

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Terminal news dashboard with composed feeds")]
struct Args {
    /// Config file path (defaults to ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the backend API base URL from the config
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Delete the saved match prediction store
    #[arg(long)]
    reset_store: bool,

    /// Render the current home view once and exit (no interactive loop)
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access on Unix; the store holds personal picks and notes
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }

    let store_path = config_dir.join("matches.json");
    if args.reset_store && store_path.exists() {
        std::fs::remove_file(&store_path).context("Failed to delete match store")?;
        println!("Match store reset.");
    }

    let client = ApiClient::new(&config.api_base)
        .with_context(|| format!("Invalid API base URL: {}", config.api_base))?;
    let store = MatchStore::new(&store_path);
    let state = ViewState::new(Url::parse(APP_ORIGIN).context("Invalid app origin")?);
    let presenter = TextPresenter::stdout();

    let mut controller = Controller::new(state, client, store, presenter, config.home_feeds.clone());

    if args.once {
        controller.dispatch().await;
        return Ok(());
    }

    println!("newsdesk — type `help` for commands.");
    let refresh_interval = Duration::from_secs(config.refresh_interval_minutes * 60);
    shell::run(&mut controller, refresh_interval).await?;

    println!("Goodbye!");
    Ok(())
}
