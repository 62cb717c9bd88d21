//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tokio::net::TcpListener;
use tracing::{info, warn};

use linkcatalog_analysis::{ContentAnalyzer, OpenAiAnalyzer};
use linkcatalog_catalog::{CatalogWriter, GitHubStore};
use linkcatalog_core::{Controller, InMemorySessionStore};
use linkcatalog_extractor::{ContentExtractor, LinkExtractor};
use linkcatalog_shared::{
    AppConfig, GitHubConfig, OpenAiConfig, TelegramConfig, config_file_path, init_config_at,
    load_config, load_config_from, read_secret,
};
use linkcatalog_telegram::TelegramClient;

use crate::dispatch::{self, TelegramSink};
use crate::health::{self, HealthState, ServiceStatus};
use crate::shutdown;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Link catalog bot: turn shared links into a categorized catalog.
#[derive(Parser)]
#[command(
    name = "linkcatalog",
    version,
    about = "Chat bot that files shared links into a JSON catalog on GitHub.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.linkcatalog/linkcatalog.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the bot and the health endpoint until interrupted.
    Serve,

    /// Extract one URL and print the result as JSON.
    Extract {
        /// Link to extract.
        url: String,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "linkcatalog=info",
        1 => "linkcatalog=debug",
        _ => "linkcatalog=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve => cmd_serve(resolve_config(cli.config.as_deref())?).await,
        Command::Extract { url } => {
            cmd_extract(resolve_config(cli.config.as_deref())?, &url).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(cli.config.as_deref(), force),
            ConfigAction::Show => cmd_config_show(resolve_config(cli.config.as_deref())?),
        },
    }
}

/// Load the config file and apply environment overrides.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| eyre!("invalid PORT {port:?}: {e}"))?;
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

fn build_analyzer(config: &OpenAiConfig) -> Result<Option<Arc<dyn ContentAnalyzer>>> {
    let Some(key) = read_secret(&config.api_key_env) else {
        warn!(
            var = %config.api_key_env,
            "no API key, model analysis disabled (pages keep their raw description)"
        );
        return Ok(None);
    };

    let analyzer: Arc<dyn ContentAnalyzer> = Arc::new(OpenAiAnalyzer::new(key, config)?);
    info!(model = %config.model, "content analysis enabled");
    Ok(Some(analyzer))
}

fn build_catalog(config: &GitHubConfig) -> Result<Option<CatalogWriter>> {
    let Some(token) = read_secret(&config.token_env) else {
        warn!(var = %config.token_env, "no GitHub token, catalog writes will fail");
        return Ok(None);
    };
    if !config.has_repository() {
        warn!("github.owner / github.repo not configured, catalog writes will fail");
        return Ok(None);
    }

    let store = GitHubStore::new(token, config)?;
    info!(
        repo = %format!("{}/{}", config.owner, config.repo),
        path = %config.path,
        "catalog storage enabled"
    );
    Ok(Some(CatalogWriter::new(Arc::new(store), config.path.clone())))
}

fn build_telegram(config: &TelegramConfig) -> Result<Option<TelegramClient>> {
    match read_secret(&config.token_env) {
        Some(token) => Ok(Some(TelegramClient::new(&token, config)?)),
        None => {
            warn!(var = %config.token_env, "no Telegram token, chat polling disabled");
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config: AppConfig) -> Result<()> {
    let analyzer = build_analyzer(&config.openai)?;
    let catalog = build_catalog(&config.github)?;
    let telegram = build_telegram(&config.telegram)?;
    let extractor: Arc<dyn LinkExtractor> =
        Arc::new(ContentExtractor::new(config.fetch.clone(), analyzer.clone())?);

    let status = ServiceStatus {
        telegram: telegram.is_some(),
        analysis: analyzer.is_some(),
        catalog: catalog.is_some(),
    };

    let stop = shutdown::listen();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("cannot bind health endpoint on {addr}: {e}"))?;
    info!(%addr, "health endpoint listening");
    let server = tokio::spawn(health::serve(
        listener,
        HealthState::new(status),
        shutdown::stopped(stop.clone()),
    ));

    match telegram {
        Some(client) => {
            match client.get_me().await {
                Ok(me) => info!(username = ?me.username, "AI Catalog Bot started"),
                Err(e) => warn!(error = %e, "could not identify bot account"),
            }

            let sink = Arc::new(TelegramSink::new(client.clone()));
            let mut controller =
                Controller::new(extractor, Arc::new(InMemorySessionStore::new()), sink);
            if let Some(catalog) = catalog {
                controller = controller.with_catalog(catalog);
            }
            if let Some(analyzer) = analyzer {
                controller = controller.with_analyzer(analyzer);
            }

            dispatch::run(client, Arc::new(controller), stop).await?;
        }
        None => shutdown::stopped(stop).await,
    }

    server.await??;
    info!("stopped");
    Ok(())
}

async fn cmd_extract(config: AppConfig, url: &str) -> Result<()> {
    let analyzer = build_analyzer(&config.openai)?;
    let extractor = ContentExtractor::new(config.fetch, analyzer)?;

    let content = extractor.extract(url).await?;
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

fn cmd_config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    if path.exists() && !force {
        println!(
            "Config already exists at: {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "linkcatalog",
            "extract",
            "https://example.com",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "/tmp/lc.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/lc.toml")));
        assert!(matches!(cli.command, Command::Extract { ref url } if url == "https://example.com"));
    }

    #[test]
    fn config_init_force_flag() {
        let cli = Cli::try_parse_from(["linkcatalog", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }

    #[test]
    fn missing_secrets_disable_integrations() {
        let openai = OpenAiConfig {
            api_key_env: "LINKCATALOG_TEST_UNSET_OPENAI".into(),
            ..OpenAiConfig::default()
        };
        assert!(build_analyzer(&openai).unwrap().is_none());

        let github = GitHubConfig {
            token_env: "LINKCATALOG_TEST_UNSET_GITHUB".into(),
            owner: "me".into(),
            repo: "catalog".into(),
            ..GitHubConfig::default()
        };
        assert!(build_catalog(&github).unwrap().is_none());

        let telegram = TelegramConfig {
            token_env: "LINKCATALOG_TEST_UNSET_TELEGRAM".into(),
            ..TelegramConfig::default()
        };
        assert!(build_telegram(&telegram).unwrap().is_none());
    }
}
