//! linear-bridge - MCP server exposing Linear and GitHub tools over stdio.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bridge_core::config::{ImageMode, DEFAULT_GITHUB_URL};
use bridge_core::{Config, Credentials};
use bridge_github::GitHubClient;
use bridge_linear::LinearClient;
use bridge_mcp::{
    GitHubDefaults, ImageAnalyzer, InlineImageAnalyzer, McpServer, PlaceholderAnalyzer,
    ToolHandler,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linear-bridge")]
#[command(author, version, about = "MCP bridge between AI agents, Linear and GitHub", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout
    Serve {
        /// Run without GitHub tools (GITHUB_TOKEN not required)
        #[arg(long)]
        no_github: bool,
    },

    /// Print the tool registry as JSON
    Tools {
        /// Leave out the GitHub tools
        #[arg(long)]
        no_github: bool,
    },

    /// Inspect or change the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Get a value (e.g. github.owner)
    Get { key: String },

    /// Set a value (e.g. images.mode inline)
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command.unwrap_or(Commands::Serve { no_github: false }) {
        Commands::Serve { no_github } => serve(&config_path, !no_github).await,
        Commands::Tools { no_github } => {
            let tools = bridge_mcp::tools::registry(!no_github);
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
        Commands::Config { command } => run_config(&config_path, command),
    }
}

/// Logs go to stderr; stdout carries protocol traffic only.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config_path: &Path, with_github: bool) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    let credentials = Credentials::from_env(with_github)?;

    let handler = build_handler(&config, credentials);
    let mut server = McpServer::new(handler);
    server.run().await.context("MCP server failed")?;
    Ok(())
}

fn build_handler(config: &Config, credentials: Credentials) -> ToolHandler {
    let tracker = LinearClient::with_api_url(config.linear.api_url.clone(), credentials.linear_api_key);
    let analyzer = analyzer(config.images.mode, tracker.authorization());
    let mut handler = ToolHandler::new(Arc::new(tracker)).with_analyzer(analyzer);

    match credentials.github_token {
        Some(token) => {
            let base_url = config
                .github
                .as_ref()
                .and_then(|g| g.base_url.clone())
                .unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string());
            handler = handler.with_source_host(
                Arc::new(GitHubClient::with_base_url(base_url, token)),
                GitHubDefaults::from_config(config),
            );
        }
        None => tracing::info!("GitHub tools disabled"),
    }

    handler
}

/// Inline mode downloads Linear uploads with the same credentials as the API.
fn analyzer(mode: ImageMode, linear_authorization: String) -> Arc<dyn ImageAnalyzer> {
    match mode {
        ImageMode::Placeholder => Arc::new(PlaceholderAnalyzer),
        ImageMode::Inline => Arc::new(
            InlineImageAnalyzer::new()
                .with_host_authorization(bridge_linear::UPLOADS_HOST, linear_authorization),
        ),
    }
}

fn run_config(path: &Path, command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load_from(path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Get { key } => match Config::load_from(path)?.get(&key)? {
            Some(value) => println!("{}", value),
            None => anyhow::bail!("{} is not set", key),
        },
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            tracing::info!("Set {} = {}", key, value);
        }
    }
    Ok(())
}
