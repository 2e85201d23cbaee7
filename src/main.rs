//! blogd - Multi-user blog backend
//!
//! Serves the blog REST API and manages its database schema.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use blog_api::config::{BlogConfig, LogFormat, LoggingSettings};
use blog_api::{ApiServer, ApiServerConfig};
use blog_auth::TokenCodec;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// blogd - Blog backend with accounts, posts and comments
#[derive(Parser, Debug)]
#[command(name = "blogd")]
#[command(about = "blogd - Blog backend with accounts, posts and comments")]
#[command(version = VERSION)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run migrations, then serve the HTTP API until Ctrl+C
    #[command(long_about = r#"
Load the configuration, apply pending database migrations and serve the
HTTP API. Stops gracefully on Ctrl+C.

EXAMPLES:
  blogd serve --config config/config.yaml
  BLOG_JWT_SECRET=$(openssl rand -hex 32) blogd serve --bind-addr 0.0.0.0:9090

ENVIRONMENT VARIABLES:
  BLOG_CONFIG         Path to the YAML config file
  BLOG_JWT_SECRET     Token signing secret (overrides jwt.key)
  BLOG_DATABASE_URL   Database URL (overrides database.url)
  BLOG_BIND_ADDR      Listen address (overrides server.bind_addr)
    "#)]
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Address to listen on
        #[arg(long, env = "BLOG_BIND_ADDR")]
        bind_addr: Option<SocketAddr>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to the YAML config file
    #[arg(short, long, env = "BLOG_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    /// Token signing secret
    #[arg(long, env = "BLOG_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Database connection URL
    #[arg(long, env = "BLOG_DATABASE_URL")]
    database_url: Option<String>,
}

impl ConfigArgs {
    /// Load the file if present and apply overrides
    fn load(&self) -> Result<BlogConfig> {
        let mut config = if self.config.exists() {
            BlogConfig::load(&self.config)?
        } else {
            // Everything can come from flags and environment
            BlogConfig::default()
        };

        if let Some(secret) = &self.jwt_secret {
            config.jwt.key = secret.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }

        Ok(config)
    }
}

/// Setup logging from config, with `--verbose` and `RUST_LOG` taking precedence
fn setup_logging(verbose: bool, logging: &LoggingSettings) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&logging.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received Ctrl+C, shutting down...");
}

async fn serve(config: BlogConfig, bind_addr: Option<SocketAddr>) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let db = blog_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    blog_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;

    let codec = Arc::new(TokenCodec::new(&config.token_config()?));

    let mut server_config = ApiServerConfig::from(&config.server);
    if let Some(addr) = bind_addr {
        server_config.bind_addr = addr;
    }

    ApiServer::new(server_config, db, codec)
        .start(shutdown_signal())
        .await
}

async fn migrate(config: BlogConfig) -> Result<()> {
    let db = blog_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    blog_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind_addr } => {
            let config = config.load()?;
            setup_logging(cli.verbose, &config.logging);

            info!("blogd {} starting...", VERSION);
            info!("Configuration: {:?}", config);

            serve(config, bind_addr).await?;
            info!("blogd stopped");
        }
        Commands::Migrate { config } => {
            let config = config.load()?;
            setup_logging(cli.verbose, &config.logging);

            migrate(config).await?;
        }
    }

    Ok(())
}
