//! # CEAP Componenti backend (`ceap`)
//!
//! ## Usage
//!
//! ```bash
//! ceap [--config ./config/ceap.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ceap serve` | Start the HTTP API |
//! | `ceap init` | Create the document store schema |
//! | `ceap check` | Print the store diagnostic report |
//! | `ceap components import <file>` | Load catalog records from a JSON array |
//! | `ceap components list` | Query the catalog (with fallback) |
//!
//! The store is configured with `DATABASE_URL` and `DATABASE_NAME` (or the
//! `[store]` table of the config file). Without them the API runs in
//! degraded mode: submissions are acknowledged but not saved, and the
//! catalog serves demo records.

use ceap_backend::{catalog_cmd, config, migrate, server, store};
use ceap_core::catalog::{ComponentQuery, DEFAULT_LIMIT};
use ceap_core::diagnostics::{probe_health, ConfigPresence};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CEAP Componenti backend: lead, contact and chatbot intake with a
/// degradable document store and a component catalog.
#[derive(Parser)]
#[command(name = "ceap", version, about = "CEAP Componenti backend")]
struct Cli {
    /// Path to an optional configuration file (TOML).
    ///
    /// Environment variables (`DATABASE_URL`, `DATABASE_NAME`, `PORT`)
    /// override values from the file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve,

    /// Create the document store schema.
    ///
    /// Idempotent. Fails when no store is configured.
    Init,

    /// Print the store diagnostic report as JSON.
    Check,

    /// Manage the component catalog.
    Components {
        #[command(subcommand)]
        action: ComponentsAction,
    },
}

#[derive(Subcommand)]
enum ComponentsAction {
    /// Import components from a JSON array file.
    Import {
        /// Path to the JSON file.
        path: PathBuf,
    },

    /// List catalog components, falling back to demo records.
    List {
        /// Component type (e.g. `IC`, `MOSFET`).
        #[arg(long = "type")]
        kind: Option<String>,
        /// Mount style: `SMD` or `PTH`.
        #[arg(long)]
        mount: Option<String>,
        #[arg(long)]
        package: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        /// Maximum number of components.
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Init => {
            let Some(conn) = cfg.store.connection() else {
                anyhow::bail!("No document store configured. Set DATABASE_URL and DATABASE_NAME.");
            };
            let pool = ceap_backend::db::connect_lazy(conn, cfg.store.timeout_secs)?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Document store initialized successfully.");
        }
        Commands::Check => {
            let store = store::open_store(&cfg, false).await?;
            let presence = ConfigPresence {
                url_set: cfg.store.url_set(),
                name_set: cfg.store.name_set(),
            };
            let report = probe_health(store.as_ref(), presence).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Components { action } => match action {
            ComponentsAction::Import { path } => {
                catalog_cmd::run_import(&cfg, &path).await?;
            }
            ComponentsAction::List {
                kind,
                mount,
                package,
                brand,
                limit,
            } => {
                let query = ComponentQuery {
                    kind,
                    mount,
                    package,
                    brand,
                };
                catalog_cmd::run_list(&cfg, query, limit).await?;
            }
        },
    }

    Ok(())
}
