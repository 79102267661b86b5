use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkstone::ai::LiveGateway;
use inkstone::api::{self, AppState};
use inkstone::config::ConfigStore;
use inkstone::models::Category;
use inkstone::project::{export, ProjectStore};

const DEFAULT_PORT: u16 = 17870;

#[derive(Parser)]
#[command(name = "inkstone")]
#[command(about = "Story project backend for AI-assisted long-form writing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local API server for the desktop shell
    Serve {
        /// Port for the HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Create or open a project directory and print its manifest
    Init {
        /// Project root directory
        path: PathBuf,
    },
    /// Export one category of a project to a single file
    Export {
        /// Project root directory
        path: PathBuf,
        /// Category to export: outlines, content, or settings
        category: String,
        /// Output file, overwritten if present
        target: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "inkstone=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let config = ConfigStore::open_default()?;
    let state = AppState {
        gateway: Arc::new(LiveGateway::new(config.clone())),
        config,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tracing::info!("Inkstone backend listening on http://127.0.0.1:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Init { path }) => {
            let store = ProjectStore::open(&path);
            let manifest = store.init().await?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Some(Commands::Export {
            path,
            category,
            target,
        }) => {
            let category = Category::from_str(&category)
                .ok_or_else(|| anyhow::anyhow!("Unknown category: {category}"))?;
            let store = ProjectStore::open(&path);
            export::export_category(&store, category, &target).await?;
            println!("Exported {} to {}", category.as_str(), target.display());
        }
        None => serve(DEFAULT_PORT).await?,
    }

    Ok(())
}
