use clap::Parser;
use tracing_subscriber::EnvFilter;

use lumira::error::Result;
use lumira::{web, Config};

#[derive(Parser, Debug)]
#[command(name = "lumira-web")]
#[command(about = "Lumira study assistant web server")]
struct Cli {
    #[arg(long, env = "HOST")]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long, help = "SQLite database path (overrides LUMIRA_DB_PATH and DATABASE_URL)")]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lumira=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = cli.db {
        config.database.sqlite_path = db;
    }

    web::run(config).await
}
