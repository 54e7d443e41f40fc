// lingua-coach/crates/lingua-coach/src/main.rs

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use dotenvy::dotenv;
#[cfg(feature = "cli")]
use lingua_coach::{config::Config, metrics, open_profile_store, run_server, telemetry, AppState};

/// Language-learning conversation server.
#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "lingua-coach", version, about)]
struct Cli {
    /// Address to bind, overrides API_HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides API_PORT.
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file, overrides DATABASE_PATH.
    #[arg(long)]
    database: Option<std::path::PathBuf>,
}

#[cfg(feature = "cli")]
impl Cli {
    fn apply(self, cfg: &mut Config) {
        if let Some(host) = self.host {
            cfg.api_host = host;
        }
        if let Some(port) = self.port {
            cfg.api_port = port;
        }
        if let Some(database) = self.database {
            cfg.database_path = database;
        }
    }
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    telemetry::init_tracing();
    metrics::init_metrics();

    let mut cfg = Config::from_env()?;
    cli.apply(&mut cfg);

    let store = open_profile_store(&cfg)?;
    let state = AppState::from_config(cfg, store);
    run_server(state).await
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
