use clap::{Parser, Subcommand};
use minibind::api::{register_all, App};
use minibind::runtime_config::RuntimeConfig;
use minibind::server::{AppService, HttpServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minibind")]
#[command(version, about = "Typed endpoint binding server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with the built-in endpoint set
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { addr } => serve(&addr),
    }
}

fn serve(addr: &str) -> anyhow::Result<()> {
    RuntimeConfig::from_env().apply();

    let mut app = App::new();
    register_all(&mut app).map_err(|e| anyhow::anyhow!("endpoint registration failed: {e}"))?;

    let service = AppService::new(app.into_router());
    tracing::info!(%addr, "listening");
    let handle = HttpServer(service).start(addr)?;
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server exited abnormally: {e:?}"))?;
    Ok(())
}
