//! boomer-slaves CLI - serve the worker API or drive workers directly

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use boomer_slaves::api::Server;
use boomer_slaves::engine::EngineConnector;
use boomer_slaves::models::EngineConnectionSpec;
use boomer_slaves::{telemetry, Settings, WorkerManager};

#[derive(Parser)]
#[command(name = "boomer-slaves")]
#[command(about = "Control plane for boomer load-generation worker containers")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to config/default.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List running workers
    List {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Stop a container by id, or by exact name with --name
    Stop {
        /// Container id (or name with --name)
        target: String,
        /// Match on container name instead of id
        #[arg(long)]
        name: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Remove a container by id, or by exact name with --name
    Remove {
        /// Container id (or name with --name)
        target: String,
        /// Match on container name instead of id
        #[arg(long)]
        name: bool,
        /// Stop before removing (ids only)
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Stop every worker
    StopAll {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Remove every worker
    RemoveAll {
        /// Stop all workers first
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Engine selection; falls back to `engine.default_connection`
#[derive(Args)]
struct EngineArgs {
    /// Engine TCP host (needs --engine-port)
    #[arg(long)]
    engine_host: Option<String>,
    /// Engine TCP port
    #[arg(long)]
    engine_port: Option<u16>,
    /// Engine socket, e.g. unix:///var/run/docker.sock
    #[arg(long)]
    engine_socket: Option<String>,
}

impl EngineArgs {
    fn resolve(self, fallback: &EngineConnectionSpec) -> EngineConnectionSpec {
        if self.engine_host.is_none() && self.engine_port.is_none() && self.engine_socket.is_none() {
            return fallback.clone();
        }
        EngineConnectionSpec {
            host: self.engine_host,
            port: self.engine_port,
            socket: self.engine_socket.unwrap_or_else(|| fallback.socket.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json);

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::load().context("loading settings")?,
    };

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            let addr = settings.server.socket_addr()?;

            if settings.server.host == "0.0.0.0" {
                tracing::warn!("Binding to 0.0.0.0; the API has no authentication");
            }

            println!("Starting API server on http://{}", addr);
            println!();
            println!("Endpoints:");
            println!("  GET    /health                          Health check");
            println!("  POST   /api/v1/create_slave             Create worker");
            println!("  GET    /api/v1/list_slave               List workers");
            println!("  POST   /api/v1/stop_slave_by_id         Stop worker");
            println!("  DELETE /api/v1/remove_slave_by_id       Remove worker");
            println!("  POST   /api/v1/stop_slave_by_name       Stop container by name");
            println!("  DELETE /api/v1/remove_slave_by_name     Remove container by name");
            println!("  POST   /api/v1/stop_all_slave           Stop all workers");
            println!("  DELETE /api/v1/remove_all_slave         Remove all workers");
            println!();

            let connector: Arc<dyn EngineConnector> = Arc::new(settings.engine.connector());
            let server = Server::new(&settings, connector, addr);
            server.run(telemetry::shutdown_signal()).await?;
            tracing::warn!("shutdown complete");
        }
        Commands::List { engine } => {
            let manager = connect(&settings, engine)?;
            let workers = manager.list_workers().await?;
            if workers.is_empty() {
                println!("No workers running.");
                return Ok(());
            }

            println!("{:<14} {:<28} {:<10} {:<30}", "ID", "NAME", "STATUS", "IMAGE");
            println!("{}", "-".repeat(84));
            for w in workers {
                println!(
                    "{:<14} {:<28} {:<10} {:<30}",
                    &w.id[..std::cmp::min(12, w.id.len())],
                    w.name,
                    w.status,
                    w.image
                );
            }
        }
        Commands::Stop { target, name, engine } => {
            let manager = connect(&settings, engine)?;
            let stopped = if name {
                manager.stop_by_name(&target).await?
            } else {
                manager.stop_by_id(&target).await?
            };
            report(&target, "stopped", stopped);
        }
        Commands::Remove { target, name, force, engine } => {
            let manager = connect(&settings, engine)?;
            let removed = if name {
                manager.remove_by_name(&target).await?
            } else {
                manager.remove_by_id(&target, force).await?
            };
            report(&target, "removed", removed);
        }
        Commands::StopAll { engine } => {
            let manager = connect(&settings, engine)?;
            let outcome = manager.stop_all_workers().await?;
            println!("Stopped {} workers ({} failed)", outcome.succeeded.len(), outcome.failed.len());
        }
        Commands::RemoveAll { force, engine } => {
            let manager = connect(&settings, engine)?;
            let outcome = manager.remove_all_workers(force).await?;
            println!("Removed {} workers ({} failed)", outcome.succeeded.len(), outcome.failed.len());
            for id in outcome.failed {
                println!("  failed: {}", id);
            }
        }
    }

    Ok(())
}

fn connect(settings: &Settings, engine: EngineArgs) -> anyhow::Result<WorkerManager> {
    let spec = engine.resolve(&settings.engine.default_connection);
    let engine = settings
        .engine
        .connector()
        .connect(&spec)
        .with_context(|| format!("connecting to {}", spec.endpoint()))?;
    Ok(WorkerManager::with_prefix(engine, settings.workers.image_prefix.clone()))
}

fn report(target: &str, verb: &str, done: bool) {
    if done {
        println!("Container '{}' {}", target, verb);
    } else {
        println!("Container '{}' not found", target);
    }
}
