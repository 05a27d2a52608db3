//! Boomer Slaves
//!
//! A small control plane for disposable load-generation workers. Each worker
//! is a boomer container started against a remote container engine with its
//! target request and load shape baked into the command line; the service
//! lists, stops and removes them again.
//!
//! # Key Features
//!
//! - **Stateless** - every call reads the engine directly, nothing is cached
//! - **Any engine** - local socket or TCP endpoint, chosen per request
//! - **REST facade** - axum API under `/api/v1`, plus a CLI for the same operations
//!
//! # Example
//!
//! ```no_run
//! use boomer_slaves::engine::{DockerConnector, EngineConnector};
//! use boomer_slaves::models::{EngineConnectionSpec, LoadShapeSpec, RequestSpec};
//! use boomer_slaves::WorkerManager;
//!
//! # async fn run() -> boomer_slaves::Result<()> {
//! let engine = DockerConnector::default().connect(&EngineConnectionSpec::default())?;
//! let manager = WorkerManager::new(engine);
//!
//! let request = RequestSpec::new("http://target:8081/post", "POST");
//! let load = LoadShapeSpec::new(200).master("10.0.0.4", 5557);
//!
//! let worker = manager.create_worker("boomer:latest", &request, &load).await?;
//! println!("started {} ({})", worker.name, worker.id);
//!
//! manager.remove_by_id(&worker.id, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod models;
pub mod telemetry;

pub use command::WorkerCommand;
pub use config::Settings;
pub use error::{Error, Result};
pub use manager::{BulkReport, WorkerManager};
pub use models::Worker;
