//! Docker engine over bollard

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StopContainerOptions,
};
use bollard::models::ContainerInspectResponse;
use bollard::{Docker, API_DEFAULT_VERSION};

use super::{ContainerEngine, EngineConnector, EngineContainer};
use crate::command::WorkerCommand;
use crate::models::{EngineConnectionSpec, EngineEndpoint};
use crate::{Error, Result};

/// Seconds bollard waits on a single engine call
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 120;

/// Grace period given to a worker before it is killed on stop
pub const DEFAULT_STOP_TIMEOUT_SECS: i64 = 10;

/// One connection to a Docker daemon
pub struct DockerEngine {
    docker: Docker,
    stop_timeout_secs: i64,
}

impl DockerEngine {
    pub fn connect(endpoint: &EngineEndpoint, timeout_secs: u64, stop_timeout_secs: i64) -> Result<Self> {
        let docker = match endpoint {
            EngineEndpoint::Tcp { .. } => {
                Docker::connect_with_http(&endpoint.to_string(), timeout_secs, API_DEFAULT_VERSION)
            }
            EngineEndpoint::Socket(path) => {
                Docker::connect_with_unix(path, timeout_secs, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| Error::EngineUnavailable(format!("{}: {}", endpoint, e)))?;

        tracing::debug!(%endpoint, "Connected to container engine");
        Ok(Self { docker, stop_timeout_secs })
    }

    async fn inspect(&self, id: &str) -> Result<EngineContainer> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        let tags = match info.image.as_deref() {
            Some(image_id) => self.image_tags(image_id).await?,
            None => Vec::new(),
        };
        Ok(from_inspect(info, tags))
    }

    /// Tags of the image a container runs; empty once the image is gone
    async fn image_tags(&self, image_id: &str) -> Result<Vec<String>> {
        match self.docker.inspect_image(image_id).await {
            Ok(image) => Ok(image.repo_tags.unwrap_or_default()),
            Err(e) => match Error::from(e) {
                Error::NotFound(_) => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn run(&self, image: &str, command: &WorkerCommand) -> Result<EngineContainer> {
        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(command.args()),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;
        for warning in &created.warnings {
            tracing::warn!(container_id = %created.id, %warning, "Engine warning on create");
        }

        self.docker
            .start_container::<String>(&created.id, None)
            .await?;

        self.inspect(&created.id).await
    }

    async fn get(&self, id: &str) -> Result<Option<EngineContainer>> {
        match self.inspect(id).await {
            Ok(container) => Ok(Some(container)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, all: bool) -> Result<Vec<EngineContainer>> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all,
                ..Default::default()
            }))
            .await?;

        let mut containers = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else { continue };
            match self.inspect(&id).await {
                Ok(container) => containers.push(container),
                // Removed between list and inspect
                Err(Error::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(containers)
    }

    async fn stop(&self, id: &str) -> Result<()> {
        self.docker
            .stop_container(id, Some(StopContainerOptions { t: self.stop_timeout_secs }))
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await?;
        Ok(())
    }
}

/// `tags` are the repo tags of the container's image. The first one names
/// the image; the reference the container was created with is the fallback.
fn from_inspect(info: ContainerInspectResponse, tags: Vec<String>) -> EngineContainer {
    let config = info.config.unwrap_or_default();
    EngineContainer {
        id: info.id.unwrap_or_default(),
        name: info
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        status: info
            .state
            .and_then(|s| s.status)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        image: tags.into_iter().next().or(config.image),
        entrypoint: config.entrypoint,
        command: config.cmd,
    }
}

/// Connects to Docker with fixed call and stop timeouts
#[derive(Debug, Clone)]
pub struct DockerConnector {
    pub timeout_secs: u64,
    pub stop_timeout_secs: i64,
}

impl Default for DockerConnector {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        }
    }
}

impl EngineConnector for DockerConnector {
    fn connect(&self, spec: &EngineConnectionSpec) -> Result<Box<dyn ContainerEngine>> {
        let engine = DockerEngine::connect(&spec.endpoint(), self.timeout_secs, self.stop_timeout_secs)?;
        Ok(Box::new(engine))
    }
}
