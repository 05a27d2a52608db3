//! Container engine capability
//!
//! The engine is an external service; this module only describes what the
//! worker manager needs from it. [`docker`] provides the real implementation.

pub mod docker;

use async_trait::async_trait;

use crate::command::WorkerCommand;
use crate::models::EngineConnectionSpec;
use crate::Result;

pub use docker::{DockerConnector, DockerEngine};

/// A container as reported by the engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineContainer {
    pub id: String,
    pub name: String,
    pub status: String,
    /// First tag of the container's image, else the reference it was
    /// created with
    pub image: Option<String>,
    pub entrypoint: Option<Vec<String>>,
    pub command: Option<Vec<String>>,
}

impl EngineContainer {
    pub fn has_image_prefix(&self, prefix: &str) -> bool {
        self.image.as_deref().is_some_and(|image| image.starts_with(prefix))
    }
}

/// Operations the worker manager issues against the engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Create and start a detached container
    async fn run(&self, image: &str, command: &WorkerCommand) -> Result<EngineContainer>;

    /// Look a container up by id; `None` when the engine does not know it
    async fn get(&self, id: &str) -> Result<Option<EngineContainer>>;

    /// Containers in engine order; stopped ones only when `all` is set
    async fn list(&self, all: bool) -> Result<Vec<EngineContainer>>;

    async fn stop(&self, id: &str) -> Result<()>;

    async fn remove(&self, id: &str) -> Result<()>;
}

/// Opens one engine connection per call
pub trait EngineConnector: Send + Sync {
    fn connect(&self, spec: &EngineConnectionSpec) -> Result<Box<dyn ContainerEngine>>;
}

/// Lifecycle action applied to a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Stop,
    Remove,
}

impl std::fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerAction::Stop => write!(f, "stop"),
            ContainerAction::Remove => write!(f, "remove"),
        }
    }
}

/// A container bound to the engine connection it was found through
pub struct ContainerHandle<'a> {
    engine: &'a dyn ContainerEngine,
    container: EngineContainer,
}

impl<'a> ContainerHandle<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, container: EngineContainer) -> Self {
        Self { engine, container }
    }

    pub fn id(&self) -> &str {
        &self.container.id
    }

    pub async fn stop(&self) -> Result<()> {
        self.engine.stop(&self.container.id).await
    }

    pub async fn remove(&self) -> Result<()> {
        self.engine.remove(&self.container.id).await
    }

    pub async fn apply(&self, action: ContainerAction) -> Result<()> {
        match action {
            ContainerAction::Stop => self.stop().await,
            ContainerAction::Remove => self.remove().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_image_prefix() {
        let mut c = EngineContainer {
            image: Some("boomer:latest".into()),
            ..Default::default()
        };
        assert!(c.has_image_prefix("boomer"));
        assert!(!c.has_image_prefix("nginx"));

        c.image = None;
        assert!(!c.has_image_prefix("boomer"));
    }

    #[tokio::test]
    async fn test_handle_dispatches_action() {
        let mut engine = MockContainerEngine::new();
        engine.expect_stop().with(eq("abc")).times(1).returning(|_| Ok(()));
        engine.expect_remove().with(eq("abc")).times(1).returning(|_| Ok(()));

        let handle = ContainerHandle::new(
            &engine,
            EngineContainer { id: "abc".into(), ..Default::default() },
        );
        handle.apply(ContainerAction::Stop).await.unwrap();
        handle.apply(ContainerAction::Remove).await.unwrap();
    }
}
