//! Worker lifecycle on top of a single engine connection

use crate::command::WorkerCommand;
use crate::engine::{ContainerAction, ContainerEngine, ContainerHandle};
use crate::models::{LoadShapeSpec, RequestSpec, Worker};
use crate::Result;

/// Image prefix that marks a container as a load-test worker
pub const DEFAULT_WORKER_IMAGE_PREFIX: &str = "boomer";

/// Outcome of a bulk stop/remove sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Creates, lists, stops and removes workers.
///
/// Holds one engine connection; build a new manager per request.
pub struct WorkerManager {
    engine: Box<dyn ContainerEngine>,
    image_prefix: String,
}

impl WorkerManager {
    pub fn new(engine: Box<dyn ContainerEngine>) -> Self {
        Self::with_prefix(engine, DEFAULT_WORKER_IMAGE_PREFIX)
    }

    pub fn with_prefix(engine: Box<dyn ContainerEngine>, image_prefix: impl Into<String>) -> Self {
        Self {
            engine,
            image_prefix: image_prefix.into(),
        }
    }

    /// Start a worker container from `image` with the built command
    pub async fn create_worker(
        &self,
        image: &str,
        request: &RequestSpec,
        load: &LoadShapeSpec,
    ) -> Result<Worker> {
        let command = WorkerCommand::build(request, load)?;
        tracing::info!(%image, %command, "Creating worker");

        let container = self.engine.run(image, &command).await?;
        tracing::info!(container_id = %container.id, name = %container.name, "Worker created");

        Ok(Worker::summary(container))
    }

    /// Running workers, in engine order
    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        let containers = self.engine.list(false).await?;
        Ok(containers
            .into_iter()
            .filter(|c| c.has_image_prefix(&self.image_prefix))
            .map(Worker::detailed)
            .collect())
    }

    pub async fn stop_by_id(&self, id: &str) -> Result<bool> {
        self.apply_by_id(id, ContainerAction::Stop).await
    }

    /// Remove a container by id, stopping it first when `force` is set
    pub async fn remove_by_id(&self, id: &str, force: bool) -> Result<bool> {
        if force {
            if let Err(e) = self.stop_by_id(id).await {
                tracing::warn!(container_id = %id, error = %e, "Stop before remove failed");
            }
        }
        self.apply_by_id(id, ContainerAction::Remove).await
    }

    /// Stop the first container named exactly `name`, worker or not
    pub async fn stop_by_name(&self, name: &str) -> Result<bool> {
        self.apply_by_name(name, ContainerAction::Stop).await
    }

    /// Remove the first container named exactly `name`, worker or not.
    /// Stopped containers match too.
    pub async fn remove_by_name(&self, name: &str) -> Result<bool> {
        self.apply_by_name(name, ContainerAction::Remove).await
    }

    /// Best-effort stop of every worker
    pub async fn stop_all_workers(&self) -> Result<BulkReport> {
        self.sweep(ContainerAction::Stop).await
    }

    /// Best-effort removal of every worker, stopped ones included. Without
    /// `force` the engine refuses running workers and they land in `failed`.
    pub async fn remove_all_workers(&self, force: bool) -> Result<BulkReport> {
        if force {
            self.stop_all_workers().await?;
        }
        self.sweep(ContainerAction::Remove).await
    }

    /// Stopped containers can still be removed, so removals look at them too
    fn includes_stopped(action: ContainerAction) -> bool {
        action == ContainerAction::Remove
    }

    async fn apply_by_id(&self, id: &str, action: ContainerAction) -> Result<bool> {
        let Some(container) = self.engine.get(id).await? else {
            tracing::warn!(container_id = %id, %action, "Container not found");
            return Ok(false);
        };

        ContainerHandle::new(self.engine.as_ref(), container)
            .apply(action)
            .await?;
        tracing::info!(container_id = %id, %action, "Container updated");
        Ok(true)
    }

    async fn apply_by_name(&self, name: &str, action: ContainerAction) -> Result<bool> {
        let containers = self.engine.list(Self::includes_stopped(action)).await?;
        let Some(container) = containers.into_iter().find(|c| c.name == name) else {
            tracing::warn!(%name, %action, "No container with that name");
            return Ok(false);
        };

        let handle = ContainerHandle::new(self.engine.as_ref(), container);
        handle.apply(action).await?;
        tracing::info!(%name, container_id = %handle.id(), %action, "Container updated");
        Ok(true)
    }

    async fn sweep(&self, action: ContainerAction) -> Result<BulkReport> {
        let containers = self.engine.list(Self::includes_stopped(action)).await?;
        let mut report = BulkReport::default();

        for container in containers
            .into_iter()
            .filter(|c| c.has_image_prefix(&self.image_prefix))
        {
            let handle = ContainerHandle::new(self.engine.as_ref(), container);
            match handle.apply(action).await {
                Ok(()) => report.succeeded.push(handle.id().to_string()),
                Err(e) => {
                    tracing::warn!(container_id = %handle.id(), %action, error = %e, "Bulk action failed");
                    report.failed.push(handle.id().to_string());
                }
            }
        }

        tracing::info!(
            %action,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk action finished"
        );
        Ok(report)
    }
}
