//! Worker model, a read-through view of an engine container

use serde::{Deserialize, Serialize};

use crate::engine::EngineContainer;

/// A load-generation worker as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Engine container id
    pub id: String,
    /// Engine container name
    pub name: String,
    /// Engine status string (`created`, `running`, `exited`, ...)
    pub status: String,
    /// First image tag of the container
    pub image: String,
    /// Raw entrypoint, only filled by list calls
    pub entrypoint: Option<Vec<String>>,
    /// Raw command arguments, only filled by list calls
    pub command: Option<Vec<String>>,
}

impl Worker {
    /// Identity fields only, as returned right after a run
    pub fn summary(container: EngineContainer) -> Self {
        Self {
            id: container.id,
            name: container.name,
            status: container.status,
            image: container.image.unwrap_or_default(),
            entrypoint: None,
            command: None,
        }
    }

    /// Identity plus the raw launch configuration, for introspection
    pub fn detailed(container: EngineContainer) -> Self {
        Self {
            id: container.id,
            name: container.name,
            status: container.status,
            image: container.image.unwrap_or_default(),
            entrypoint: container.entrypoint,
            command: container.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> EngineContainer {
        EngineContainer {
            id: "c0ffee".into(),
            name: "brave_turing".into(),
            status: "running".into(),
            image: Some("boomer:latest".into()),
            entrypoint: Some(vec!["/boomer".into()]),
            command: Some(vec!["--max-rps".into(), "10".into()]),
        }
    }

    #[test]
    fn test_summary_drops_launch_config() {
        let worker = Worker::summary(container());
        assert_eq!(worker.id, "c0ffee");
        assert_eq!(worker.image, "boomer:latest");
        assert!(worker.entrypoint.is_none());
        assert!(worker.command.is_none());
    }

    #[test]
    fn test_detailed_keeps_launch_config() {
        let worker = Worker::detailed(container());
        assert_eq!(worker.entrypoint, Some(vec!["/boomer".to_string()]));
        assert_eq!(worker.command.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_untagged_image_serializes_empty() {
        let mut c = container();
        c.image = None;
        let json = serde_json::to_value(Worker::summary(c)).unwrap();
        assert_eq!(json["image"], "");
        assert!(json["entrypoint"].is_null());
    }
}
