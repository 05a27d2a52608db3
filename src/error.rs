//! Error types for the worker control plane

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Container engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("Container state conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a container lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Short machine-readable kind, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EngineUnavailable(_) => "EngineUnavailable",
            Error::NotFound(_) => "NotFound",
            Error::Conflict(_) => "Conflict",
            Error::Validation(_) => "ValidationError",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
        }
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => Error::NotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409,
                message,
            } => Error::Conflict(message),
            other => Error::EngineUnavailable(other.to_string()),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_404_maps_to_not_found() {
        let err: Error = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: abc".to_string(),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_docker_500_maps_to_engine_unavailable() {
        let err: Error = bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, Error::EngineUnavailable(_)));
        assert_eq!(err.kind(), "EngineUnavailable");
    }

    #[test]
    fn test_docker_409_maps_to_conflict() {
        let err: Error = bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message: "You cannot remove a running container".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(!err.is_not_found());
    }
}
