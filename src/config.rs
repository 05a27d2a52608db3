//! Service settings, layered from defaults, a TOML file and the environment

use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::engine::docker::{DEFAULT_ENGINE_TIMEOUT_SECS, DEFAULT_STOP_TIMEOUT_SECS};
use crate::engine::DockerConnector;
use crate::manager::DEFAULT_WORKER_IMAGE_PREFIX;
use crate::models::EngineConnectionSpec;
use crate::{Error, Result};

/// Default settings file, read when present
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment prefix, e.g. `BOOMER_SLAVES__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "BOOMER_SLAVES__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub workers: WorkerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Engine used when a request does not name one
    pub default_connection: EngineConnectionSpec,
    pub timeout_secs: u64,
    pub stop_timeout_secs: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_connection: EngineConnectionSpec::default(),
            timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        }
    }
}

impl EngineSettings {
    pub fn connector(&self) -> DockerConnector {
        DockerConnector {
            timeout_secs: self.timeout_secs,
            stop_timeout_secs: self.stop_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Containers whose image starts with this are treated as workers
    pub image_prefix: String,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            image_prefix: DEFAULT_WORKER_IMAGE_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Load from [`DEFAULT_CONFIG_PATH`] (if it exists) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from a specific file (skipped if missing) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers.image_prefix.is_empty() {
            return Err(Error::Config("workers.image_prefix cannot be empty".into()));
        }
        if self.engine.stop_timeout_secs < 0 {
            return Err(Error::Config("engine.stop_timeout_secs must not be negative".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.workers.image_prefix, "boomer");
        assert_eq!(settings.engine.stop_timeout_secs, 10);
        assert_eq!(settings.engine.default_connection.socket, "unix://var/run/docker.sock");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_from(Path::new("/nonexistent/boomer-slaves.toml")).unwrap();
        assert_eq!(settings.engine.timeout_secs, 120);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 9100

[engine]
timeout_secs = 30

[engine.default_connection]
host = "10.0.0.7"
port = 2375

[workers]
image_prefix = "registry.local/boomer"
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.server.socket_addr().unwrap().port(), 9100);
        assert_eq!(settings.engine.timeout_secs, 30);
        assert_eq!(settings.engine.stop_timeout_secs, 10);
        assert_eq!(settings.engine.default_connection.port, Some(2375));
        assert_eq!(settings.workers.image_prefix, "registry.local/boomer");
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.workers.image_prefix.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.server.host = "not a host".into();
        assert!(settings.validate().is_err());
    }
}
