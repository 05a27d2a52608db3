//! API request/response types

use serde::{Deserialize, Serialize};

use crate::models::EngineConnectionSpec;

// === Query strings ===

/// Optional engine override accepted by every non-create endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EngineQuery {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub socket: Option<String>,
}

impl EngineQuery {
    /// The requested engine, or `fallback` when the query names none
    pub fn resolve(self, fallback: &EngineConnectionSpec) -> EngineConnectionSpec {
        if self.host.is_none() && self.port.is_none() && self.socket.is_none() {
            return fallback.clone();
        }
        EngineConnectionSpec {
            host: self.host,
            port: self.port,
            socket: self.socket.unwrap_or_else(|| fallback.socket.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopByIdQuery {
    pub container_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveByIdQuery {
    pub container_id: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ByNameQuery {
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

// === Generic ===

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
