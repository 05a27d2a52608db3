//! Worker creation inputs: target request, load shape and engine connection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default socket of a local Docker daemon
pub const DEFAULT_ENGINE_SOCKET: &str = "unix://var/run/docker.sock";

/// Default port of the boomer master's worker channel
pub const DEFAULT_MASTER_PORT: u16 = 5557;

/// Sentinel for "no ramp" in [`LoadShapeSpec::request_increase_rate`]
pub const NO_RAMP: i64 = -1;

/// Body sent by the worker with every request.
///
/// Only JSON arrays and objects are accepted; `null` is represented by the
/// surrounding `Option` and means "no body".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    List(Vec<serde_json::Value>),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::List(items) => items.is_empty(),
            RequestBody::Map(fields) => fields.is_empty(),
        }
    }
}

/// The HTTP request every worker replays against the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub url: String,
    pub method: String,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<RequestBody>,
    /// Per-request timeout as a Go duration string, e.g. `"10s"`
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub disable_keepalive: bool,
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

impl RequestSpec {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: default_headers(),
            body: None,
            timeout: None,
            disable_keepalive: false,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }
}

/// How hard a worker pushes and which master it reports to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadShapeSpec {
    #[serde(default = "default_master_host")]
    pub master_host: String,
    #[serde(default = "default_master_port")]
    pub master_port: u16,
    pub max_rps: i64,
    #[serde(default = "default_increase_rate")]
    pub request_increase_rate: i64,
    #[serde(default)]
    pub verbose: bool,
}

fn default_master_host() -> String { "127.0.0.1".to_string() }
fn default_master_port() -> u16 { DEFAULT_MASTER_PORT }
fn default_increase_rate() -> i64 { NO_RAMP }

impl LoadShapeSpec {
    pub fn new(max_rps: i64) -> Self {
        Self {
            master_host: default_master_host(),
            master_port: DEFAULT_MASTER_PORT,
            max_rps,
            request_increase_rate: NO_RAMP,
            verbose: false,
        }
    }

    pub fn master(mut self, host: impl Into<String>, port: u16) -> Self {
        self.master_host = host.into();
        self.master_port = port;
        self
    }

    pub fn request_increase_rate(mut self, rate: i64) -> Self {
        self.request_increase_rate = rate;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn ramps(&self) -> bool {
        self.request_increase_rate != NO_RAMP
    }
}

/// Where to reach the container engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConnectionSpec {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_socket")]
    pub socket: String,
}

fn default_socket() -> String { DEFAULT_ENGINE_SOCKET.to_string() }

impl Default for EngineConnectionSpec {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            socket: default_socket(),
        }
    }
}

/// Resolved engine address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEndpoint {
    Tcp { host: String, port: u16 },
    Socket(String),
}

impl std::fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEndpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            EngineEndpoint::Socket(path) => write!(f, "unix://{}", path),
        }
    }
}

impl EngineConnectionSpec {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            ..Self::default()
        }
    }

    pub fn socket(path: impl Into<String>) -> Self {
        Self {
            socket: path.into(),
            ..Self::default()
        }
    }

    /// TCP wins when both host and port are set, otherwise the socket is used.
    ///
    /// The socket accepts the `unix://var/run/docker.sock` spelling common in
    /// client configs; it is normalized to an absolute path.
    pub fn endpoint(&self) -> EngineEndpoint {
        match (&self.host, self.port) {
            (Some(host), Some(port)) if !host.is_empty() => EngineEndpoint::Tcp {
                host: host.clone(),
                port,
            },
            _ => {
                let path = self.socket.strip_prefix("unix://").unwrap_or(&self.socket);
                let path = if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{}", path)
                };
                EngineEndpoint::Socket(path)
            }
        }
    }
}

/// Full input of a create call, as posted to `/create_slave`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationRequest {
    pub image: String,
    pub request: RequestSpec,
    #[serde(default)]
    pub container_config: EngineConnectionSpec,
    pub boomer_cmd: LoadShapeSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_spec_defaults() {
        let spec: RequestSpec = serde_json::from_value(json!({
            "url": "http://t/get",
            "method": "GET"
        }))
        .unwrap();

        assert_eq!(spec.headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert!(spec.body.is_none());
        assert!(!spec.disable_keepalive);
    }

    #[test]
    fn test_null_body_is_absent() {
        let spec: RequestSpec = serde_json::from_value(json!({
            "url": "http://t/post",
            "method": "POST",
            "body": null
        }))
        .unwrap();
        assert!(spec.body.is_none());
    }

    #[test]
    fn test_empty_body_is_present() {
        let spec: RequestSpec = serde_json::from_value(json!({
            "url": "http://t/post",
            "method": "POST",
            "body": {}
        }))
        .unwrap();
        let body = spec.body.unwrap();
        assert!(body.is_empty());
        assert!(matches!(body, RequestBody::Map(_)));
    }

    #[test]
    fn test_scalar_body_rejected() {
        let result: std::result::Result<RequestSpec, _> = serde_json::from_value(json!({
            "url": "http://t/post",
            "method": "POST",
            "body": "raw"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_shape_requires_max_rps() {
        let result: std::result::Result<LoadShapeSpec, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());

        let load: LoadShapeSpec = serde_json::from_value(json!({ "max_rps": 100 })).unwrap();
        assert_eq!(load.master_host, "127.0.0.1");
        assert_eq!(load.master_port, 5557);
        assert_eq!(load.request_increase_rate, NO_RAMP);
        assert!(!load.ramps());
        assert!(!load.verbose);
    }

    #[test]
    fn test_endpoint_prefers_tcp() {
        let spec = EngineConnectionSpec::tcp("10.0.0.5", 2375);
        assert_eq!(
            spec.endpoint(),
            EngineEndpoint::Tcp { host: "10.0.0.5".into(), port: 2375 }
        );
        assert_eq!(spec.endpoint().to_string(), "tcp://10.0.0.5:2375");
    }

    #[test]
    fn test_endpoint_falls_back_to_socket() {
        let host_only = EngineConnectionSpec {
            host: Some("10.0.0.5".into()),
            ..EngineConnectionSpec::default()
        };
        assert_eq!(
            host_only.endpoint(),
            EngineEndpoint::Socket("/var/run/docker.sock".into())
        );

        let absolute = EngineConnectionSpec::socket("unix:///run/user/1000/docker.sock");
        assert_eq!(
            absolute.endpoint(),
            EngineEndpoint::Socket("/run/user/1000/docker.sock".into())
        );
    }

    #[test]
    fn test_creation_request_shape() {
        let req: CreationRequest = serde_json::from_value(json!({
            "image": "boomer:latest",
            "request": { "url": "http://t/post", "method": "POST", "body": [1, 2, 3] },
            "container_config": { "host": "127.0.0.1", "port": 2375 },
            "boomer_cmd": { "max_rps": 100 }
        }))
        .unwrap();

        assert_eq!(req.image, "boomer:latest");
        assert_eq!(req.container_config.port, Some(2375));
        assert_eq!(req.boomer_cmd.max_rps, 100);
    }
}
