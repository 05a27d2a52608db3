//! Worker command-line construction
//!
//! The boomer worker entrypoint takes everything on its command line. The
//! command is kept as a list of flags so it can be handed to the engine as an
//! argv vector while still rendering to the single argument line used in
//! logs:
//!
//! ```text
//! --master-host 127.0.0.1 --master-port 5557 --max-rps 100 --url http://t/post
//!   --method POST --json-headers '{"Content-Type": "application/json"}'
//!   --raw-data '[1, 2, 3]' --verbose 1
//! ```

use std::fmt;
use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::models::{LoadShapeSpec, RequestSpec};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Flag {
    name: &'static str,
    value: Option<String>,
    quoted: bool,
}

/// Argument list for one worker container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    flags: Vec<Flag>,
}

impl WorkerCommand {
    /// Build the worker command for a target request and load shape.
    ///
    /// Order is fixed. `--verbose 1` is always the last flag because the
    /// entrypoint stops parsing flags at the first positional token.
    pub fn build(request: &RequestSpec, load: &LoadShapeSpec) -> Result<Self> {
        let mut cmd = Self { flags: Vec::new() };

        cmd.push("--master-host", &load.master_host);
        cmd.push("--master-port", load.master_port);
        cmd.push("--max-rps", load.max_rps);
        if load.ramps() {
            cmd.push("--request-increase-rate", load.request_increase_rate);
        }

        cmd.push("--url", &request.url);
        cmd.push("--method", &request.method);
        cmd.push_quoted("--json-headers", to_spaced_json(&request.headers)?);

        if let Some(ref body) = request.body {
            cmd.push_quoted("--raw-data", to_spaced_json(body)?);
        }
        if let Some(ref timeout) = request.timeout {
            cmd.push("--timeout", timeout);
        }
        if request.disable_keepalive {
            cmd.flags.push(Flag { name: "--disable-keepalive", value: None, quoted: false });
        }

        if load.verbose {
            cmd.push("--verbose", 1);
        }

        Ok(cmd)
    }

    fn push(&mut self, name: &'static str, value: impl ToString) {
        self.flags.push(Flag { name, value: Some(value.to_string()), quoted: false });
    }

    fn push_quoted(&mut self, name: &'static str, value: String) {
        self.flags.push(Flag { name, value: Some(value), quoted: true });
    }

    /// Argv form, one element per token, without shell quoting
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.flags.len() * 2);
        for flag in &self.flags {
            args.push(flag.name.to_string());
            if let Some(ref value) = flag.value {
                args.push(value.clone());
            }
        }
        args
    }

    /// Value of a flag, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.flags.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(flag.name)?;
            match (&flag.value, flag.quoted) {
                (Some(value), true) => write!(f, " '{}'", value)?,
                (Some(value), false) => write!(f, " {}", value)?,
                (None, _) => {}
            }
        }
        Ok(())
    }
}

/// JSON with a space after `,` and `:`, the layout the worker images were
/// written against.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut ser = Serializer::with_formatter(Vec::new(), SpacedFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(ser.into_inner()).map_err(|e| Error::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestBody;
    use serde_json::json;

    fn post_request(body: Option<serde_json::Value>) -> RequestSpec {
        serde_json::from_value(json!({
            "url": "http://t/post",
            "method": "POST",
            "body": body,
        }))
        .unwrap()
    }

    #[test]
    fn test_scenario_list_body_without_verbose() {
        let request = post_request(Some(json!([1, 2, 3])));
        let cmd = WorkerCommand::build(&request, &LoadShapeSpec::new(100)).unwrap();

        let line = cmd.to_string();
        assert_eq!(
            line,
            "--master-host 127.0.0.1 --master-port 5557 --max-rps 100 \
             --url http://t/post --method POST \
             --json-headers '{\"Content-Type\": \"application/json\"}' \
             --raw-data '[1, 2, 3]'"
        );
        assert!(line.ends_with("--raw-data '[1, 2, 3]'"));
        assert!(!line.ends_with("--verbose 1"));
    }

    #[test]
    fn test_raw_data_emitted_for_empty_body() {
        for body in [json!([]), json!({})] {
            let cmd = WorkerCommand::build(&post_request(Some(body)), &LoadShapeSpec::new(1)).unwrap();
            assert!(cmd.get("--raw-data").is_some(), "{}", cmd);
        }
        let cmd = WorkerCommand::build(&post_request(Some(json!({}))), &LoadShapeSpec::new(1)).unwrap();
        assert_eq!(cmd.get("--raw-data"), Some("{}"));
    }

    #[test]
    fn test_raw_data_keeps_caller_key_order() {
        let request: RequestSpec = serde_json::from_str(
            r#"{"url": "http://t/post", "method": "POST", "body": {"b": 1, "a": {"z": 0, "y": 1}}}"#,
        )
        .unwrap();
        let cmd = WorkerCommand::build(&request, &LoadShapeSpec::new(1)).unwrap();
        assert_eq!(cmd.get("--raw-data"), Some("{\"b\": 1, \"a\": {\"z\": 0, \"y\": 1}}"));
    }

    #[test]
    fn test_raw_data_omitted_without_body() {
        let cmd = WorkerCommand::build(&post_request(None), &LoadShapeSpec::new(1)).unwrap();
        assert!(cmd.get("--raw-data").is_none());
        assert!(!cmd.to_string().contains("--raw-data"));
    }

    #[test]
    fn test_verbose_is_always_last() {
        let mut request = RequestSpec::new("http://t/get", "GET")
            .with_body(RequestBody::List(vec![json!(1)]))
            .with_timeout("5s");
        request.disable_keepalive = true;
        let load = LoadShapeSpec::new(50).request_increase_rate(10).verbose(true);

        let cmd = WorkerCommand::build(&request, &load).unwrap();
        let args = cmd.args();
        assert_eq!(&args[args.len() - 2..], ["--verbose", "1"]);
        assert!(cmd.to_string().ends_with("--verbose 1"));
    }

    #[test]
    fn test_ramp_only_when_set() {
        let request = RequestSpec::new("http://t/get", "GET");

        let flat = WorkerCommand::build(&request, &LoadShapeSpec::new(10)).unwrap();
        assert!(flat.get("--request-increase-rate").is_none());

        let ramped = WorkerCommand::build(&request, &LoadShapeSpec::new(10).request_increase_rate(5)).unwrap();
        let args = ramped.args();
        assert_eq!(args[6], "--request-increase-rate");
        assert_eq!(args[7], "5");
    }

    #[test]
    fn test_args_are_unquoted() {
        let request = RequestSpec::new("http://t/post", "POST")
            .with_header("X-Trace", "on")
            .with_body(RequestBody::Map(
                json!({"a": "b", "n": [1, 2]}).as_object().cloned().unwrap(),
            ));
        let cmd = WorkerCommand::build(&request, &LoadShapeSpec::new(10).master("10.1.1.1", 6000)).unwrap();

        let args = cmd.args();
        let headers = args.iter().position(|a| a == "--json-headers").unwrap();
        assert_eq!(
            args[headers + 1],
            "{\"Content-Type\": \"application/json\", \"X-Trace\": \"on\"}"
        );
        assert_eq!(cmd.get("--raw-data"), Some("{\"a\": \"b\", \"n\": [1, 2]}"));
        assert_eq!(&args[..4], ["--master-host", "10.1.1.1", "--master-port", "6000"]);
    }

    #[test]
    fn test_values_pass_through_verbatim() {
        let request = RequestSpec::new("not a url", "BREW");
        let cmd = WorkerCommand::build(&request, &LoadShapeSpec::new(-3)).unwrap();
        assert_eq!(cmd.get("--url"), Some("not a url"));
        assert_eq!(cmd.get("--method"), Some("BREW"));
        assert_eq!(cmd.get("--max-rps"), Some("-3"));
    }
}
