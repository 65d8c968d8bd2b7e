//! MCP server over stdio: one JSON-RPC 2.0 message per line in, one per line out.
//!
//! The server exposes the four tools from [`crate::tools`]. Tool failures are
//! reported inside a successful `tools/call` result with `isError` set, while
//! protocol failures (bad JSON, unknown method, bad params) are JSON-RPC errors.

use crate::tools::{self, AciTool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Protocol-level failure of a single request.
struct Failure(i32, String);

pub struct Server {
    root: PathBuf,
    tools: Vec<Box<dyn AciTool>>,
}

impl Server {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            tools: tools::all_tools(),
        }
    }

    /// Answer requests from `input` until it closes.
    pub fn serve(&self, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line?;
            if let Some(response) = self.handle_line(&line) {
                serde_json::to_writer(&mut output, &response)?;
                writeln!(output)?;
                output.flush()?;
            }
        }
        Ok(())
    }

    /// `None` for blank lines and notifications, which get no reply.
    fn handle_line(&self, line: &str) -> Option<Response> {
        if line.trim().is_empty() {
            return None;
        }
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return Some(Response::err(Value::Null, PARSE_ERROR, format!("parse error: {e}"))),
        };
        if message.get("id").is_none() {
            if let Some(method) = message.get("method").and_then(Value::as_str) {
                tracing::debug!(method, "notification");
            }
            return None;
        }

        let request: Request = match serde_json::from_value(message) {
            Ok(r) => r,
            Err(e) => {
                return Some(Response::err(
                    Value::Null,
                    INVALID_REQUEST,
                    format!("invalid request: {e}"),
                ))
            }
        };
        Some(self.handle(request))
    }

    fn handle(&self, request: Request) -> Response {
        let outcome = match request.method.as_str() {
            "initialize" => Ok(initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(&request.params),
            other => Err(Failure(METHOD_NOT_FOUND, format!("method not found: {other}"))),
        };
        match outcome {
            Ok(result) => Response::ok(request.id, result),
            Err(Failure(code, message)) => Response::err(request.id, code, message),
        }
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    fn call_tool(&self, params: &Value) -> Result<Value, Failure> {
        if params.is_null() {
            return Err(Failure(INVALID_PARAMS, "missing params".into()));
        }
        let name = params["name"]
            .as_str()
            .ok_or_else(|| Failure(INVALID_PARAMS, "missing tool name in params".into()))?;
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Failure(METHOD_NOT_FOUND, format!("tool not found: {name}")))?;

        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        tracing::debug!(tool = name, "tools/call");
        let (text, is_error) = match tool.call(args, &self.root) {
            Ok(Value::String(text)) => (text, false),
            Ok(value) => (
                serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("serialization error: {e}")),
                false,
            ),
            Err(message) => {
                tracing::debug!(tool = name, "tool reported an error");
                (message, true)
            }
        };
        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error,
        }))
    }
}

fn initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": "aci",
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

pub fn run(root: &Path) -> anyhow::Result<()> {
    let server = Server::new(root);
    tracing::info!(root = %root.display(), tools = server.tools.len(), "mcp server listening on stdio");
    server.serve(std::io::stdin().lock(), std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Feed `lines` to a server rooted at `dir` and parse every reply.
    fn exchange(dir: &TempDir, lines: &[String]) -> Vec<Value> {
        let input = lines.join("\n");
        let mut output = Vec::new();
        Server::new(dir.path())
            .serve(input.as_bytes(), &mut output)
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn request(id: i64, method: &str, params: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
    }

    fn call(dir: &TempDir, tool: &str, arguments: Value) -> Value {
        let replies = exchange(
            dir,
            &[request(1, "tools/call", json!({"name": tool, "arguments": arguments}))],
        );
        assert_eq!(replies.len(), 1);
        replies[0].clone()
    }

    #[test]
    fn handshake_then_listing() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(
            &dir,
            &[
                request(1, "initialize", json!({"protocolVersion": PROTOCOL_VERSION, "capabilities": {}})),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
                request(2, "tools/list", json!({})),
            ],
        );

        assert_eq!(replies.len(), 2, "notification must not be answered");
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], "aci");
        assert!(replies[0]["result"]["capabilities"]["tools"].is_object());

        let listed = replies[1]["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = listed.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            ["oh_editor", "lint_file", "find_definition", "find_references"]
        );
        assert!(listed.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[test]
    fn ping_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(&dir, &["".into(), request(9, "ping", Value::Null), "   ".into()]);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], 9);
        assert_eq!(replies[0]["result"], json!({}));
    }

    #[test]
    fn malformed_line_gets_parse_error_and_server_continues() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(&dir, &["{not json".into(), request(2, "ping", Value::Null)]);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], PARSE_ERROR);
        assert!(replies[0]["id"].is_null());
        assert_eq!(replies[1]["id"], 2);
    }

    #[test]
    fn request_without_method_is_invalid() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(&dir, &[json!({"jsonrpc": "2.0", "id": 4}).to_string()]);
        assert_eq!(replies[0]["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn unknown_method_and_tool() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(&dir, &[request(6, "unknown/method", Value::Null)]);
        assert_eq!(replies[0]["error"]["code"], METHOD_NOT_FOUND);
        assert!(replies[0]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("method not found"));

        let reply = call(&dir, "nonexistent_tool", json!({}));
        assert!(reply.get("result").is_none());
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn tools_call_without_params_or_name() {
        let dir = TempDir::new().unwrap();
        let replies = exchange(
            &dir,
            &[
                request(7, "tools/call", Value::Null),
                request(8, "tools/call", json!({"arguments": {}})),
            ],
        );
        assert_eq!(replies[0]["error"]["code"], INVALID_PARAMS);
        assert_eq!(replies[1]["error"]["code"], INVALID_PARAMS);
        assert!(replies[1]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("tool name"));
    }

    #[test]
    fn editor_view_is_plain_text() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "first\nsecond\n").unwrap();

        let reply = call(
            &dir,
            "oh_editor",
            json!({"command": "view", "path": file.display().to_string()}),
        );
        let result = &reply["result"];
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Here's the result of running `cat -n`"));
        assert!(text.contains("     2\tsecond"));
        assert_eq!(result["isError"], false);
    }

    #[test]
    fn editor_failure_sets_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");

        let reply = call(
            &dir,
            "oh_editor",
            json!({"command": "view", "path": missing.display().to_string()}),
        );
        assert!(reply.get("error").is_none());
        assert_eq!(reply["result"]["isError"], true);
        assert!(reply["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("ERROR:\n"));
    }
}
