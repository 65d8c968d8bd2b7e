//! Agent-facing wrapper around [`Editor`]: every call yields one
//! `<oh_aci_output_{id}>` envelope holding the result as JSON.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::editor::{EditRequest, Editor};
use crate::error::{AciError, Result};
use crate::results::ToolResult;

pub const ENVELOPE_PREFIX: &str = "oh_aci_output_";

static ENVELOPE_RE: OnceLock<Regex> = OnceLock::new();

fn envelope_re() -> &'static Regex {
    ENVELOPE_RE.get_or_init(|| {
        Regex::new(r"(?s)<oh_aci_output_([0-9a-f]+)>\n(.*)\n</oh_aci_output_([0-9a-f]+)>").unwrap()
    })
}

/// Run `req` and wrap the outcome. Errors never escape: they are reported
/// in the envelope's `error` field.
pub fn file_editor(editor: &Editor, req: &EditRequest) -> String {
    let result = match editor.execute(req) {
        Ok(result) => result,
        Err(e) => {
            if !e.is_tool_error() {
                tracing::warn!(command = %req.command, path = %req.path, error = %e, "editor call failed");
            }
            ToolResult::error(e.to_string())
        }
    };
    wrap(&result, &uuid::Uuid::new_v4().simple().to_string())
}

fn wrap(result: &ToolResult, marker: &str) -> String {
    let mut body = match result.to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert(
        "formatted_output_and_error".into(),
        Value::String(result.formatted()),
    );
    let json = serde_json::to_string(&Value::Object(body)).unwrap_or_else(|_| "{}".into());
    format!("<{ENVELOPE_PREFIX}{marker}>\n{json}\n</{ENVELOPE_PREFIX}{marker}>")
}

/// Extract the JSON payload from an envelope produced by [`file_editor`].
pub fn parse_envelope(text: &str) -> Result<Value> {
    let caps = envelope_re()
        .captures(text)
        .ok_or_else(|| AciError::Parse("no oh_aci_output envelope found".into()))?;
    if caps[1] != caps[3] {
        return Err(AciError::Parse("envelope markers do not match".into()));
    }
    Ok(serde_json::from_str(&caps[2])?)
}
