//! JSON-RPC request handling and tool dispatch

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};
use unitkit_core::{UnitError, Value};
use unitkit_history::{ConverterSession, KeyValueStore};
use unitkit_plugin::{EvalContext, PluginRegistry};

pub const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "unitkit";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

// MCP Protocol types
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    /// `None` only when the member is absent; `"id": null` is `Some(Null)`
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<JsonValue>,
    pub method: String,
    #[serde(default)]
    pub params: Option<JsonValue>,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

impl McpResponse {
    fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    fn failure(id: Option<JsonValue>, error: McpError) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) }
    }
}

/// Successful tool output: a text block for the client plus structured data
fn tool_output(text: String, data: JsonValue) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": text }],
        "data": data,
        "isError": false
    })
}

/// Domain failures are tool results, not protocol errors
fn tool_error(err: &UnitError) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": err.to_string() }],
        "data": { "_error": err },
        "isError": true
    })
}

fn required_str<'a>(args: &'a JsonValue, name: &str) -> Result<&'a str, McpError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params(format!("Missing {} argument", name)))
}

fn to_json<T: Serialize>(value: &T) -> Result<JsonValue, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::new(INTERNAL_ERROR, e.to_string()))
}

fn encode(response: &McpResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode response");
        json!({
            "jsonrpc": "2.0",
            "error": { "code": INTERNAL_ERROR, "message": "Internal error" }
        })
        .to_string()
    })
}

pub struct Server<S: KeyValueStore> {
    registry: PluginRegistry,
    ctx: EvalContext,
    session: ConverterSession<S>,
}

impl<S: KeyValueStore> Server<S> {
    pub fn new(session: ConverterSession<S>) -> Self {
        let ctx = EvalContext::new().with_decimals(session.decimals());
        Self {
            registry: unitkit_units::standard_registry(),
            ctx,
            session,
        }
    }

    pub fn session(&self) -> &ConverterSession<S> {
        &self.session
    }

    /// Handle one line of input. Returns the encoded response, or `None`
    /// for notifications.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let message: JsonValue = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                let err = McpError::new(PARSE_ERROR, format!("Parse error: {}", e));
                return Some(encode(&McpResponse::failure(Some(JsonValue::Null), err)));
            }
        };

        // Echo whatever id we can find; null when there is none
        let raw_id = message.get("id").cloned().unwrap_or(JsonValue::Null);
        let request: McpRequest = match serde_json::from_value(message) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "malformed request");
                let err = McpError::new(INVALID_REQUEST, format!("Invalid request: {}", e));
                return Some(encode(&McpResponse::failure(Some(raw_id), err)));
            }
        };

        debug!(method = %request.method, "processing");
        let response = self.handle_request(&request);

        // Only a request without an id member is a notification
        if request.id.is_none() {
            debug!(method = %request.method, "notification processed");
            return None;
        }
        Some(encode(&response))
    }

    pub fn handle_request(&mut self, request: &McpRequest) -> McpResponse {
        if request.jsonrpc != "2.0" {
            return McpResponse::failure(
                request.id.clone(),
                McpError::new(INVALID_REQUEST, format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
            );
        }

        let result = match request.method.as_str() {
            // Lifecycle
            "initialize" => handle_initialize(&request.params),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),

            // Tools
            "tools/list" => Ok(tools_list()),
            "tools/call" => self.handle_tool_call(&request.params),

            _ => Err(McpError::new(METHOD_NOT_FOUND, format!("Method not found: {}", request.method))),
        };

        match result {
            Ok(r) => McpResponse::success(request.id.clone(), r),
            Err(e) => McpResponse::failure(request.id.clone(), e),
        }
    }

    fn handle_tool_call(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params
            .as_ref()
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        // Only failures from this call are reported
        self.session.take_storage_error();

        match name {
            "convert" => self.tool_convert(&args),
            "list_categories" => Ok(self.tool_list_categories()),
            "list_units" => self.tool_list_units(&args),
            "history" => self.tool_history(&args),
            "clear_history" => Ok(self.tool_clear_history()),
            "favorites" => self.tool_favorites(),
            "add_favorite" => self.tool_add_favorite(&args),
            "remove_favorite" => self.tool_remove_favorite(&args),
            "help" => Ok(self.tool_help(&args)),
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn tool_convert(&mut self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let value = args
            .get("value")
            .map(Value::from_json)
            .ok_or_else(|| McpError::invalid_params("Missing value argument"))?;
        let category = required_str(args, "category")?;
        let from_unit = required_str(args, "from_unit")?;
        let to_unit = required_str(args, "to_unit")?;

        match self.session.convert_value(category, from_unit, to_unit, &value) {
            Ok(result) => {
                let text = format!(
                    "{} {} = {} {}",
                    result.from_value, result.from_unit_name, result.to_value, result.to_unit_name
                );
                Ok(tool_output(text, to_json(&result)?))
            }
            Err(e) => Ok(tool_error(&UnitError::from(e))),
        }
    }

    fn tool_list_categories(&self) -> JsonValue {
        let categories = self.registry.call_function("categories", &[], &self.ctx);
        let lines: Vec<String> = categories
            .as_list()
            .unwrap_or_default()
            .iter()
            .map(|c| format!("- {} ({}), base unit {}", c.get("id"), c.get("name"), c.get("base_unit")))
            .collect();
        tool_output(lines.join("\n"), categories.to_json())
    }

    fn tool_list_units(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let category = required_str(args, "category")?;
        let units = self
            .registry
            .call_function("units", &[Value::from(category)], &self.ctx);
        if let Some(err) = units.as_error() {
            return Ok(tool_error(err));
        }
        let lines: Vec<String> = units
            .as_list()
            .unwrap_or_default()
            .iter()
            .map(|u| format!("- {}: {}", u.get("code"), u.get("name")))
            .collect();
        Ok(tool_output(lines.join("\n"), units.to_json()))
    }

    fn tool_history(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map_or(usize::MAX, |n| n as usize);
        let records: Vec<_> = self.session.history().recent().take(limit).collect();

        let text = if records.is_empty() {
            "No conversions yet".to_string()
        } else {
            records
                .iter()
                .map(|r| {
                    format!(
                        "{} {} = {} {} ({})",
                        r.result.from_value,
                        r.result.from_unit,
                        r.result.to_value,
                        r.result.to_unit,
                        r.timestamp.to_rfc3339()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(tool_output(text, to_json(&records)?))
    }

    fn tool_clear_history(&mut self) -> JsonValue {
        self.session.clear_history();
        if let Some(failure) = self.storage_failure() {
            return failure;
        }
        tool_output("History cleared".to_string(), json!([]))
    }

    /// A storage failure left by the last session call, as a tool error
    fn storage_failure(&mut self) -> Option<JsonValue> {
        self.session
            .take_storage_error()
            .map(|e| tool_error(&UnitError::storage(e.to_string())))
    }

    fn tool_favorites(&self) -> Result<JsonValue, McpError> {
        let favorites = self.session.favorites().list();
        let text = if favorites.is_empty() {
            "No favorites".to_string()
        } else {
            favorites
                .iter()
                .map(|f| format!("- [{}] {} to {} ({})", f.id, f.from_unit_name, f.to_unit_name, f.category))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(tool_output(text, to_json(&favorites)?))
    }

    fn tool_add_favorite(&mut self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let category = required_str(args, "category")?;
        let from_unit = required_str(args, "from_unit")?;
        let to_unit = required_str(args, "to_unit")?;

        match self.session.favorite_units(category, from_unit, to_unit) {
            Ok(added) => {
                if let Some(failure) = self.storage_failure() {
                    return Ok(failure);
                }
                let text = if added {
                    format!("Added {} -> {} to favorites", from_unit, to_unit)
                } else {
                    format!("{} -> {} is already a favorite", from_unit, to_unit)
                };
                Ok(tool_output(text, to_json(&self.session.favorites().list())?))
            }
            Err(e) => Ok(tool_error(&UnitError::from(e))),
        }
    }

    fn tool_remove_favorite(&mut self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let id = required_str(args, "id")?;
        if !self.session.remove_favorite(id) {
            return Ok(tool_error(&UnitError::not_found(format!("favorite '{}'", id))));
        }
        if let Some(failure) = self.storage_failure() {
            return Ok(failure);
        }
        Ok(tool_output(
            format!("Removed favorite {}", id),
            to_json(&self.session.favorites().list())?,
        ))
    }

    fn tool_help(&self, args: &JsonValue) -> JsonValue {
        let name = args.get("name").and_then(|v| v.as_str());
        let help = self.registry.help(name);
        match help.as_error() {
            Some(err) => tool_error(err),
            None => tool_output(format_help(&help), help.to_json()),
        }
    }
}

fn format_help(help: &Value) -> String {
    match help {
        Value::Object(map) => {
            let mut out = String::new();
            if let Some(Value::Text(n)) = map.get("name") { out.push_str(&format!("# {}\n\n", n)); }
            if let Some(Value::Text(d)) = map.get("description") { out.push_str(&format!("{}\n\n", d)); }
            if let Some(Value::Text(u)) = map.get("usage") { out.push_str(&format!("**Usage:** `{}`\n\n", u)); }
            if let Some(Value::Object(funcs)) = map.get("functions") {
                let mut cats: Vec<&String> = funcs.keys().collect();
                cats.sort();
                for cat in cats {
                    out.push_str(&format!("**{}:** {}\n", cat, funcs[cat]));
                }
            }
            out
        }
        other => other.to_string(),
    }
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params.as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Echo the client's protocol version
    let client_protocol = params.as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Unit conversion across length, weight, temperature, area, volume, speed and time"
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "instructions": "Use 'list_categories' and 'list_units' to discover unit codes, then 'convert'. Successful conversions are kept in 'history'; frequently used unit pairs can be saved with 'add_favorite'."
    }))
}

fn tools_list() -> JsonValue {
    let unit_pair = json!({
        "category": { "type": "string", "description": "Category id, e.g. \"length\"" },
        "from_unit": { "type": "string", "description": "Source unit code, e.g. \"m\"" },
        "to_unit": { "type": "string", "description": "Target unit code, e.g. \"km\"" }
    });
    let mut convert_props = unit_pair.clone();
    convert_props["value"] = json!({
        "type": ["number", "string"],
        "description": "Value to convert; numeric strings are accepted"
    });

    json!({
        "tools": [
            {
                "name": "convert",
                "description": "Convert a value between two units of the same category. Results are rounded to the configured decimal places and recorded in history.",
                "inputSchema": {
                    "type": "object",
                    "properties": convert_props,
                    "required": ["value", "category", "from_unit", "to_unit"]
                }
            },
            {
                "name": "list_categories",
                "description": "List measurement categories with their base units.",
                "inputSchema": { "type": "object", "properties": {} }
            },
            {
                "name": "list_units",
                "description": "List the units of a category in display order.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": { "type": "string", "description": "Category id" }
                    },
                    "required": ["category"]
                }
            },
            {
                "name": "history",
                "description": "Recent successful conversions, most recent first.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum number of records" }
                    }
                }
            },
            {
                "name": "clear_history",
                "description": "Delete all recorded conversions.",
                "inputSchema": { "type": "object", "properties": {} }
            },
            {
                "name": "favorites",
                "description": "List favorite unit pairs.",
                "inputSchema": { "type": "object", "properties": {} }
            },
            {
                "name": "add_favorite",
                "description": "Save a unit pair as a favorite. Adding an existing pair is a no-op.",
                "inputSchema": {
                    "type": "object",
                    "properties": unit_pair,
                    "required": ["category", "from_unit", "to_unit"]
                }
            },
            {
                "name": "remove_favorite",
                "description": "Remove a favorite by id.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Favorite id (fav-...)" }
                    },
                    "required": ["id"]
                }
            },
            {
                "name": "help",
                "description": "Documentation for the conversion functions. Call without a name for an overview.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Function name, e.g. \"convert\"" }
                    }
                }
            }
        ]
    })
}
