// Artifactory MCP Gateway - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Exposes: list_artifacts, get_artifact_details, read_artifact_text,
//          write_artifact_text, list_artifactory_capabilities,
//          invoke_artifactory_root_method, invoke_artifactory_path_method,
//          invoke_artifactory_handle_method, list_artifactory_handles,
//          drop_artifactory_handle
//
// Tool call bodies run on the worker pool; stdout writes are whole-line
// under a lock, so concurrent responses never interleave mid-message.

use chrono::Local;
use serde_json::{json, Map, Value};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::artifact_ops;
use crate::bridge::{self, BridgeObject};
use crate::client::{create_path, create_root, resolve_base_url};
use crate::errors::{format_error, BridgeError};
use crate::handles::{self, HandleStore};
use crate::pool::WorkerPool;
use crate::settings::ServerSettings;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "artifactory-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared per-process state handed to every tool call.
#[derive(Clone)]
pub struct Ctx {
    pub settings: Arc<ServerSettings>,
    pub store: Arc<HandleStore>,
}

/// Log to stderr (stdout is JSON-RPC)
fn log(msg: &str) {
    eprintln!("[artifactory-mcp] {}", msg);
}

/// Persistent command log, appended when MCP_CALL_LOG is configured.
fn cmd_log(settings: &ServerSettings, msg: &str) {
    let Some(log_path) = &settings.mcp_call_log else {
        return;
    };
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(log_path) {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(f, "[{}] {}", ts, msg);
    }
}

/// Summarize tool params for logging (truncate large values)
fn param_summary(name: &str, args: &Value) -> String {
    match name {
        n if n.contains("invoke") => {
            let method = args.get("method").and_then(|v| v.as_str()).unwrap_or("?");
            let target = args
                .get("handle_id")
                .or_else(|| args.get("repository"))
                .and_then(|v| v.as_str())
                .unwrap_or("root");
            format!("target={} method={}", target, method)
        }
        n if n.contains("handle") => {
            let handle_id = args.get("handle_id").and_then(|v| v.as_str()).unwrap_or("?");
            format!("handle_id={}", handle_id)
        }
        n if n.contains("write") => {
            let repo = args.get("repository").and_then(|v| v.as_str()).unwrap_or("?");
            let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
            let size = args.get("content").and_then(|v| v.as_str()).map(|s| s.len()).unwrap_or(0);
            format!("repo={} path={} content_len={}", repo, path, size)
        }
        n if n.contains("read") || n.contains("list_artifacts") || n.contains("details") => {
            let repo = args.get("repository").and_then(|v| v.as_str()).unwrap_or("?");
            let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
            format!("repo={} path={}", repo, path)
        }
        _ => {
            let s = args.to_string();
            if s.len() > 300 { format!("{}…", &s[..300]) } else { s }
        }
    }
}

/// Send JSON-RPC response
fn send_response(id: &Value, result: Value) {
    let response = json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    });
    let msg = serde_json::to_string(&response).unwrap();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = out.write_all(msg.as_bytes());
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

/// Send JSON-RPC error response
fn send_error(id: &Value, code: i64, message: &str) {
    let response = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    });
    let msg = serde_json::to_string(&response).unwrap();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = out.write_all(msg.as_bytes());
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

/// MCP tool definition helper
fn tool_def(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// Return all tool definitions
fn tool_definitions() -> Vec<Value> {
    vec![
        // ====== CONVENIENCE ARTIFACT TOOLS ======
        tool_def(
            "list_artifacts",
            "List artifacts under a repository path with optional filtering and recursion.",
            json!({
                "repository": {"type": "string", "description": "Repository name"},
                "path": {"type": "string", "description": "Path inside the repository", "default": ""},
                "recursive": {"type": "boolean", "description": "Descend into subfolders", "default": false},
                "pattern": {"type": "string", "description": "Wildcard filter (*, ?, **)", "default": "*"},
                "include_directories": {"type": "boolean", "default": true},
                "include_stats": {"type": "boolean", "description": "Include size and last_modified per entry", "default": false},
                "max_items": {"type": "integer", "description": "Truncation cap, 1..1000", "default": 200},
                "base_url": {"type": "string", "description": "Override the configured base URL"}
            }),
            vec!["repository"],
        ),
        tool_def(
            "get_artifact_details",
            "Fetch metadata for an artifact or folder, including optional properties and download stats.",
            json!({
                "repository": {"type": "string", "description": "Repository name"},
                "path": {"type": "string", "description": "Path inside the repository"},
                "include_properties": {"type": "boolean", "default": true},
                "include_download_stats": {"type": "boolean", "default": false},
                "base_url": {"type": "string", "description": "Override the configured base URL"}
            }),
            vec!["repository", "path"],
        ),
        tool_def(
            "read_artifact_text",
            "Read a text artifact when its size is below max_bytes.",
            json!({
                "repository": {"type": "string", "description": "Repository name"},
                "path": {"type": "string", "description": "Path to a file in the repository"},
                "encoding": {"type": "string", "default": "utf-8"},
                "max_bytes": {"type": "integer", "description": "Size guard, 1..5000000", "default": 200000},
                "base_url": {"type": "string", "description": "Override the configured base URL"}
            }),
            vec!["repository", "path"],
        ),
        tool_def(
            "write_artifact_text",
            "Upload text content as an artifact, with optional parent folder creation.",
            json!({
                "repository": {"type": "string", "description": "Repository name"},
                "path": {"type": "string", "description": "Path to a file in the repository"},
                "content": {"type": "string", "description": "Text content to upload"},
                "encoding": {"type": "string", "default": "utf-8"},
                "overwrite": {"type": "boolean", "description": "Replace an existing artifact", "default": false},
                "create_parents": {"type": "boolean", "default": true},
                "base_url": {"type": "string", "description": "Override the configured base URL"}
            }),
            vec!["repository", "path", "content"],
        ),

        // ====== GENERIC BRIDGE TOOLS ======
        tool_def(
            "list_artifactory_capabilities",
            "List the public method surface of the Artifactory client and the bridge argument conventions.",
            json!({}),
            vec![],
        ),
        tool_def(
            "invoke_artifactory_root_method",
            "Invoke any public method on the root Artifactory object for admin/query-level functionality.",
            json!({
                "method": {"type": "string", "description": "Public method name"},
                "positional_args": {"type": "array", "description": "JSON-encoded positional arguments"},
                "keyword_args": {"type": "object", "description": "JSON-encoded keyword arguments"},
                "base_url": {"type": "string", "description": "Override the configured base URL"},
                "max_items": {"type": "integer", "description": "Truncation cap, 1..10000"}
            }),
            vec!["method"],
        ),
        tool_def(
            "invoke_artifactory_path_method",
            "Invoke any public method on a repository path object for artifact-level functionality.",
            json!({
                "repository": {"type": "string", "description": "Repository name"},
                "method": {"type": "string", "description": "Public method name"},
                "path": {"type": "string", "description": "Path inside the repository", "default": ""},
                "positional_args": {"type": "array", "description": "JSON-encoded positional arguments"},
                "keyword_args": {"type": "object", "description": "JSON-encoded keyword arguments"},
                "base_url": {"type": "string", "description": "Override the configured base URL"},
                "max_items": {"type": "integer", "description": "Truncation cap, 1..10000"}
            }),
            vec!["repository", "method"],
        ),
        tool_def(
            "invoke_artifactory_handle_method",
            "Invoke a method on an object previously returned as a handle from bridge tools.",
            json!({
                "handle_id": {"type": "string", "description": "Handle id, e.g. h1"},
                "method": {"type": "string", "description": "Public method name"},
                "positional_args": {"type": "array", "description": "JSON-encoded positional arguments"},
                "keyword_args": {"type": "object", "description": "JSON-encoded keyword arguments"},
                "max_items": {"type": "integer", "description": "Truncation cap, 1..10000"}
            }),
            vec!["handle_id", "method"],
        ),
        tool_def(
            "list_artifactory_handles",
            "List active object handles produced by generic invocation tools.",
            json!({}),
            vec![],
        ),
        tool_def(
            "drop_artifactory_handle",
            "Idempotently remove a stored handle and report whether it existed.",
            json!({
                "handle_id": {"type": "string", "description": "Handle id, e.g. h1"}
            }),
            vec!["handle_id"],
        ),
    ]
}

// ====== ARGUMENT EXTRACTION ======

fn required_str(args: &Value, key: &str) -> Result<String, BridgeError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(BridgeError::validation(format!("Argument '{}' must be a string.", key))),
        None => Err(BridgeError::validation(format!("Missing required argument: {}.", key))),
    }
}

fn opt_str(args: &Value, key: &str) -> Result<Option<String>, BridgeError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(BridgeError::validation(format!("Argument '{}' must be a string.", key))),
    }
}

fn opt_bool(args: &Value, key: &str, default: bool) -> Result<bool, BridgeError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(BridgeError::validation(format!("Argument '{}' must be a boolean.", key))),
    }
}

fn opt_i64(args: &Value, key: &str) -> Result<Option<i64>, BridgeError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            BridgeError::validation(format!("Argument '{}' must be an integer.", key))
        }),
        Some(_) => Err(BridgeError::validation(format!("Argument '{}' must be an integer.", key))),
    }
}

fn positional_args(args: &Value) -> Result<Vec<Value>, BridgeError> {
    match args.get("positional_args") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(BridgeError::validation("Argument 'positional_args' must be an array.")),
    }
}

fn keyword_args(args: &Value) -> Result<Map<String, Value>, BridgeError> {
    match args.get("keyword_args") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(BridgeError::validation("Argument 'keyword_args' must be an object.")),
    }
}

/// Handle a tool call
pub fn handle_tool_call(name: &str, args: &Value, ctx: &Ctx) -> Result<Value, BridgeError> {
    match name {
        // ====== CONVENIENCE TOOLS ======
        "list_artifacts" => {
            let result = artifact_ops::list_artifacts(
                &ctx.settings,
                &required_str(args, "repository")?,
                &opt_str(args, "path")?.unwrap_or_default(),
                opt_bool(args, "recursive", false)?,
                &opt_str(args, "pattern")?.unwrap_or_else(|| "*".to_string()),
                opt_bool(args, "include_directories", true)?,
                opt_bool(args, "include_stats", false)?,
                opt_i64(args, "max_items")?.unwrap_or(200),
                opt_str(args, "base_url")?.as_deref(),
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "get_artifact_details" => {
            let result = artifact_ops::get_artifact_details(
                &ctx.settings,
                &ctx.store,
                &required_str(args, "repository")?,
                &required_str(args, "path")?,
                opt_bool(args, "include_properties", true)?,
                opt_bool(args, "include_download_stats", false)?,
                opt_str(args, "base_url")?.as_deref(),
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "read_artifact_text" => {
            let result = artifact_ops::read_artifact_text(
                &ctx.settings,
                &required_str(args, "repository")?,
                &required_str(args, "path")?,
                &opt_str(args, "encoding")?.unwrap_or_else(|| "utf-8".to_string()),
                opt_i64(args, "max_bytes")?.unwrap_or(200_000),
                opt_str(args, "base_url")?.as_deref(),
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "write_artifact_text" => {
            let result = artifact_ops::write_artifact_text(
                &ctx.settings,
                &required_str(args, "repository")?,
                &required_str(args, "path")?,
                &required_str(args, "content")?,
                &opt_str(args, "encoding")?.unwrap_or_else(|| "utf-8".to_string()),
                opt_bool(args, "overwrite", false)?,
                opt_bool(args, "create_parents", true)?,
                opt_str(args, "base_url")?.as_deref(),
            )?;
            Ok(serde_json::to_value(result)?)
        }

        // ====== GENERIC BRIDGE TOOLS ======
        "list_artifactory_capabilities" => Ok(serde_json::to_value(bridge::list_capabilities())?),

        "invoke_artifactory_root_method" => {
            let base_url = resolve_base_url(opt_str(args, "base_url")?.as_deref(), &ctx.settings)?;
            let root = create_root(&base_url, &ctx.settings)?;
            let label = format!("root:{}", root.uri());
            let result = bridge::invoke_method(
                &ctx.store,
                &ctx.settings,
                &root,
                &label,
                &required_str(args, "method")?,
                &positional_args(args)?,
                &keyword_args(args)?,
                opt_i64(args, "max_items")?,
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "invoke_artifactory_path_method" => {
            let base_url = resolve_base_url(opt_str(args, "base_url")?.as_deref(), &ctx.settings)?;
            let target = create_path(
                &base_url,
                &required_str(args, "repository")?,
                &opt_str(args, "path")?.unwrap_or_default(),
                &ctx.settings,
            )?;
            let label = format!("path:{}", target.uri());
            let result = bridge::invoke_method(
                &ctx.store,
                &ctx.settings,
                &target,
                &label,
                &required_str(args, "method")?,
                &positional_args(args)?,
                &keyword_args(args)?,
                opt_i64(args, "max_items")?,
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "invoke_artifactory_handle_method" => {
            let handle_id = required_str(args, "handle_id")?;
            let target = ctx.store.get(&handle_id)?;
            let label = format!("handle:{}:{}", handle_id, target.class_name());
            let result = bridge::invoke_method(
                &ctx.store,
                &ctx.settings,
                target.as_ref(),
                &label,
                &required_str(args, "method")?,
                &positional_args(args)?,
                &keyword_args(args)?,
                opt_i64(args, "max_items")?,
            )?;
            Ok(serde_json::to_value(result)?)
        }

        "list_artifactory_handles" => Ok(serde_json::to_value(ctx.store.list())?),

        "drop_artifactory_handle" => {
            let result = handles::drop_handle(&ctx.store, &required_str(args, "handle_id")?)?;
            Ok(serde_json::to_value(result)?)
        }

        _ => Err(BridgeError::not_found(format!("Unknown tool: {}", name))),
    }
}

/// Render a finished tool call as MCP text content.
fn call_content(name: &str, args: &Value, ctx: &Ctx) -> Value {
    match handle_tool_call(name, args, ctx) {
        Ok(result) => {
            json!({"type": "text", "text": serde_json::to_string_pretty(&result).unwrap()})
        }
        Err(err) => {
            let message = format!("ERROR: {}", format_error(name, &err));
            let snippet: String = message.chars().take(200).collect();
            cmd_log(&ctx.settings, &format!("FAIL {} | {}", name, snippet));
            json!({"type": "text", "text": message})
        }
    }
}

/// Run the MCP server loop. Blocks until stdin closes.
pub fn run(settings: ServerSettings) {
    log(&format!("Starting {} v{}", SERVER_NAME, SERVER_VERSION));
    log(&format!(
        "Base URL: {}",
        settings
            .artifactory_base_url
            .as_deref()
            .unwrap_or("(unset — tool calls must pass base_url)")
    ));
    log(&format!("Worker threads: {}", settings.mcp_worker_threads));

    let pool = WorkerPool::new(settings.mcp_worker_threads);
    let ctx = Ctx {
        settings: Arc::new(settings),
        store: Arc::new(HandleStore::new()),
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log(&format!("stdin read error: {}", e));
                continue;
            }
        };

        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let msg: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                log(&format!("JSON parse error: {}", e));
                continue;
            }
        };

        let method = msg["method"].as_str().unwrap_or("");
        let id = &msg["id"];
        let params = &msg["params"];

        log(&format!("Received: {}", method));

        match method {
            "initialize" => {
                send_response(id, json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION,
                    }
                }));
            }

            "notifications/initialized" => {
                // No response needed
            }

            "tools/list" => {
                send_response(id, json!({ "tools": tool_definitions() }));
            }

            "tools/call" => {
                let name = params["name"].as_str().unwrap_or("").to_string();
                let args = params.get("arguments").cloned().unwrap_or(json!({}));
                let id = id.clone();
                let ctx = ctx.clone();

                // Network-bound work runs off the read loop so one slow
                // call never stalls the others.
                pool.execute(move || {
                    cmd_log(&ctx.settings, &format!("CALL {} | {}", name, param_summary(&name, &args)));
                    let content = call_content(&name, &args, &ctx);
                    send_response(&id, json!({
                        "content": [content]
                    }));
                });
            }

            "ping" => {
                send_response(id, json!({}));
            }

            _ => {
                if !id.is_null() {
                    send_error(id, -32601, &format!("Unknown method: {}", method));
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
