//! JSON-RPC IPC worker process.
//!
//! Reads line-delimited JSON requests from stdin, dispatches to a single
//! long-lived `Session`, writes JSON responses to stdout. Generalized
//! from `wmcp-worker`'s ad hoc methods (`system_info`, `send_text`, ...)
//! to the six Agent RPC tools of `original_source/cup/mcp/server.py`:
//! `get_accessibility_tree`, `execute_action`, `press_keys`,
//! `find_element`, `batch_actions`, `screenshot` -- an envelope over
//! plain JSON-RPC rather than an MCP SDK, which this dependency stack
//! doesn't carry.

use std::io::{self, BufRead, Write};

use clap::Parser;
use cup_core::cup::executor::ActionParams;
use cup_core::cup::node::{Bounds, Role, State};
use cup_core::cup::pruner::Detail;
use cup_core::cup::session::{ActionSpec, Scope, Session};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cup-worker", about = "CUP JSON-RPC IPC worker process")]
struct Args {
    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize)]
struct Request {
    id: u64,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Serialize)]
struct Response {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn str_param(params: &serde_json::Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn usize_param(params: &serde_json::Value, key: &str, default: usize) -> usize {
    params.get(key).and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(default)
}

fn parse_detail(s: Option<&str>) -> Detail {
    match s {
        Some("minimal") => Detail::Minimal,
        Some("full") => Detail::Full,
        _ => Detail::Standard,
    }
}

fn get_accessibility_tree(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let scope_str = str_param(params, "scope").unwrap_or_else(|| "foreground".to_string());
    let scope = Scope::parse(&scope_str).ok_or_else(|| format!("unknown scope '{scope_str}'"))?;
    let app = str_param(params, "app");
    // Matches original_source/cup/mcp/server.py: the app filter only
    // applies when scope == "full".
    let app_filter = if scope == Scope::Full { app.as_deref() } else { None };
    let max_depth = usize_param(params, "max_depth", 0);
    let depth = if max_depth > 0 { max_depth } else { 999 };
    let detail = parse_detail(str_param(params, "detail").as_deref());

    session
        .capture_compact(scope, app_filter, depth, detail)
        .map(serde_json::Value::String)
        .map_err(|e| e.to_string())
}

fn execute_action(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let element_id = str_param(params, "element_id").ok_or("missing 'element_id'")?;
    let action = str_param(params, "action").ok_or("missing 'action'")?;
    let action_params = ActionParams {
        value: str_param(params, "value"),
        direction: str_param(params, "direction"),
    };
    let result = session.execute(&element_id, &action, action_params);
    serde_json::to_value(result).map_err(|e| e.to_string())
}

fn press_keys(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let keys = str_param(params, "keys").ok_or("missing 'keys'")?;
    let result = session.press_keys(&keys);
    serde_json::to_value(result).map_err(|e| e.to_string())
}

fn find_element(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let role = str_param(params, "role");
    let name = str_param(params, "name");
    let state = str_param(params, "state");

    if role.is_none() && name.is_none() && state.is_none() {
        return Err("At least one search criterion (role, name, or state) must be provided.".into());
    }

    let role = role
        .map(|r| serde_json::from_value::<Role>(serde_json::Value::String(r.clone())).map_err(|_| format!("unknown role '{r}'")))
        .transpose()?;
    let state = state
        .map(|s| serde_json::from_value::<State>(serde_json::Value::String(s.clone())).map_err(|_| format!("unknown state '{s}'")))
        .transpose()?;

    let matches = session
        .find_elements(role, name.as_deref(), state)
        .map_err(|e| e.to_string())?;
    serde_json::to_value(matches).map_err(|e| e.to_string())
}

fn batch_actions(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let raw = params
        .get("actions")
        .and_then(|v| v.as_array())
        .ok_or("missing 'actions' array")?;

    if raw.is_empty() {
        return Err("No actions provided.".into());
    }

    let specs: Vec<ActionSpec> = raw
        .iter()
        .map(|a| ActionSpec {
            element_id: str_param(a, "element_id"),
            action: str_param(a, "action").unwrap_or_default(),
            value: str_param(a, "value"),
            direction: str_param(a, "direction"),
            keys: str_param(a, "keys"),
        })
        .collect();

    let results = session.batch_execute(&specs);
    serde_json::to_value(results).map_err(|e| e.to_string())
}

fn screenshot(session: &mut Session, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    let xs = ["region_x", "region_y", "region_w", "region_h"];
    let present: Vec<bool> = xs.iter().map(|k| params.get(*k).is_some()).collect();
    let has_any = present.iter().any(|p| *p);
    let has_all = present.iter().all(|p| *p);

    if has_any && !has_all {
        return Err(
            "All region parameters (region_x, region_y, region_w, region_h) must be provided together, or none at all."
                .into(),
        );
    }

    let region = if has_all {
        Some(Bounds {
            x: params["region_x"].as_i64().unwrap_or(0) as i32,
            y: params["region_y"].as_i64().unwrap_or(0) as i32,
            w: params["region_w"].as_i64().unwrap_or(0) as i32,
            h: params["region_h"].as_i64().unwrap_or(0) as i32,
        })
    } else {
        None
    };

    let png = session.screenshot(region).map_err(|e| e.to_string())?;
    Ok(serde_json::Value::String(base64_encode(&png)))
}

/// Minimal base64 encoder (standard alphabet, padded) -- the PNG bytes
/// need to round-trip through a JSON string field, and no base64 crate
/// is in this workspace's dependency stack.
fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(b2 & 0x3f) as usize] as char } else { '=' });
    }
    out
}

fn dispatch(session: &mut Session, method: &str, params: &serde_json::Value) -> Result<serde_json::Value, String> {
    match method {
        "get_accessibility_tree" => get_accessibility_tree(session, params),
        "execute_action" => execute_action(session, params),
        "press_keys" => press_keys(session, params),
        "find_element" => find_element(session, params),
        "batch_actions" => batch_actions(session, params),
        "screenshot" => screenshot(session, params),
        "ping" => Ok(serde_json::Value::String("pong".to_owned())),
        _ => Err(format!("unknown method: {method}")),
    }
}

fn main() {
    let args = Args::parse();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = Session::new();

    if args.verbose {
        eprintln!("cup-worker: ready");
    }

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                if args.verbose {
                    eprintln!("cup-worker: stdin read error: {e}");
                }
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let req: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let resp = Response { id: 0, result: None, error: Some(format!("invalid JSON: {e}")) };
                if let Ok(json) = serde_json::to_string(&resp) {
                    let _ = writeln!(stdout, "{json}");
                    let _ = stdout.flush();
                }
                continue;
            }
        };

        let resp = match dispatch(&mut session, &req.method, &req.params) {
            Ok(result) => Response { id: req.id, result: Some(result), error: None },
            Err(error) => Response { id: req.id, result: None, error: Some(error) },
        };

        if let Ok(json) = serde_json::to_string(&resp) {
            let _ = writeln!(stdout, "{json}");
        } else {
            let _ = writeln!(stdout, r#"{{"id":{},"error":"response serialization failed"}}"#, req.id);
        }
        let _ = stdout.flush();
    }
}
