//! `cup_core_py` -- Thin PyO3 wrappers around `cup_core`.
//!
//! Each function releases the GIL via `py.allow_threads()` and converts
//! the Rust result to Python objects. All business logic lives in
//! `cup_core`; this crate only marshals types and owns the one
//! process-wide `Session` (serialized behind a `Mutex`, since a Python
//! process may call in from more than one thread even though the
//! accessibility APIs underneath are not meant to be hit concurrently).

use std::sync::{Mutex, OnceLock};

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use cup_core::cup::executor::{ActionParams, ActionResult};
use cup_core::cup::node::{Bounds, CupNode, Role, State};
use cup_core::cup::pruner::Detail;
use cup_core::cup::session::{ActionSpec, Scope, Session};
use cup_core::error::CupError;

// ---------------------------------------------------------------------------
// Session singleton
// ---------------------------------------------------------------------------

static SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

fn session() -> &'static Mutex<Session> {
    SESSION.get_or_init(|| Mutex::new(Session::new()))
}

fn to_py_err(e: CupError) -> PyErr {
    PyRuntimeError::new_err(e.to_string())
}

// ---------------------------------------------------------------------------
// CupNode -> Python dict conversion
// ---------------------------------------------------------------------------

/// Convert a [`CupNode`] tree into a nested Python dict. Iterative
/// (stack-based), carried over from the teacher's `snapshot_to_py_dict`
/// to avoid recursion overflow on deep trees even though capture already
/// caps depth.
fn cup_node_to_py_dict(py: Python<'_>, root: &CupNode) -> PyResult<PyObject> {
    let root_list = PyList::empty(py);
    let mut stack: Vec<(&CupNode, PyObject)> = vec![(root, root_list.clone().into())];

    while let Some((node, parent_list)) = stack.pop() {
        let dict = PyDict::new(py);

        dict.set_item("id", &node.id)?;
        dict.set_item("role", node.role.as_str())?;
        dict.set_item("name", &node.name)?;
        if let Some(b) = node.bounds {
            dict.set_item("bounds", (b.x, b.y, b.w, b.h))?;
        }
        let states: Vec<&str> = node.states.iter().map(|s| s.as_str()).collect();
        dict.set_item("states", states)?;
        let actions: Vec<&str> = node.actions.iter().map(|a| a.as_str()).collect();
        dict.set_item("actions", actions)?;
        if let Some(ref v) = node.value {
            dict.set_item("value", v)?;
        }
        if let Some(ref d) = node.description {
            dict.set_item("description", d)?;
        }

        let children_list = PyList::empty(py);
        dict.set_item("children", &children_list)?;

        parent_list.call_method1(py, "append", (dict.as_any(),))?;

        for child in node.children.iter().rev() {
            stack.push((child, children_list.clone().into()));
        }
    }

    root_list.get_item(0).map(|item| item.into())
}

fn action_result_to_py_dict(py: Python<'_>, result: &ActionResult) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("success", result.success)?;
    dict.set_item("message", &result.message)?;
    dict.set_item("error", result.error.as_deref())?;
    Ok(dict.into())
}

fn parse_role(role: Option<&str>) -> PyResult<Option<Role>> {
    role.map(|r| {
        serde_json::from_value::<Role>(serde_json::Value::String(r.to_string()))
            .map_err(|_| PyRuntimeError::new_err(format!("unknown role '{r}'")))
    })
    .transpose()
}

fn parse_state(state: Option<&str>) -> PyResult<Option<State>> {
    state
        .map(|s| {
            serde_json::from_value::<State>(serde_json::Value::String(s.to_string()))
                .map_err(|_| PyRuntimeError::new_err(format!("unknown state '{s}'")))
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// CUP tools
// ---------------------------------------------------------------------------

/// Capture a CUP tree and return it as compact text, matching
/// `get_accessibility_tree`'s agent-facing surface.
#[pyfunction]
#[pyo3(signature = (scope="foreground", app=None, max_depth=0, detail="standard"))]
fn capture_tree(py: Python<'_>, scope: &str, app: Option<&str>, max_depth: usize, detail: &str) -> PyResult<String> {
    let scope = Scope::parse(scope).ok_or_else(|| PyRuntimeError::new_err(format!("unknown scope '{scope}'")))?;
    let detail = match detail {
        "minimal" => Detail::Minimal,
        "full" => Detail::Full,
        _ => Detail::Standard,
    };
    let depth = if max_depth > 0 { max_depth } else { 999 };
    let app = app.map(str::to_string);

    py.allow_threads(move || {
        session()
            .lock()
            .unwrap()
            .capture_compact(scope, app.as_deref(), depth, detail)
            .map_err(to_py_err)
    })
}

/// Execute an action on an element by id.
#[pyfunction]
#[pyo3(signature = (element_id, action, value=None, direction=None))]
fn execute_action(
    py: Python<'_>,
    element_id: &str,
    action: &str,
    value: Option<&str>,
    direction: Option<&str>,
) -> PyResult<PyObject> {
    let params = ActionParams { value: value.map(str::to_string), direction: direction.map(str::to_string) };
    let element_id = element_id.to_string();
    let action = action.to_string();

    let result = py.allow_threads(move || session().lock().unwrap().execute(&element_id, &action, params));
    action_result_to_py_dict(py, &result)
}

/// Send a key combo to the focused window.
#[pyfunction]
fn press_keys(py: Python<'_>, keys: &str) -> PyResult<PyObject> {
    let keys = keys.to_string();
    let result = py.allow_threads(move || session().lock().unwrap().press_keys(&keys));
    action_result_to_py_dict(py, &result)
}

/// Search the most recently captured tree by role/name/state.
#[pyfunction]
#[pyo3(signature = (role=None, name=None, state=None))]
fn find_element(py: Python<'_>, role: Option<&str>, name: Option<&str>, state: Option<&str>) -> PyResult<PyObject> {
    let role = parse_role(role)?;
    let state = parse_state(state)?;
    let name_owned = name.map(str::to_string);

    let matches = py.allow_threads(move || {
        session()
            .lock()
            .unwrap()
            .find_elements(role, name_owned.as_deref(), state)
            .map_err(to_py_err)
    })?;

    let result = PyList::empty(py);
    for node in &matches {
        result.append(cup_node_to_py_dict(py, node)?)?;
    }
    Ok(result.into())
}

/// Execute a sequence of actions, stopping on first failure. Each entry
/// in `actions` is a dict with the same shape as `execute_action`'s
/// arguments, or `{"action": "press_keys", "keys": ...}`.
#[pyfunction]
fn batch_actions(py: Python<'_>, actions: Vec<std::collections::HashMap<String, String>>) -> PyResult<PyObject> {
    let specs: Vec<ActionSpec> = actions
        .into_iter()
        .map(|a| ActionSpec {
            element_id: a.get("element_id").cloned(),
            action: a.get("action").cloned().unwrap_or_default(),
            value: a.get("value").cloned(),
            direction: a.get("direction").cloned(),
            keys: a.get("keys").cloned(),
        })
        .collect();

    let results = py.allow_threads(move || session().lock().unwrap().batch_execute(&specs));

    let out = PyList::empty(py);
    for result in &results {
        out.append(action_result_to_py_dict(py, result)?)?;
    }
    Ok(out.into())
}

/// Capture a screenshot as PNG bytes, optionally cropped to a region.
#[pyfunction]
#[pyo3(signature = (region_x=None, region_y=None, region_w=None, region_h=None))]
fn screenshot(
    py: Python<'_>,
    region_x: Option<i32>,
    region_y: Option<i32>,
    region_w: Option<i32>,
    region_h: Option<i32>,
) -> PyResult<Vec<u8>> {
    let region = match (region_x, region_y, region_w, region_h) {
        (Some(x), Some(y), Some(w), Some(h)) => Some(Bounds { x, y, w, h }),
        (None, None, None, None) => None,
        _ => {
            return Err(PyRuntimeError::new_err(
                "all region parameters (region_x, region_y, region_w, region_h) must be provided together, or none at all",
            ))
        }
    };

    py.allow_threads(move || session().lock().unwrap().screenshot(region).map_err(to_py_err))
}

// ---------------------------------------------------------------------------
// Lower-level surface carried over from wmcp-pyo3
// ---------------------------------------------------------------------------

/// Collect system information and return it as a Python dict.
#[pyfunction]
fn system_info(py: Python<'_>) -> PyResult<PyObject> {
    let snapshot = py
        .allow_threads(cup_core::system_info::collect_system_info)
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

    let dict = PyDict::new(py);
    dict.set_item("os_name", &snapshot.os_name)?;
    dict.set_item("os_version", &snapshot.os_version)?;
    dict.set_item("hostname", &snapshot.hostname)?;
    dict.set_item("cpu_count", snapshot.cpu_count)?;

    let cpu_list = PyList::new(py, snapshot.cpu_usage.iter().map(|&u| u as f64))?;
    dict.set_item("cpu_usage_percent", cpu_list)?;

    dict.set_item("total_memory_bytes", snapshot.total_memory_bytes)?;
    dict.set_item("used_memory_bytes", snapshot.used_memory_bytes)?;

    let disk_list = PyList::empty(py);
    for disk in &snapshot.disks {
        let d = PyDict::new(py);
        d.set_item("name", &disk.name)?;
        d.set_item("mount_point", &disk.mount_point)?;
        d.set_item("total_bytes", disk.total_bytes)?;
        d.set_item("available_bytes", disk.available_bytes)?;
        disk_list.append(d)?;
    }
    dict.set_item("disks", disk_list)?;

    Ok(dict.into())
}

/// Type Unicode text via SendInput.
#[pyfunction]
fn send_text(py: Python<'_>, text: &str) -> PyResult<u32> {
    let text_owned = text.to_owned();
    Ok(py.allow_threads(move || cup_core::input::send_text_raw(&text_owned)))
}

/// Click the mouse at absolute screen coordinates.
#[pyfunction]
#[pyo3(signature = (x, y, button="left"))]
fn send_click(py: Python<'_>, x: i32, y: i32, button: &str) -> PyResult<u32> {
    let button_owned = button.to_lowercase();
    Ok(py.allow_threads(move || cup_core::input::send_click_raw(x, y, &button_owned)))
}

/// Move the mouse cursor to absolute screen coordinates.
#[pyfunction]
fn send_mouse_move(py: Python<'_>, x: i32, y: i32) -> PyResult<u32> {
    Ok(py.allow_threads(move || cup_core::input::send_mouse_move_raw(x, y)))
}

// ---------------------------------------------------------------------------
// Module registration
// ---------------------------------------------------------------------------

/// Register the `cup_core_py` Python module.
#[pymodule]
fn cup_core_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(capture_tree, m)?)?;
    m.add_function(wrap_pyfunction!(execute_action, m)?)?;
    m.add_function(wrap_pyfunction!(press_keys, m)?)?;
    m.add_function(wrap_pyfunction!(find_element, m)?)?;
    m.add_function(wrap_pyfunction!(batch_actions, m)?)?;
    m.add_function(wrap_pyfunction!(screenshot, m)?)?;

    m.add_function(wrap_pyfunction!(system_info, m)?)?;
    m.add_function(wrap_pyfunction!(send_text, m)?)?;
    m.add_function(wrap_pyfunction!(send_click, m)?)?;
    m.add_function(wrap_pyfunction!(send_mouse_move, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Native Rust acceleration layer for CUP.")?;

    Ok(())
}
