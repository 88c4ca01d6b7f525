//! C ABI DLL for CUP -- loadable by ctypes, C#, or any FFI consumer.
//!
//! All exported functions follow the convention:
//! - Return `i32` status code: `CUP_OK=0`, `CUP_ERROR=-1`
//! - String outputs allocated by Rust, freed via `cup_free_string()`
//! - Last error retrievable via `cup_last_error()`
//!
//! Built on the Session/CUP API; `thread_local! LAST_ERROR` and the
//! ownership-transfer conventions follow the same pattern as the
//! lower-level input/system-info exports below. `SESSION` is also
//! thread-local: one `Session` (and its Reference Registry) per calling
//! thread, matching the single-threaded-per-call-site usage a ctypes/C#
//! consumer has in practice.

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

use cup_core::cup::executor::ActionParams;
use cup_core::cup::node::{Bounds, Role, State};
use cup_core::cup::pruner::Detail;
use cup_core::cup::session::{Scope, Session};

pub const CUP_OK: i32 = 0;
pub const CUP_ERROR: i32 = -1;

/// Maximum text length for `cup_send_text`.
const MAX_TEXT_LENGTH: usize = 10_000;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static SESSION: RefCell<Session> = RefCell::new(Session::new());
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn json_out(json: String, out_json: *mut *mut c_char) -> i32 {
    let sanitized = json.replace('\0', "\\u0000");
    match CString::new(sanitized) {
        Ok(cstr) => {
            unsafe { *out_json = cstr.into_raw() };
            CUP_OK
        }
        Err(e) => {
            set_last_error(&format!("CString conversion failed: {e}"));
            CUP_ERROR
        }
    }
}

/// Retrieve the last error message (thread-local).
///
/// Returns a **heap-allocated** copy of the error string. The caller owns
/// the returned pointer and **must** free it with `cup_free_string()`.
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn cup_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .and_then(|s| CString::new(s.as_bytes()).ok())
            .map(|copy| copy.into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Free a string previously allocated by a `cup_*` function.
///
/// # Safety
///
/// `ptr` must be a pointer returned by a `cup_*` function or null.
#[no_mangle]
pub unsafe extern "C" fn cup_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

/// Free a byte buffer allocated by `cup_screenshot_png`.
///
/// # Safety
///
/// `ptr` must be a buffer returned by `cup_screenshot_png` or null.
/// `len` must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn cup_free_buffer(ptr: *mut u8, len: usize) {
    if !ptr.is_null() && len > 0 {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

fn read_str(ptr: *const c_char, field: &str) -> Result<String, String> {
    if ptr.is_null() {
        return Err(format!("{field} is null"));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_string)
        .map_err(|e| format!("{field} is not valid UTF-8: {e}"))
}

/// Capture a CUP tree as compact text. `scope` is one of
/// `overview`/`foreground`/`desktop`/`full`; `app` may be null.
///
/// # Safety
///
/// `scope` must be a valid null-terminated C string. `app` may be null or
/// a valid null-terminated C string. `out_text` must be a valid pointer;
/// caller must free the result with `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_capture_tree(
    scope: *const c_char,
    app: *const c_char,
    max_depth: usize,
    out_text: *mut *mut c_char,
) -> i32 {
    if out_text.is_null() {
        set_last_error("out_text is null");
        return CUP_ERROR;
    }

    let scope_str = match read_str(scope, "scope") {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e);
            return CUP_ERROR;
        }
    };
    let Some(scope) = Scope::parse(&scope_str) else {
        set_last_error(&format!("unknown scope '{scope_str}'"));
        return CUP_ERROR;
    };
    let app_filter = if app.is_null() { None } else { read_str(app, "app").ok() };

    let result = SESSION.with(|s| {
        s.borrow_mut()
            .capture_compact(scope, app_filter.as_deref(), max_depth, Detail::Standard)
    });

    match result {
        Ok(text) => json_out(text, out_text),
        Err(e) => {
            set_last_error(&e.to_string());
            CUP_ERROR
        }
    }
}

/// Execute an action on element `id`. `value`/`direction` may be null.
///
/// # Safety
///
/// `id`, `action` must be valid null-terminated C strings. `value`,
/// `direction` may be null or valid null-terminated C strings.
/// `out_json` must be a valid pointer; caller must free with
/// `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_execute(
    id: *const c_char,
    action: *const c_char,
    value: *const c_char,
    direction: *const c_char,
    out_json: *mut *mut c_char,
) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return CUP_ERROR;
    }
    let id = match read_str(id, "id") {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e);
            return CUP_ERROR;
        }
    };
    let action = match read_str(action, "action") {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e);
            return CUP_ERROR;
        }
    };
    let params = ActionParams {
        value: if value.is_null() { None } else { read_str(value, "value").ok() },
        direction: if direction.is_null() { None } else { read_str(direction, "direction").ok() },
    };

    let result = SESSION.with(|s| s.borrow_mut().execute(&id, &action, params));
    match serde_json::to_string(&result) {
        Ok(json) => json_out(json, out_json),
        Err(e) => {
            set_last_error(&format!("JSON serialization failed: {e}"));
            CUP_ERROR
        }
    }
}

/// Press a key combo, e.g. "ctrl+shift+p".
///
/// # Safety
///
/// `combo` must be a valid null-terminated C string. `out_json` must be a
/// valid pointer; caller must free with `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_press_keys(combo: *const c_char, out_json: *mut *mut c_char) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return CUP_ERROR;
    }
    let combo = match read_str(combo, "combo") {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e);
            return CUP_ERROR;
        }
    };
    let result = SESSION.with(|s| s.borrow_mut().press_keys(&combo));
    match serde_json::to_string(&result) {
        Ok(json) => json_out(json, out_json),
        Err(e) => {
            set_last_error(&format!("JSON serialization failed: {e}"));
            CUP_ERROR
        }
    }
}

/// Search the most recently captured tree. `role`, `name`, `state` may
/// each be null to skip that criterion.
///
/// # Safety
///
/// `role`, `name`, `state` may be null or valid null-terminated C
/// strings. `out_json` must be a valid pointer; caller must free with
/// `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_find_elements(
    role: *const c_char,
    name: *const c_char,
    state: *const c_char,
    out_json: *mut *mut c_char,
) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return CUP_ERROR;
    }

    let role_str = if role.is_null() { None } else { read_str(role, "role").ok() };
    let name_str = if name.is_null() { None } else { read_str(name, "name").ok() };
    let state_str = if state.is_null() { None } else { read_str(state, "state").ok() };

    let role: Option<Role> = match role_str {
        Some(r) => match serde_json::from_value(serde_json::Value::String(r.clone())) {
            Ok(r) => Some(r),
            Err(_) => {
                set_last_error(&format!("unknown role '{r}'"));
                return CUP_ERROR;
            }
        },
        None => None,
    };
    let state: Option<State> = match state_str {
        Some(s) => match serde_json::from_value(serde_json::Value::String(s.clone())) {
            Ok(s) => Some(s),
            Err(_) => {
                set_last_error(&format!("unknown state '{s}'"));
                return CUP_ERROR;
            }
        },
        None => None,
    };

    let result = SESSION.with(|s| s.borrow_mut().find_elements(role, name_str.as_deref(), state));
    match result {
        Ok(matches) => match serde_json::to_string(&matches) {
            Ok(json) => json_out(json, out_json),
            Err(e) => {
                set_last_error(&format!("JSON serialization failed: {e}"));
                CUP_ERROR
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            CUP_ERROR
        }
    }
}

/// Capture a screenshot as PNG bytes, optionally cropped. Pass all four
/// region fields as `-1` to skip cropping.
///
/// # Safety
///
/// `out_buf` must be a valid pointer to a `*mut u8`. `out_len` must be a
/// valid pointer to a `usize`. Caller must free the buffer with
/// `cup_free_buffer()`.
#[no_mangle]
pub unsafe extern "C" fn cup_screenshot_png(
    region_x: i32,
    region_y: i32,
    region_w: i32,
    region_h: i32,
    out_buf: *mut *mut u8,
    out_len: *mut usize,
) -> i32 {
    if out_buf.is_null() || out_len.is_null() {
        set_last_error("null pointer argument");
        return CUP_ERROR;
    }

    let region = if region_x >= 0 && region_y >= 0 && region_w >= 0 && region_h >= 0 {
        Some(Bounds { x: region_x, y: region_y, w: region_w, h: region_h })
    } else {
        None
    };

    let result = SESSION.with(|s| s.borrow_mut().screenshot(region));
    match result {
        Ok(png_bytes) => {
            let len = png_bytes.len();
            let boxed = png_bytes.into_boxed_slice();
            let ptr = Box::into_raw(boxed) as *mut u8;
            unsafe {
                *out_buf = ptr;
                *out_len = len;
            }
            CUP_OK
        }
        Err(e) => {
            set_last_error(&e.to_string());
            CUP_ERROR
        }
    }
}

// ---------------------------------------------------------------------------
// Lower-level surface: system info and raw input, neither governed by the
// CUP data model but still useful to a native consumer that doesn't want
// to round-trip through the Session.
// ---------------------------------------------------------------------------

/// Collect system information as a JSON string.
///
/// # Safety
///
/// `out_json` must be a valid pointer to a `*mut c_char`. Caller must
/// free with `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_system_info(out_json: *mut *mut c_char) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return CUP_ERROR;
    }
    match cup_core::system_info::collect_system_info() {
        Ok(snapshot) => match serde_json::to_string(&snapshot) {
            Ok(json) => json_out(json, out_json),
            Err(e) => {
                set_last_error(&format!("JSON serialization failed: {e}"));
                CUP_ERROR
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            CUP_ERROR
        }
    }
}

/// Send Unicode text via SendInput.
///
/// # Safety
///
/// `text` must be a valid null-terminated UTF-8 C string. `out_count` is
/// optional (may be null).
#[no_mangle]
pub unsafe extern "C" fn cup_send_text(text: *const c_char, out_count: *mut u32) -> i32 {
    let text_str = match read_str(text, "text") {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e);
            return CUP_ERROR;
        }
    };
    if text_str.len() > MAX_TEXT_LENGTH {
        set_last_error(&format!("text length {} exceeds maximum {MAX_TEXT_LENGTH}", text_str.len()));
        return CUP_ERROR;
    }
    let count = cup_core::input::send_text_raw(&text_str);
    if !out_count.is_null() {
        unsafe { *out_count = count };
    }
    CUP_OK
}

/// Click the mouse at absolute screen coordinates. `button`: 0=left,
/// 1=right, 2=middle.
#[no_mangle]
pub extern "C" fn cup_send_click(x: i32, y: i32, button: i32) -> i32 {
    let button_str = match button {
        1 => "right",
        2 => "middle",
        _ => "left",
    };
    let count = cup_core::input::send_click_raw(x, y, button_str);
    if count == 0 {
        set_last_error("SendInput returned 0 events for click");
        CUP_ERROR
    } else {
        CUP_OK
    }
}

/// Move the mouse cursor to absolute screen coordinates.
#[no_mangle]
pub extern "C" fn cup_send_mouse_move(x: i32, y: i32) -> i32 {
    cup_core::input::send_mouse_move_raw(x, y);
    CUP_OK
}

/// Enumerate visible windows as a JSON array of handle integers.
///
/// # Safety
///
/// `out_json` must be a valid pointer. Caller must free with
/// `cup_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn cup_enumerate_windows(out_json: *mut *mut c_char) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return CUP_ERROR;
    }
    match cup_core::window::enumerate_visible_windows() {
        Ok(handles) => match serde_json::to_string(&handles) {
            Ok(json) => json_out(json, out_json),
            Err(e) => {
                set_last_error(&format!("JSON serialization failed: {e}"));
                CUP_ERROR
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            CUP_ERROR
        }
    }
}

/// Send a key combination by virtual-key codes (e.g. Ctrl+C = [0x11, 0x43]).
///
/// # Safety
///
/// `vk_codes` must point to `count` contiguous `u16` values.
#[no_mangle]
pub unsafe extern "C" fn cup_send_hotkey(vk_codes: *const u16, count: usize) -> i32 {
    if vk_codes.is_null() || count == 0 {
        set_last_error("null or empty vk_codes");
        return CUP_ERROR;
    }
    if count > 8 {
        set_last_error("hotkey count exceeds maximum 8");
        return CUP_ERROR;
    }
    let codes = unsafe { std::slice::from_raw_parts(vk_codes, count) };
    cup_core::input::send_hotkey_raw(codes);
    CUP_OK
}
