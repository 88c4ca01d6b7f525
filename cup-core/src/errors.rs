//! Low-level error types for `cup_core`'s Windows plumbing.
//!
//! COM/DXGI/system failures are funnelled through [`WindowsMcpError`],
//! which uses `thiserror` for `Display` and `Error` derives. The
//! CUP-facing taxonomy the Session and external surfaces actually speak
//! lives in [`crate::error::CupError`], which wraps this type via `#[from]`.

use thiserror::Error;
use windows::core::Error as WindowsError;

/// Low-level error type for `cup_core`'s Windows-specific plumbing.
///
/// Each variant corresponds to a distinct subsystem.
#[derive(Debug, Error)]
pub enum WindowsMcpError {
    /// Failure while collecting system information via the `sysinfo` crate.
    #[error("SystemInfoError: {0}")]
    SystemInfoError(String),

    /// COM / UIAutomation error.
    #[error("ComError: {0}")]
    ComError(String),

    /// Accessibility tree traversal or element lookup failure.
    #[error("TreeError: {0}")]
    TreeError(String),

    /// Input simulation failure (SendInput / keyboard / mouse).
    #[error("InputError: {0}")]
    InputError(String),

    /// Screenshot capture failure (GDI / DXGI).
    #[error("ScreenshotError: {0}")]
    ScreenshotError(String),
}

/// Convert a `windows::core::Error` (COM / Win32 HRESULT failure) into a
/// `WindowsMcpError::ComError`.
impl From<WindowsError> for WindowsMcpError {
    fn from(err: WindowsError) -> Self {
        WindowsMcpError::ComError(format!("Windows COM error: {err}"))
    }
}
