//! CUP-facing error taxonomy.
//!
//! [`WindowsMcpError`](crate::errors::WindowsMcpError) covers low-level
//! COM/DXGI/system plumbing; [`CupError`] is the taxonomy the Session,
//! Action Executor, and every external surface (CLI, worker, FFI, PyO3)
//! actually speak. Each variant carries a stable lowercase wire tag via
//! [`CupError::tag`], independent of its `Display` message, so renaming a
//! message never breaks a wire consumer pinned to the tag.

use thiserror::Error;

use crate::errors::WindowsMcpError;

#[derive(Debug, Error)]
pub enum CupError {
    #[error("platform adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("no window matched filter {0:?}")]
    WindowNotFound(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("unknown element id {0}")]
    UnknownElement(String),

    #[error("element {0} is stale")]
    StaleElement(String),

    #[error("unknown action {0}")]
    UnknownAction(String),

    #[error("action {action} not supported on element {id}")]
    ActionNotSupported { id: String, action: String },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("not yet implemented: {0}")]
    Unimplemented(String),

    #[error(transparent)]
    Windows(#[from] WindowsMcpError),
}

impl CupError {
    /// Stable lowercase tag for the wire (RPC/FFI/PyO3 boundaries).
    pub fn tag(&self) -> &'static str {
        match self {
            CupError::AdapterUnavailable(_) => "adapterunavailable",
            CupError::WindowNotFound(_) => "windownotfound",
            CupError::CaptureFailed(_) => "capturefailed",
            CupError::UnknownElement(_) => "unknownelement",
            CupError::StaleElement(_) => "staleelement",
            CupError::UnknownAction(_) => "unknownaction",
            CupError::ActionNotSupported { .. } => "actionnotsupported",
            CupError::InvalidParams(_) => "invalidparams",
            CupError::Unimplemented(_) => "unimplemented",
            CupError::Windows(_) => "platformerror",
        }
    }
}
