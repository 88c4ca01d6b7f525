//! `cup_core` -- Pure Rust core library for the Computer Use Protocol (CUP).
//!
//! This crate contains all business logic with **no PyO3 dependency**.
//! It can be consumed by:
//! - `cup-pyo3` (PyO3 Python extension)
//! - `cup-ffi` (C ABI DLL for ctypes / other languages)
//! - `cup-cli` (standalone CLI tools)
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | `CupError` taxonomy spoken by the Session and every external surface |
//! | [`errors`] | `WindowsMcpError`, the low-level COM/DXGI/system plumbing error type |
//! | [`com`] | `COMGuard` RAII wrapper for COM apartment init |
//! | [`system_info`] | System telemetry via `sysinfo` crate |
//! | [`input`] | `SendInput` keyboard/mouse simulation |
//! | [`window`] | Win32 window enumeration |
//! | [`screenshot`] | DXGI/GDI screen capture |
//! | [`pattern`] | UIA pattern invocation on already-resolved elements |
//! | [`cup`] | The CUP data model, capture pipeline, pruner, serializers, and action dispatch |

pub mod com;
pub mod cup;
pub mod error;
pub mod errors;
pub mod input;
pub mod pattern;
pub mod screenshot;
pub mod system_info;
pub mod window;
