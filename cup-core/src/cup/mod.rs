//! The Computer Use Protocol (CUP) data model, capture pipeline, and
//! action dispatch -- platform-neutral types plus the Windows UIA
//! implementation of the [`PlatformAdapter`](adapter::PlatformAdapter)
//! contract.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`node`] | `CupNode`, `Envelope`, canonical role/state/action enums |
//! | [`roles`] | UIA control-type → canonical role table, text-input/value role sets |
//! | [`builder`] | Maps a cached UIA element into a `CupNode` |
//! | [`capture`] | The three tree traversal modes (cached/flat/legacy) |
//! | [`pruner`] | Skip/hoist rules, `standard`/`minimal`/`full` detail levels |
//! | [`serialize`] | Envelope assembly, compact text, overview text |
//! | [`registry`] | Ephemeral `id -> native handle` reference registry |
//! | [`keys`] | `ctrl+shift+p`-style combo parser |
//! | [`executor`] | Action validation + platform dispatch |
//! | [`adapter`] | `PlatformAdapter` trait + Windows/stub implementations |
//! | [`session`] | Orchestrates capture -> registry -> action; the stable API |

pub mod adapter;
pub mod builder;
pub mod capture;
pub mod executor;
pub mod keys;
pub mod node;
pub mod pruner;
pub mod registry;
pub mod roles;
pub mod serialize;
pub mod session;

pub use node::*;
