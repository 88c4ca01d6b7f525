//! Ephemeral `id -> native handle` reference registry.
//!
//! Every [`Session::capture`](crate::cup::session::Session::capture) call
//! replaces the registry wholesale: IDs assigned in the previous capture
//! are never valid after a new one. Action dispatch resolves an `eN` id
//! back to a live `IUIAutomationElement` through this table; a miss
//! surfaces as [`CupError::UnknownElement`](crate::error::CupError::UnknownElement).
//!
//! # COM apartment model
//!
//! Windows initialises one MTA apartment per process (via [`COMGuard`](crate::com::COMGuard)
//! on each thread that touches COM). Within an MTA, interface pointers may
//! be shared across threads without marshaling as long as no two threads
//! call the same pointer concurrently -- which holds here, since capture
//! workers only ever insert their own disjoint elements and the registry
//! itself serialises access behind its lock.

use std::collections::HashMap;

use parking_lot::Mutex;
use windows::Win32::UI::Accessibility::IUIAutomationElement;

/// Thread-safe `id -> element` map, fully replaced on each capture.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<HashMap<String, IUIAutomationElement>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under `id`, overwriting any prior entry.
    pub fn insert(&self, id: String, element: IUIAutomationElement) {
        self.inner.lock().insert(id, element);
    }

    /// Resolve `id` to a live element handle. `None` means the id was
    /// never registered, or belongs to a capture that has since been
    /// replaced.
    pub fn get(&self, id: &str) -> Option<IUIAutomationElement> {
        self.inner.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Discard every entry from the previous capture. Called at the start
    /// of each new `Session::capture`, never mid-capture.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

// SAFETY: `IUIAutomationElement` pointers are only ever touched from
// within an MTA COM apartment in this crate (each capture/dispatch path
// initialises `COMGuard` before making any COM call), and access to the
// map itself is serialised behind `Mutex`. No two threads ever invoke a
// method on the same element concurrently.
unsafe impl Send for Registry {}
unsafe impl Sync for Registry {}
