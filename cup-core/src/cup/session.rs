//! The Session: orchestrates capture -> registry -> action and is the one
//! stable entry point every external surface (CLI, worker, FFI, PyO3) goes
//! through.
//!
//! Grounded in `original_source/cup/mcp/server.py`'s module-level
//! `_get_session()`/`cup.Session()` usage and `cup/__init__.py`'s
//! `_capture`/`get_tree`/`get_foreground_tree` convenience functions: one
//! adapter, lazily initialized on first use (§9 "global mutable state" --
//! no process-wide singleton, the adapter lives on the `Session` instance
//! instead), and one most-recently-captured pruned tree that
//! `find_elements` searches without re-capturing.

use crate::cup::adapter::{self, PlatformAdapter};
use crate::cup::executor::{ActionParams, ActionResult};
use crate::cup::keys;
use crate::cup::node::{AppInfo, Bounds, CupNode, Envelope, Role, State, WindowDescriptor};
use crate::cup::pruner::{self, Detail};
use crate::cup::serialize;
use crate::error::CupError;

/// Capture breadth, per §6/GLOSSARY: `overview` (no tree), `foreground`
/// (one window), `desktop` (desktop surface only), `full` (all windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Overview,
    Foreground,
    Desktop,
    Full,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Overview => "overview",
            Scope::Foreground => "foreground",
            Scope::Desktop => "desktop",
            Scope::Full => "full",
        }
    }

    pub fn parse(s: &str) -> Option<Scope> {
        match s {
            "overview" => Some(Scope::Overview),
            "foreground" => Some(Scope::Foreground),
            "desktop" => Some(Scope::Desktop),
            "full" => Some(Scope::Full),
            _ => None,
        }
    }
}

/// One step of a `batch_execute` call: either an element action
/// (`element_id` + `action` (+`value`/`direction`)) or a standalone
/// `press_keys` step (`action: "press_keys"`, `keys: "ctrl+s"`), matching
/// `original_source/cup/mcp/server.py::batch_actions`'s two action
/// shapes verbatim.
#[derive(Debug, Clone, Default)]
pub struct ActionSpec {
    pub element_id: Option<String>,
    pub action: String,
    pub value: Option<String>,
    pub direction: Option<String>,
    pub keys: Option<String>,
}

/// The result of one `capture` call: the envelope plus the sibling window
/// list used for the `foreground` scope's situational-awareness header.
pub struct CaptureOutcome {
    pub envelope: Envelope,
    pub window_list: Vec<WindowDescriptor>,
}

/// Orchestrates capture -> registry update -> action; the stable API
/// every external surface (CLI, worker, FFI, PyO3) is built on.
pub struct Session {
    adapter: Box<dyn PlatformAdapter>,
    initialized: bool,
    last_pruned_tree: Vec<CupNode>,
}

impl Session {
    /// Construct a session for the host platform's adapter (or `--platform`
    /// override, via [`Session::with_adapter`]). The adapter is not
    /// initialized yet -- that happens lazily on first use.
    pub fn new() -> Self {
        Self::with_adapter(adapter::detect_platform())
    }

    pub fn with_adapter(adapter: Box<dyn PlatformAdapter>) -> Self {
        Self { adapter, initialized: false, last_pruned_tree: Vec::new() }
    }

    fn ensure_initialized(&mut self) -> Result<(), CupError> {
        if !self.initialized {
            self.adapter.initialize()?;
            self.initialized = true;
        }
        Ok(())
    }

    pub fn platform_name(&self) -> &'static str {
        self.adapter.platform_name()
    }

    /// Resolve `scope`/`app` to the window set `capture_tree` should walk,
    /// plus the full window list used for the foreground-scope header.
    /// `app` only narrows `full`/`foreground`
    /// (`original_source/cup/mcp/server.py` only forwards `app` when
    /// `scope == "full"`; this port additionally honors it for
    /// `foreground` since spec.md's signature takes `app?` unconditionally
    /// and a title filter on a single foreground candidate is a strict
    /// generalization, not a behavior change).
    fn resolve_windows(
        &mut self,
        scope: Scope,
        app: Option<&str>,
    ) -> Result<(Vec<WindowDescriptor>, Vec<WindowDescriptor>), CupError> {
        self.ensure_initialized()?;
        let all = self.adapter.get_all_windows()?;

        match scope {
            Scope::Overview => Ok((Vec::new(), all)),
            Scope::Foreground => {
                let fg = if let Some(filter) = app {
                    let needle = filter.to_lowercase();
                    all.iter()
                        .find(|w| w.title.to_lowercase().contains(&needle))
                        .cloned()
                        .ok_or_else(|| CupError::WindowNotFound(filter.to_string()))?
                } else {
                    self.adapter.get_foreground_window()?
                };
                Ok((vec![fg], all))
            }
            Scope::Desktop => {
                // The desktop surface (icons/widgets) is not one of the
                // app windows `get_all_windows` enumerates, and
                // `PlatformAdapter` has no method for it -- the upstream
                // ABC doesn't define one either. Resolved here, at the
                // Session layer, via the standard Win32 shell window
                // rather than growing the adapter trait for one scope on
                // one platform. Non-Windows adapters have no such
                // concept and report `AdapterUnavailable`.
                if self.adapter.platform_name() != "windows" {
                    return Err(CupError::AdapterUnavailable(
                        self.adapter.platform_name().to_string(),
                    ));
                }
                let handle = crate::window::get_desktop_hwnd();
                if handle == 0 {
                    return Err(CupError::WindowNotFound("desktop shell window".into()));
                }
                let desktop = WindowDescriptor {
                    handle,
                    title: "Desktop".to_string(),
                    pid: None,
                    bundle_id: None,
                    bounds: None,
                    foreground: false,
                    url: None,
                };
                Ok((vec![desktop], all))
            }
            Scope::Full => {
                let filtered = match app {
                    Some(filter) => {
                        let needle = filter.to_lowercase();
                        all.iter()
                            .filter(|w| w.title.to_lowercase().contains(&needle))
                            .cloned()
                            .collect()
                    }
                    None => all.clone(),
                };
                if filtered.is_empty() {
                    if let Some(filter) = app {
                        return Err(CupError::WindowNotFound(filter.to_string()));
                    }
                }
                Ok((filtered, all))
            }
        }
    }

    /// Capture the requested scope as a CUP envelope. `max_depth` follows
    /// §4.2's sentinel convention: 0 or 999 both mean "unbounded in
    /// practice" and are clamped to `capture::MAX_TREE_DEPTH` at this
    /// boundary. The pruned-standard-detail tree is cached for
    /// `find_elements`.
    pub fn capture(
        &mut self,
        scope: Scope,
        app: Option<&str>,
        max_depth: usize,
        detail: Detail,
    ) -> Result<CaptureOutcome, CupError> {
        let effective_depth = if max_depth == 0 || max_depth >= 999 {
            crate::cup::capture::MAX_TREE_DEPTH
        } else {
            max_depth
        };

        let (capture_windows, window_list) = self.resolve_windows(scope, app)?;
        let screen = self.adapter.get_screen_info()?;

        let (tree, _stats) = if capture_windows.is_empty() {
            (Vec::new(), Default::default())
        } else {
            self.adapter.capture_tree(&capture_windows, effective_depth)?
        };

        self.last_pruned_tree = pruner::prune_tree(&tree, Detail::Standard);

        let app_info = if scope == Scope::Foreground {
            capture_windows.first().map(|w| AppInfo {
                name: Some(w.title.clone()),
                pid: w.pid,
                bundle_id: w.bundle_id.clone(),
            })
        } else {
            None
        };

        let envelope = serialize::build_envelope(
            tree,
            self.adapter.platform_name(),
            Some(scope.as_str().to_string()),
            screen,
            app_info,
            None,
        );

        let _ = detail; // detail is applied at serialization time, not capture time
        Ok(CaptureOutcome { envelope, window_list })
    }

    /// Capture and render directly to the text/JSON forms external
    /// surfaces actually want, saving callers from re-deriving the
    /// scope-specific header rules in §4.5.
    pub fn capture_compact(
        &mut self,
        scope: Scope,
        app: Option<&str>,
        max_depth: usize,
        detail: Detail,
    ) -> Result<String, CupError> {
        if scope == Scope::Overview {
            self.ensure_initialized()?;
            let windows = self.adapter.get_all_windows()?;
            let screen = self.adapter.get_screen_info()?;
            return Ok(serialize::serialize_overview(
                &windows,
                self.adapter.platform_name(),
                screen,
            ));
        }

        let outcome = self.capture(scope, app, max_depth, detail)?;
        let window_list = if scope == Scope::Foreground { Some(outcome.window_list.as_slice()) } else { None };
        Ok(serialize::serialize_compact(&outcome.envelope, window_list, detail))
    }

    /// Search the most recently captured *pruned* (standard-detail) tree.
    /// AND-semantics across whichever criteria are `Some`; results have
    /// `children` stripped. Auto-captures the foreground window first if
    /// nothing has been captured yet, per
    /// `original_source/cup/mcp/server.py::find_element`.
    pub fn find_elements(
        &mut self,
        role: Option<Role>,
        name: Option<&str>,
        state: Option<State>,
    ) -> Result<Vec<CupNode>, CupError> {
        if self.last_pruned_tree.is_empty() {
            self.capture(Scope::Foreground, None, 0, Detail::Standard)?;
        }

        let needle = name.map(|n| n.to_lowercase());
        let mut matches = Vec::new();
        fn walk(
            node: &CupNode,
            role: Option<Role>,
            needle: &Option<String>,
            state: Option<State>,
            out: &mut Vec<CupNode>,
        ) {
            let role_ok = role.map(|r| node.role == r).unwrap_or(true);
            let name_ok = needle
                .as_ref()
                .map(|n| node.name.to_lowercase().contains(n))
                .unwrap_or(true);
            let state_ok = state.map(|s| node.has_state(s)).unwrap_or(true);

            if role_ok && name_ok && state_ok {
                let mut stripped = node.clone();
                stripped.children = Vec::new();
                out.push(stripped);
            }
            for child in &node.children {
                walk(child, role, needle, state, out);
            }
        }

        for root in &self.last_pruned_tree {
            walk(root, role, &needle, state, &mut matches);
        }

        Ok(matches)
    }

    /// Look up `id` in the current Reference Registry, validate `action`,
    /// and dispatch. Never raises for an element-level failure --
    /// `ActionResult { success: false, .. }` is the error channel
    /// (§4.6/4.7: "the executor returns a result struct rather than
    /// raising").
    pub fn execute(&mut self, id: &str, action: &str, params: ActionParams) -> ActionResult {
        if let Err(e) = self.ensure_initialized() {
            return ActionResult::failed(e.to_string());
        }
        self.adapter.action_handler().execute(id, action, &params)
    }

    /// Parse and dispatch a key combo via the platform input path.
    pub fn press_keys(&mut self, combo: &str) -> ActionResult {
        if let Err(e) = self.ensure_initialized() {
            return ActionResult::failed(e.to_string());
        }
        self.adapter.action_handler().press_keys(combo)
    }

    /// Run `actions` in order, stopping at the first failure and
    /// returning the partial result list. No implicit re-capture between
    /// steps (§5: "by contract, the agent must re-capture if later steps
    /// depend on state the earlier actions changed").
    pub fn batch_execute(&mut self, actions: &[ActionSpec]) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for spec in actions {
            let result = if spec.action == "press_keys" {
                let combo = spec.keys.as_deref().unwrap_or_default();
                self.press_keys(combo)
            } else {
                let id = match spec.element_id.as_deref() {
                    Some(id) => id,
                    None => {
                        results.push(ActionResult::failed(
                            "action step missing 'element_id'".into(),
                        ));
                        break;
                    }
                };
                let params = ActionParams {
                    value: spec.value.clone(),
                    direction: spec.direction.clone(),
                };
                self.execute(id, &spec.action, params)
            };

            let stop = !result.success;
            results.push(result);
            if stop {
                break;
            }
        }
        results
    }

    /// Capture a screenshot as PNG bytes, optionally cropped to `region`.
    /// Implemented directly (not delegated externally): the Rust edition
    /// folds the teacher's existing DXGI/GDI pipeline back into the core
    /// rather than re-externalizing working code (see SPEC_FULL §1).
    pub fn screenshot(&mut self, region: Option<Bounds>) -> Result<Vec<u8>, CupError> {
        self.ensure_initialized()?;
        let frame = crate::screenshot::capture_raw(0).map_err(CupError::from)?;
        let frame = match region {
            Some(b) => crate::screenshot::crop(&frame, b.x as u32, b.y as u32, b.w as u32, b.h as u32)
                .map_err(CupError::from)?,
            None => frame,
        };
        crate::screenshot::encode_png(&frame).map_err(CupError::from)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cup::node::{Action, Bounds as NodeBounds};

    fn stub_button(id: &str, name: &str) -> CupNode {
        CupNode {
            id: id.to_string(),
            role: Role::Button,
            name: name.to_string(),
            bounds: Some(NodeBounds { x: 0, y: 0, w: 10, h: 10 }),
            states: vec![State::Focused],
            actions: vec![Action::Click],
            value: None,
            description: None,
            attributes: None,
            platform: None,
            children: vec![],
        }
    }

    #[test]
    fn scope_parse_round_trips() {
        for s in ["overview", "foreground", "desktop", "full"] {
            assert_eq!(Scope::parse(s).unwrap().as_str(), s);
        }
        assert!(Scope::parse("galaxy").is_none());
    }

    #[test]
    fn find_elements_against_a_preset_tree_applies_and_semantics() {
        let mut session = Session::new();
        session.last_pruned_tree = vec![stub_button("e1", "Submit Order")];

        let matches = session
            .find_elements(Some(Role::Button), Some("submit"), Some(State::Focused))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].children.is_empty());

        let no_match = session
            .find_elements(Some(Role::Checkbox), None, None)
            .unwrap();
        assert!(no_match.is_empty());
    }

    #[test]
    fn batch_execute_stops_on_first_failure() {
        let mut session = Session::new();
        let specs = vec![
            ActionSpec {
                element_id: Some("e999".into()),
                action: "click".into(),
                ..Default::default()
            },
            ActionSpec {
                element_id: Some("e1".into()),
                action: "click".into(),
                ..Default::default()
            },
        ];
        let results = session.batch_execute(&specs);
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
    }

    #[test]
    fn execute_on_unknown_element_never_touches_the_os() {
        let mut session = Session::new();
        let result = session.execute("e999", "click", ActionParams::default());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown element id e999"));
    }
}
