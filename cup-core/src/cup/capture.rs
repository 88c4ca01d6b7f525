//! CUP tree capture: three traversal modes over UI Automation, each
//! building `CupNode`s directly (via [`build_node`]) and registering their
//! native handles in a [`Registry`] as it goes.
//!
//! Grounded in the benchmark harness this crate's capture pipeline
//! descends from: `walk_cached_tree` is [`capture_subtree_cached`] (the
//! default -- one batched `GetCachedChildren` walk), `flat_snapshot` is
//! [`capture_subtree_flat`] (a single `FindAllBuildCache` over
//! `TreeScope_Subtree`, descendants only, no hierarchy), and `walk_tree`
//! is [`capture_subtree_legacy`] (`IUIAutomationTreeWalker` with a fresh
//! `BuildUpdatedCache` per node -- slower, but tolerates trees where a
//! subtree-wide cache request fails on a misbehaving automation peer).

use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_INPROC_SERVER};
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationCacheRequest, IUIAutomationElement,
    IUIAutomationTreeWalker, TreeScope_Descendants, TreeScope_Subtree, UIA_AriaPropertiesPropertyId,
    UIA_AutomationIdPropertyId, UIA_BoundingRectanglePropertyId, UIA_ClassNamePropertyId,
    UIA_ControlTypePropertyId, UIA_ExpandCollapseExpandCollapseStatePropertyId,
    UIA_HasKeyboardFocusPropertyId, UIA_HelpTextPropertyId, UIA_IsEnabledPropertyId,
    UIA_IsExpandCollapsePatternAvailablePropertyId, UIA_IsInvokePatternAvailablePropertyId,
    UIA_IsOffscreenPropertyId, UIA_IsRangeValuePatternAvailablePropertyId,
    UIA_IsScrollPatternAvailablePropertyId, UIA_IsSelectionItemPatternAvailablePropertyId,
    UIA_IsTogglePatternAvailablePropertyId, UIA_IsValuePatternAvailablePropertyId,
    UIA_NamePropertyId, UIA_OrientationPropertyId, UIA_RangeValueMaximumPropertyId,
    UIA_RangeValueMinimumPropertyId, UIA_SelectionItemIsSelectedPropertyId,
    UIA_ToggleToggleStatePropertyId, UIA_ValueIsReadOnlyPropertyId, UIA_ValueValuePropertyId,
};

use crate::com::COMGuard;
use crate::cup::builder::build_node;
use crate::cup::node::CupNode;
use crate::cup::registry::Registry;
use crate::errors::WindowsMcpError;

/// Hard ceiling on traversal recursion. A caller-supplied `max_depth` is
/// always clamped to this, keeping worst-case Rayon thread stack usage
/// bounded regardless of what a hostile or buggy caller requests.
pub const MAX_TREE_DEPTH: usize = 50;

/// Children read per node, capping memory use against pathological trees
/// (e.g. a grid with 100k cells).
const MAX_CHILDREN_PER_NODE: i32 = 512;

/// Which traversal strategy to use when walking a window's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// One batched `GetCachedChildren` descent. Fastest; the default.
    #[default]
    Cached,
    /// A single `FindAllBuildCache(TreeScope_Descendants)` call, returning
    /// every descendant as a flat list with no parent/child nesting.
    Flat,
    /// `IUIAutomationTreeWalker` with a fresh `BuildUpdatedCache` call per
    /// node. Slower, but isolates cache failures to individual nodes
    /// instead of failing the whole subtree.
    Legacy,
}

/// Monotonic preorder id generator: `e0`, `e1`, `e2`, ... Shared across
/// every window root in a snapshot (see `capture_tree`'s caller), since
/// §3 requires every id in a snapshot to be unique -- not just within one
/// window's subtree.
pub(crate) struct IdGen(usize);

impl IdGen {
    pub(crate) fn new() -> Self {
        IdGen(0)
    }

    fn next(&mut self) -> String {
        let id = format!("e{}", self.0);
        self.0 += 1;
        id
    }
}

fn the_21_properties() -> [windows::Win32::UI::Accessibility::UIA_PROPERTY_ID; 19] {
    [
        UIA_NamePropertyId,
        UIA_AutomationIdPropertyId,
        UIA_ControlTypePropertyId,
        UIA_ClassNamePropertyId,
        UIA_BoundingRectanglePropertyId,
        UIA_IsEnabledPropertyId,
        UIA_HasKeyboardFocusPropertyId,
        UIA_IsOffscreenPropertyId,
        UIA_HelpTextPropertyId,
        UIA_IsInvokePatternAvailablePropertyId,
        UIA_IsTogglePatternAvailablePropertyId,
        UIA_IsExpandCollapsePatternAvailablePropertyId,
        UIA_IsValuePatternAvailablePropertyId,
        UIA_IsSelectionItemPatternAvailablePropertyId,
        UIA_IsScrollPatternAvailablePropertyId,
        UIA_IsRangeValuePatternAvailablePropertyId,
        UIA_ToggleToggleStatePropertyId,
        UIA_ExpandCollapseExpandCollapseStatePropertyId,
        UIA_SelectionItemIsSelectedPropertyId,
    ]
}

/// Build the cache request shared by every traversal mode: the 19 cached
/// properties `build_node` reads (name/automationid/controltype/classname/
/// boundingrect/core-state-bools/helptext/7-pattern-availability/
/// 3-pattern-state), plus `ValueIsReadOnly`/`ValueValue` which are only
/// meaningful once `IsValuePatternAvailable` is known, and
/// `Orientation`/`RangeValueMinimum`/`RangeValueMaximum`/`AriaProperties`
/// which feed the optional `attributes` sidecar (heading level and
/// placeholder text ride in `AriaProperties` for browser/Electron content
/// the way Chromium's UIA bridge exposes them) -- all added
/// unconditionally since `AddProperty` is cheap and the builder guards
/// reading them on the relevant availability flag anyway.
unsafe fn build_cache_request(
    uia: &IUIAutomation,
    scope: windows::Win32::UI::Accessibility::TreeScope,
) -> Result<IUIAutomationCacheRequest, WindowsMcpError> {
    let req = uia
        .CreateCacheRequest()
        .map_err(|e| WindowsMcpError::ComError(format!("CreateCacheRequest: {e}")))?;

    req.SetTreeScope(scope)
        .map_err(|e| WindowsMcpError::ComError(format!("SetTreeScope: {e}")))?;

    for prop in the_21_properties() {
        req.AddProperty(prop)
            .map_err(|e| WindowsMcpError::ComError(format!("AddProperty({prop:?}): {e}")))?;
    }
    req.AddProperty(UIA_ValueIsReadOnlyPropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(ValueIsReadOnly): {e}")))?;
    req.AddProperty(UIA_ValueValuePropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(ValueValue): {e}")))?;
    req.AddProperty(UIA_OrientationPropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(Orientation): {e}")))?;
    req.AddProperty(UIA_RangeValueMinimumPropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(RangeValueMinimum): {e}")))?;
    req.AddProperty(UIA_RangeValueMaximumPropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(RangeValueMaximum): {e}")))?;
    req.AddProperty(UIA_AriaPropertiesPropertyId)
        .map_err(|e| WindowsMcpError::ComError(format!("AddProperty(AriaProperties): {e}")))?;

    Ok(req)
}

fn root_for_handle(
    uia: &IUIAutomation,
    handle: isize,
    cache_req: &IUIAutomationCacheRequest,
) -> Result<IUIAutomationElement, WindowsMcpError> {
    unsafe {
        uia.ElementFromHandleBuildCache(HWND(handle as *mut core::ffi::c_void), cache_req)
            .map_err(|e| WindowsMcpError::TreeError(format!("ElementFromHandleBuildCache: {e}")))
    }
}

// ---------------------------------------------------------------------------
// capture_subtree_cached
// ---------------------------------------------------------------------------

unsafe fn walk_cached(
    element: &IUIAutomationElement,
    depth: usize,
    max_depth: usize,
    ids: &mut IdGen,
    registry: &Registry,
) -> CupNode {
    let id = ids.next();
    let mut node = build_node(element, id.clone());
    registry.insert(id, element.clone());

    if depth < max_depth {
        if let Ok(children) = element.GetCachedChildren() {
            if let Ok(len) = children.Length() {
                let len = len.min(MAX_CHILDREN_PER_NODE);
                for i in 0..len {
                    if let Ok(child) = children.GetElement(i) {
                        node.children
                            .push(walk_cached(&child, depth + 1, max_depth, ids, registry));
                    }
                }
            }
        }
    }

    node
}

/// Capture one window's tree via a single `GetCachedChildren` descent per
/// level, all properties having been prefetched by one subtree cache
/// request. The default and fastest traversal mode. `ids` is shared
/// across every window captured into the same snapshot so ids stay
/// unique snapshot-wide, not just within this window.
pub fn capture_subtree_cached(
    handle: isize,
    max_depth: usize,
    registry: &Registry,
    ids: &mut IdGen,
) -> Result<Vec<CupNode>, WindowsMcpError> {
    let max_depth = max_depth.min(MAX_TREE_DEPTH);
    let _com = COMGuard::init()?;

    let uia: IUIAutomation = unsafe {
        CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)
            .map_err(|e| WindowsMcpError::ComError(format!("CoCreateInstance: {e}")))?
    };
    let cache_req = unsafe { build_cache_request(&uia, TreeScope_Subtree)? };
    let root = root_for_handle(&uia, handle, &cache_req)?;

    let node = unsafe { walk_cached(&root, 0, max_depth, ids, registry) };
    Ok(vec![node])
}

// ---------------------------------------------------------------------------
// capture_subtree_flat
// ---------------------------------------------------------------------------

/// Capture one window's tree as a flat list via a single
/// `FindAllBuildCache(TreeScope_Descendants)` call: every descendant
/// becomes a top-level [`CupNode`] with no `children`, in the order UIA
/// returns them (implementation-defined, typically preorder). Cheaper
/// than [`capture_subtree_cached`] per-call-overhead-wise on very wide
/// trees, at the cost of losing parent/child structure. `ids` is shared
/// across every window captured into the same snapshot.
pub fn capture_subtree_flat(
    handle: isize,
    registry: &Registry,
    ids: &mut IdGen,
) -> Result<Vec<CupNode>, WindowsMcpError> {
    let _com = COMGuard::init()?;

    let uia: IUIAutomation = unsafe {
        CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)
            .map_err(|e| WindowsMcpError::ComError(format!("CoCreateInstance: {e}")))?
    };
    let cache_req = unsafe { build_cache_request(&uia, TreeScope_Descendants)? };
    let root = root_for_handle(&uia, handle, &cache_req)?;

    let condition = unsafe {
        uia.CreateTrueCondition()
            .map_err(|e| WindowsMcpError::ComError(format!("CreateTrueCondition: {e}")))?
    };

    let found = unsafe {
        root.FindAllBuildCache(TreeScope_Descendants, &condition, &cache_req)
            .map_err(|e| WindowsMcpError::TreeError(format!("FindAllBuildCache: {e}")))?
    };

    let len = unsafe { found.Length() }.unwrap_or(0).min(4096);
    let mut nodes = Vec::with_capacity(len as usize);

    let root_id = ids.next();
    let root_node = unsafe { build_node(&root, root_id.clone()) };
    registry.insert(root_id, root.clone());
    nodes.push(root_node);

    for i in 0..len {
        if let Ok(element) = unsafe { found.GetElement(i) } {
            let id = ids.next();
            let node = unsafe { build_node(&element, id.clone()) };
            registry.insert(id, element);
            nodes.push(node);
        }
    }

    Ok(nodes)
}

// ---------------------------------------------------------------------------
// capture_subtree_legacy
// ---------------------------------------------------------------------------

unsafe fn walk_legacy(
    element: &IUIAutomationElement,
    depth: usize,
    max_depth: usize,
    uia: &IUIAutomation,
    walker: &IUIAutomationTreeWalker,
    cache_req: &IUIAutomationCacheRequest,
    ids: &mut IdGen,
    registry: &Registry,
) -> CupNode {
    let id = ids.next();
    let mut node = build_node(element, id.clone());
    registry.insert(id, element.clone());

    if depth >= max_depth {
        return node;
    }

    let mut count = 0;
    let mut child = walker.GetFirstChildElementBuildCache(element, cache_req).ok();
    while let Some(current) = child {
        node.children.push(walk_legacy(
            &current, depth + 1, max_depth, uia, walker, cache_req, ids, registry,
        ));
        count += 1;
        if count >= MAX_CHILDREN_PER_NODE {
            break;
        }
        child = walker
            .GetNextSiblingElementBuildCache(&current, cache_req)
            .ok();
    }

    node
}

/// Capture one window's tree via `IUIAutomationTreeWalker`, issuing a
/// fresh `BuildUpdatedCache`-equivalent (`GetFirstChildElementBuildCache`/
/// `GetNextSiblingElementBuildCache`) per node instead of one subtree-wide
/// cache request. Slower, but a misbehaving automation peer that rejects
/// the combined cache request for the whole subtree can still be walked
/// node by node. `ids` is shared across every window captured into the
/// same snapshot.
pub fn capture_subtree_legacy(
    handle: isize,
    max_depth: usize,
    registry: &Registry,
    ids: &mut IdGen,
) -> Result<Vec<CupNode>, WindowsMcpError> {
    let max_depth = max_depth.min(MAX_TREE_DEPTH);
    let _com = COMGuard::init()?;

    let uia: IUIAutomation = unsafe {
        CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)
            .map_err(|e| WindowsMcpError::ComError(format!("CoCreateInstance: {e}")))?
    };
    let cache_req = unsafe { build_cache_request(&uia, TreeScope_Subtree)? };
    let root = root_for_handle(&uia, handle, &cache_req)?;

    let walker = unsafe {
        uia.ControlViewWalker()
            .map_err(|e| WindowsMcpError::ComError(format!("ControlViewWalker: {e}")))?
    };

    let node = unsafe {
        walk_legacy(&root, 0, max_depth, &uia, &walker, &cache_req, ids, registry)
    };
    Ok(vec![node])
}

/// Dispatch to the requested traversal mode. `ids` is shared across every
/// window captured into the same snapshot so ids stay unique
/// snapshot-wide (see §3's id-uniqueness invariant).
pub fn capture_subtree(
    handle: isize,
    max_depth: usize,
    mode: TraversalMode,
    registry: &Registry,
    ids: &mut IdGen,
) -> Result<Vec<CupNode>, WindowsMcpError> {
    match mode {
        TraversalMode::Cached => capture_subtree_cached(handle, max_depth, registry, ids),
        TraversalMode::Flat => capture_subtree_flat(handle, registry, ids),
        TraversalMode::Legacy => capture_subtree_legacy(handle, max_depth, registry, ids),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_gen_produces_preorder_ids() {
        let mut ids = IdGen(0);
        assert_eq!(ids.next(), "e0");
        assert_eq!(ids.next(), "e1");
        assert_eq!(ids.next(), "e2");
    }

    #[test]
    fn max_tree_depth_is_fifty() {
        assert_eq!(MAX_TREE_DEPTH, 50);
    }

    #[test]
    fn traversal_mode_default_is_cached() {
        assert_eq!(TraversalMode::default(), TraversalMode::Cached);
    }
}
