//! Maps a cached UIA element into a [`CupNode`].
//!
//! Grounded in `build_cup_node` from the benchmark harness this crate's
//! capture pipeline descends from: every field is read from the single
//! batched cache populated by the tree walker (never a fresh COM call),
//! so building a node is pure in-process work.

use windows::core::VARIANT;
use windows::Win32::UI::Accessibility::{
    IUIAutomationElement, UIA_AriaPropertiesPropertyId, UIA_AutomationIdPropertyId,
    UIA_ClassNamePropertyId, UIA_ExpandCollapseExpandCollapseStatePropertyId,
    UIA_HelpTextPropertyId, UIA_IsExpandCollapsePatternAvailablePropertyId,
    UIA_IsInvokePatternAvailablePropertyId, UIA_IsRangeValuePatternAvailablePropertyId,
    UIA_IsScrollPatternAvailablePropertyId, UIA_IsSelectionItemPatternAvailablePropertyId,
    UIA_IsTogglePatternAvailablePropertyId, UIA_IsValuePatternAvailablePropertyId,
    UIA_OrientationPropertyId, UIA_PROPERTY_ID, UIA_RangeValueMaximumPropertyId,
    UIA_RangeValueMinimumPropertyId, UIA_SelectionItemIsSelectedPropertyId,
    UIA_ToggleToggleStatePropertyId, UIA_ValueIsReadOnlyPropertyId, UIA_ValueValuePropertyId,
};

use crate::cup::node::{Action, Attributes, Bounds, CupNode, PlatformMeta, State};
use crate::cup::roles::{control_type_to_role, is_text_input_role};

/// A node's name/description/value are truncated to this many characters
/// before being stored, matching the harness's `name[:200]` / `[:200]`.
const FIELD_TRUNCATE_LEN: usize = 200;

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

unsafe fn cached_bool(element: &IUIAutomationElement, prop: UIA_PROPERTY_ID, default: bool) -> bool {
    element
        .GetCachedPropertyValue(prop)
        .ok()
        .and_then(|v: VARIANT| bool::try_from(&v).ok())
        .unwrap_or(default)
}

unsafe fn cached_i32(element: &IUIAutomationElement, prop: UIA_PROPERTY_ID, default: i32) -> i32 {
    element
        .GetCachedPropertyValue(prop)
        .ok()
        .and_then(|v: VARIANT| i32::try_from(&v).ok())
        .unwrap_or(default)
}

unsafe fn cached_string(element: &IUIAutomationElement, prop: UIA_PROPERTY_ID) -> String {
    element
        .GetCachedPropertyValue(prop)
        .ok()
        .and_then(|v: VARIANT| windows::core::BSTR::try_from(&v).ok())
        .map(|b| b.to_string())
        .unwrap_or_default()
}

unsafe fn cached_f64(element: &IUIAutomationElement, prop: UIA_PROPERTY_ID) -> Option<f64> {
    element
        .GetCachedPropertyValue(prop)
        .ok()
        .and_then(|v: VARIANT| f64::try_from(&v).ok())
}

/// Pull `key:value;` tokens out of a UIA `AriaProperties` string, the
/// form Chromium's UIA bridge uses to surface ARIA attributes
/// (`"level:2;placeholder:Search;"`) that have no dedicated UIA
/// property of their own.
fn aria_property<'a>(aria: &'a str, key: &str) -> Option<&'a str> {
    aria.split(';').find_map(|tok| {
        let tok = tok.trim();
        let (k, v) = tok.split_once(':')?;
        if k.trim() == key {
            Some(v.trim())
        } else {
            None
        }
    })
}

/// Derive the optional `attributes` sidecar: heading `level` and input
/// `placeholder` come from `AriaProperties` (browser/Electron content
/// only -- native Win32 controls leave it empty); `orientation` and the
/// range-value bounds come from their own cached UIA properties and are
/// only meaningful when the relevant pattern is available.
unsafe fn build_attributes(
    element: &IUIAutomationElement,
    aria_properties: &str,
    has_range: bool,
) -> Attributes {
    let level = aria_property(aria_properties, "level").and_then(|v| v.parse::<i32>().ok());
    let placeholder = aria_property(aria_properties, "placeholder")
        .filter(|p| !p.is_empty())
        .map(|p| truncate(p, 30));

    let orientation = match cached_i32(element, UIA_OrientationPropertyId, 0) {
        1 => Some("horizontal".to_string()),
        2 => Some("vertical".to_string()),
        _ => None,
    };

    let (value_min, value_max) = if has_range {
        (
            cached_f64(element, UIA_RangeValueMinimumPropertyId),
            cached_f64(element, UIA_RangeValueMaximumPropertyId),
        )
    } else {
        (None, None)
    };

    Attributes { level, placeholder, orientation, value_min, value_max }
}

/// Build a [`CupNode`] from a fully-cached UIA element. `id` has already
/// been assigned by the traversal's preorder id generator; `children` is
/// always empty here -- callers attach descendants after recursing.
pub unsafe fn build_node(element: &IUIAutomationElement, id: String) -> CupNode {
    let name = element
        .CachedName()
        .map(|b| b.to_string())
        .unwrap_or_default();

    let control_type_id = element
        .CachedControlType()
        .map(|ct| ct.0)
        .unwrap_or(0);

    let bounds = element.CachedBoundingRectangle().ok().and_then(|r| {
        let w = r.right - r.left;
        let h = r.bottom - r.top;
        if w <= 0 || h <= 0 {
            None
        } else {
            Some(Bounds { x: r.left, y: r.top, w, h })
        }
    });

    let is_enabled = element.CachedIsEnabled().map(|b| b.as_bool()).unwrap_or(true);
    let has_focus = element
        .CachedHasKeyboardFocus()
        .map(|b| b.as_bool())
        .unwrap_or(false);
    let is_offscreen = element
        .CachedIsOffscreen()
        .map(|b| b.as_bool())
        .unwrap_or(false);

    let has_invoke = cached_bool(element, UIA_IsInvokePatternAvailablePropertyId, false);
    let has_toggle = cached_bool(element, UIA_IsTogglePatternAvailablePropertyId, false);
    let has_expand = cached_bool(
        element,
        UIA_IsExpandCollapsePatternAvailablePropertyId,
        false,
    );
    let has_value = cached_bool(element, UIA_IsValuePatternAvailablePropertyId, false);
    let has_sel_item = cached_bool(
        element,
        UIA_IsSelectionItemPatternAvailablePropertyId,
        false,
    );
    let has_scroll = cached_bool(element, UIA_IsScrollPatternAvailablePropertyId, false);
    let has_range = cached_bool(
        element,
        UIA_IsRangeValuePatternAvailablePropertyId,
        false,
    );

    let toggle_state = cached_i32(element, UIA_ToggleToggleStatePropertyId, -1);
    let expand_state = cached_i32(
        element,
        UIA_ExpandCollapseExpandCollapseStatePropertyId,
        -1,
    );
    let is_selected = cached_bool(element, UIA_SelectionItemIsSelectedPropertyId, false);
    let val_readonly = if has_value {
        cached_bool(element, UIA_ValueIsReadOnlyPropertyId, false)
    } else {
        false
    };
    let val_str = if has_value {
        cached_string(element, UIA_ValueValuePropertyId)
    } else {
        String::new()
    };

    let automation_id = cached_string(element, UIA_AutomationIdPropertyId);
    let class_name = cached_string(element, UIA_ClassNamePropertyId);
    let help_text = cached_string(element, UIA_HelpTextPropertyId);
    let aria_properties = cached_string(element, UIA_AriaPropertiesPropertyId);

    let role = control_type_to_role(control_type_id, &name);

    let mut states = Vec::new();
    if !is_enabled {
        states.push(State::Disabled);
    }
    if has_focus {
        states.push(State::Focused);
    }
    if is_offscreen {
        states.push(State::Offscreen);
    }
    if has_toggle {
        match toggle_state {
            1 => states.push(State::Checked),
            2 => states.push(State::Mixed),
            _ => {}
        }
    }
    if has_expand {
        match expand_state {
            0 => states.push(State::Collapsed),
            1 | 2 => states.push(State::Expanded),
            _ => {}
        }
    }
    if is_selected {
        states.push(State::Selected);
    }
    if has_value && val_readonly {
        states.push(State::Readonly);
    }
    if has_value && !val_readonly && is_text_input_role(role) {
        states.push(State::Editable);
    }

    let mut actions = Vec::new();
    if has_invoke {
        actions.push(Action::Click);
    }
    if has_toggle {
        actions.push(Action::Toggle);
    }
    const LEAF_NODE: i32 = 3;
    if has_expand && expand_state != LEAF_NODE {
        actions.push(Action::Expand);
        actions.push(Action::Collapse);
    }
    if has_value && !val_readonly {
        actions.push(Action::Setvalue);
        if is_text_input_role(role) {
            actions.push(Action::Type);
        }
    }
    if has_sel_item {
        actions.push(Action::Select);
    }
    if has_scroll {
        actions.push(Action::Scroll);
    }
    if has_range {
        actions.push(Action::Increment);
        actions.push(Action::Decrement);
    }
    if actions.is_empty() && is_enabled {
        actions.push(Action::Focus);
    }

    let mut patterns = Vec::new();
    if has_invoke {
        patterns.push("Invoke".to_string());
    }
    if has_toggle {
        patterns.push("Toggle".to_string());
    }
    if has_expand {
        patterns.push("ExpandCollapse".to_string());
    }
    if has_value {
        patterns.push("Value".to_string());
    }
    if has_sel_item {
        patterns.push("SelectionItem".to_string());
    }
    if has_scroll {
        patterns.push("Scroll".to_string());
    }
    if has_range {
        patterns.push("RangeValue".to_string());
    }

    CupNode {
        id,
        role,
        name: truncate(&name, FIELD_TRUNCATE_LEN),
        bounds,
        states,
        actions,
        value: if val_str.is_empty() {
            None
        } else {
            Some(truncate(&val_str, FIELD_TRUNCATE_LEN))
        },
        description: if help_text.is_empty() {
            None
        } else {
            Some(truncate(&help_text, FIELD_TRUNCATE_LEN))
        },
        attributes: {
            let attrs = build_attributes(element, &aria_properties, has_range);
            Some(attrs).filter(|a| !a.is_empty())
        },
        platform: Some(PlatformMeta {
            control_type_id: Some(control_type_id),
            automation_id: if automation_id.is_empty() {
                None
            } else {
                Some(automation_id)
            },
            class_name: if class_name.is_empty() {
                None
            } else {
                Some(class_name)
            },
            patterns,
        }),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "hello world";
        assert_eq!(truncate(s, 5), "hello");
        assert_eq!(truncate(s, 100), "hello world");
    }

    #[test]
    fn aria_property_extracts_known_key() {
        let aria = "level:2;placeholder:Search here;";
        assert_eq!(aria_property(aria, "level"), Some("2"));
        assert_eq!(aria_property(aria, "placeholder"), Some("Search here"));
        assert_eq!(aria_property(aria, "missing"), None);
    }

    #[test]
    fn aria_property_on_empty_string_is_none() {
        assert_eq!(aria_property("", "level"), None);
    }
}
