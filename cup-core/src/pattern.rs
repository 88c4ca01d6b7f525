//! UIA pattern invocation: Invoke, Toggle, SetValue, Expand, Collapse, Select,
//! Scroll, Increment, Decrement, Dismiss, and the click-family actions.
//!
//! Every function here operates on an already-resolved element handle (as
//! held by the Reference Registry) and assumes the caller already owns an
//! MTA COM apartment. All functions are pure Rust with no PyO3 dependency.

use serde::Serialize;
use windows::core::Interface;
use windows::Win32::UI::Accessibility::{
    IUIAutomationRangeValuePattern, IUIAutomationScrollPattern, IUIAutomationWindowPattern,
    ScrollAmount_LargeDecrement, ScrollAmount_LargeIncrement, ScrollAmount_NoAmount,
    IUIAutomationElement,
    IUIAutomationExpandCollapsePattern, IUIAutomationInvokePattern,
    IUIAutomationSelectionItemPattern, IUIAutomationTogglePattern, IUIAutomationValuePattern,
    UIA_AppBarControlTypeId, UIA_ButtonControlTypeId, UIA_CalendarControlTypeId,
    UIA_CheckBoxControlTypeId, UIA_ComboBoxControlTypeId, UIA_CustomControlTypeId,
    UIA_DataGridControlTypeId, UIA_DataItemControlTypeId, UIA_DocumentControlTypeId,
    UIA_EditControlTypeId, UIA_ExpandCollapsePatternId, UIA_GroupControlTypeId,
    UIA_HeaderControlTypeId, UIA_HeaderItemControlTypeId, UIA_HyperlinkControlTypeId,
    UIA_ImageControlTypeId, UIA_InvokePatternId, UIA_ListControlTypeId, UIA_ListItemControlTypeId,
    UIA_MenuBarControlTypeId, UIA_MenuControlTypeId, UIA_MenuItemControlTypeId,
    UIA_PaneControlTypeId, UIA_ProgressBarControlTypeId, UIA_RadioButtonControlTypeId,
    UIA_RangeValuePatternId, UIA_ScrollBarControlTypeId, UIA_ScrollPatternId,
    UIA_SelectionItemPatternId, UIA_SemanticZoomControlTypeId, UIA_SeparatorControlTypeId,
    UIA_SliderControlTypeId, UIA_SpinnerControlTypeId, UIA_SplitButtonControlTypeId,
    UIA_StatusBarControlTypeId, UIA_TabControlTypeId, UIA_TabItemControlTypeId,
    UIA_TableControlTypeId, UIA_TextControlTypeId, UIA_ThumbControlTypeId,
    UIA_TitleBarControlTypeId, UIA_ToolBarControlTypeId,
    UIA_ToolTipControlTypeId, UIA_TreeControlTypeId, UIA_TreeItemControlTypeId,
    UIA_ValuePatternId, UIA_WindowControlTypeId, UIA_WindowPatternId, UIA_CONTROLTYPE_ID,
};

use crate::errors::WindowsMcpError;

// ---------------------------------------------------------------------------
// Control-type ID -> friendly name mapping (for diagnostics only; the CUP
// role mapping lives in `cup::roles::control_type_to_role`).
// ---------------------------------------------------------------------------

fn control_type_name(id: UIA_CONTROLTYPE_ID) -> &'static str {
    match id {
        x if x == UIA_AppBarControlTypeId => "AppBar",
        x if x == UIA_ButtonControlTypeId => "Button",
        x if x == UIA_CalendarControlTypeId => "Calendar",
        x if x == UIA_CheckBoxControlTypeId => "CheckBox",
        x if x == UIA_ComboBoxControlTypeId => "ComboBox",
        x if x == UIA_CustomControlTypeId => "Custom",
        x if x == UIA_DataGridControlTypeId => "DataGrid",
        x if x == UIA_DataItemControlTypeId => "DataItem",
        x if x == UIA_DocumentControlTypeId => "Document",
        x if x == UIA_EditControlTypeId => "Edit",
        x if x == UIA_GroupControlTypeId => "Group",
        x if x == UIA_HeaderControlTypeId => "Header",
        x if x == UIA_HeaderItemControlTypeId => "HeaderItem",
        x if x == UIA_HyperlinkControlTypeId => "Hyperlink",
        x if x == UIA_ImageControlTypeId => "Image",
        x if x == UIA_ListControlTypeId => "List",
        x if x == UIA_ListItemControlTypeId => "ListItem",
        x if x == UIA_MenuBarControlTypeId => "MenuBar",
        x if x == UIA_MenuControlTypeId => "Menu",
        x if x == UIA_MenuItemControlTypeId => "MenuItem",
        x if x == UIA_PaneControlTypeId => "Pane",
        x if x == UIA_ProgressBarControlTypeId => "ProgressBar",
        x if x == UIA_RadioButtonControlTypeId => "RadioButton",
        x if x == UIA_ScrollBarControlTypeId => "ScrollBar",
        x if x == UIA_SemanticZoomControlTypeId => "SemanticZoom",
        x if x == UIA_SeparatorControlTypeId => "Separator",
        x if x == UIA_SliderControlTypeId => "Slider",
        x if x == UIA_SpinnerControlTypeId => "Spinner",
        x if x == UIA_SplitButtonControlTypeId => "SplitButton",
        x if x == UIA_StatusBarControlTypeId => "StatusBar",
        x if x == UIA_TabControlTypeId => "Tab",
        x if x == UIA_TabItemControlTypeId => "TabItem",
        x if x == UIA_TableControlTypeId => "Table",
        x if x == UIA_TextControlTypeId => "Text",
        x if x == UIA_ThumbControlTypeId => "Thumb",
        x if x == UIA_TitleBarControlTypeId => "TitleBar",
        x if x == UIA_ToolBarControlTypeId => "ToolBar",
        x if x == UIA_ToolTipControlTypeId => "ToolTip",
        x if x == UIA_TreeControlTypeId => "Tree",
        x if x == UIA_TreeItemControlTypeId => "TreeItem",
        x if x == UIA_WindowControlTypeId => "Window",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Result of a UIA pattern invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PatternResult {
    pub element_name: String,
    pub element_type: String,
    pub action: String,
    pub success: bool,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read element name for diagnostics.
unsafe fn elem_name(element: &IUIAutomationElement) -> String {
    element
        .CurrentName()
        .map(|b| b.to_string())
        .unwrap_or_default()
}

/// Read element localized control type for diagnostics.
unsafe fn elem_type(element: &IUIAutomationElement) -> String {
    element
        .CurrentControlType()
        .map(|id| control_type_name(id).to_owned())
        .unwrap_or_else(|_| "Unknown".to_owned())
}

/// Build a [`PatternResult`] with `success = false`.
fn pattern_not_supported(name: &str, etype: &str, action: &str, pattern_name: &str) -> PatternResult {
    PatternResult {
        element_name: name.to_owned(),
        element_type: etype.to_owned(),
        action: action.to_owned(),
        success: false,
        detail: format!("Element does not support {pattern_name}"),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------
//
// Every function below operates on an already-resolved `IUIAutomationElement`
// handle (as held by the Reference Registry); no COM apartment needs
// initialising here -- the caller already owns one.

/// Invoke the `InvokePattern` on an already-resolved element.
pub fn invoke(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationInvokePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_InvokePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationInvokePattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Invoke() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Invoke failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "invoke".into(),
                success: true,
                detail: "Invoked".into(),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, "invoke", "InvokePattern")),
    }
}

/// Toggle the `TogglePattern` on an already-resolved element.
pub fn toggle(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationTogglePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_TogglePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationTogglePattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Toggle() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Toggle failed: {e}")))?;

            let state = unsafe { p.CurrentToggleState() }.unwrap_or_default();
            let state_name = match state.0 {
                0 => "off",
                1 => "on",
                2 => "indeterminate",
                _ => "unknown",
            };

            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "toggle".into(),
                success: true,
                detail: format!("State: {state_name}"),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, "toggle", "TogglePattern")),
    }
}

/// Set a value via `ValuePattern` on an already-resolved element.
pub fn set_value(element: &IUIAutomationElement, value: &str) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationValuePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_ValuePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationValuePattern>().ok())
    };

    match pattern {
        Some(p) => {
            let bstr = windows::core::BSTR::from(value);
            unsafe { p.SetValue(&bstr) }
                .map_err(|e| WindowsMcpError::TreeError(format!("SetValue failed: {e}")))?;

            let preview = if value.len() > 50 {
                format!("{}...", &value[..50])
            } else {
                value.to_owned()
            };

            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "set_value".into(),
                success: true,
                detail: format!("Value set to '{preview}'"),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, "set_value", "ValuePattern")),
    }
}

/// Expand via `ExpandCollapsePattern` on an already-resolved element.
pub fn expand(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationExpandCollapsePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_ExpandCollapsePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationExpandCollapsePattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Expand() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Expand failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "expand".into(),
                success: true,
                detail: "Expanded".into(),
            })
        }
        None => Ok(pattern_not_supported(
            &name,
            &etype,
            "expand",
            "ExpandCollapsePattern",
        )),
    }
}

/// Collapse via `ExpandCollapsePattern` on an already-resolved element.
pub fn collapse(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationExpandCollapsePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_ExpandCollapsePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationExpandCollapsePattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Collapse() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Collapse failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "collapse".into(),
                success: true,
                detail: "Collapsed".into(),
            })
        }
        None => Ok(pattern_not_supported(
            &name,
            &etype,
            "collapse",
            "ExpandCollapsePattern",
        )),
    }
}

/// Select via `SelectionItemPattern` on an already-resolved element.
pub fn select(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationSelectionItemPattern> = unsafe {
        element
            .GetCurrentPattern(UIA_SelectionItemPatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationSelectionItemPattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Select() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Select failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "select".into(),
                success: true,
                detail: "Selected".into(),
            })
        }
        None => Ok(pattern_not_supported(
            &name,
            &etype,
            "select",
            "SelectionItemPattern",
        )),
    }
}

/// Scroll via `ScrollPattern` on an already-resolved element. `direction`
/// is one of `"up"`, `"down"`, `"left"`, `"right"`; anything else scrolls
/// vertically by a large increment as a default.
pub fn scroll(element: &IUIAutomationElement, direction: &str) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationScrollPattern> = unsafe {
        element
            .GetCurrentPattern(UIA_ScrollPatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationScrollPattern>().ok())
    };

    match pattern {
        Some(p) => {
            let (h, v) = match direction {
                "up" => (ScrollAmount_NoAmount, ScrollAmount_LargeDecrement),
                "down" => (ScrollAmount_NoAmount, ScrollAmount_LargeIncrement),
                "left" => (ScrollAmount_LargeDecrement, ScrollAmount_NoAmount),
                "right" => (ScrollAmount_LargeIncrement, ScrollAmount_NoAmount),
                _ => (ScrollAmount_NoAmount, ScrollAmount_LargeIncrement),
            };
            unsafe { p.Scroll(h, v) }
                .map_err(|e| WindowsMcpError::TreeError(format!("Scroll failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "scroll".into(),
                success: true,
                detail: format!("Scrolled {direction}"),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, "scroll", "ScrollPattern")),
    }
}

/// Increment via `RangeValuePattern` on an already-resolved element,
/// stepping by the pattern's own `SmallChange`.
pub fn increment(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    step_range_value(element, "increment", true)
}

/// Decrement via `RangeValuePattern` on an already-resolved element,
/// stepping by the pattern's own `SmallChange`.
pub fn decrement(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    step_range_value(element, "decrement", false)
}

fn step_range_value(
    element: &IUIAutomationElement,
    action: &str,
    increase: bool,
) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationRangeValuePattern> = unsafe {
        element
            .GetCurrentPattern(UIA_RangeValuePatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationRangeValuePattern>().ok())
    };

    match pattern {
        Some(p) => {
            let current = unsafe { p.CurrentValue() }.unwrap_or(0.0);
            let step = unsafe { p.CurrentSmallChange() }.unwrap_or(1.0);
            let min = unsafe { p.CurrentMinimum() }.unwrap_or(f64::MIN);
            let max = unsafe { p.CurrentMaximum() }.unwrap_or(f64::MAX);

            let target = if increase { current + step } else { current - step };
            let clamped = target.clamp(min, max);

            unsafe { p.SetValue(clamped) }
                .map_err(|e| WindowsMcpError::TreeError(format!("{action} failed: {e}")))?;

            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: action.into(),
                success: true,
                detail: format!("Value set to {clamped}"),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, action, "RangeValuePattern")),
    }
}

/// Dismiss the window owning an already-resolved element via
/// `WindowPattern::Close`.
pub fn dismiss(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    let pattern: Option<IUIAutomationWindowPattern> = unsafe {
        element
            .GetCurrentPattern(UIA_WindowPatternId)
            .ok()
            .and_then(|p| p.cast::<IUIAutomationWindowPattern>().ok())
    };

    match pattern {
        Some(p) => {
            unsafe { p.Close() }
                .map_err(|e| WindowsMcpError::TreeError(format!("Close failed: {e}")))?;
            Ok(PatternResult {
                element_name: name,
                element_type: etype,
                action: "dismiss".into(),
                success: true,
                detail: "Closed".into(),
            })
        }
        None => Ok(pattern_not_supported(&name, &etype, "dismiss", "WindowPattern")),
    }
}

/// Right-click: falls back to `InvokePattern` (no distinct UIA pattern
/// for a context-menu click), since most right-clickable controls expose
/// their context action through `Invoke` as well.
pub fn rightclick(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    invoke(element).map(|mut r| {
        r.action = "rightclick".into();
        r
    })
}

/// Double-click: falls back to `InvokePattern`, matching single-click
/// semantics since UIA exposes no distinct double-click pattern.
pub fn doubleclick(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    invoke(element).map(|mut r| {
        r.action = "doubleclick".into();
        r
    })
}

/// Long-press: falls back to `InvokePattern`, matching single-click
/// semantics since UIA exposes no distinct long-press pattern.
pub fn longpress(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    invoke(element).map(|mut r| {
        r.action = "longpress".into();
        r
    })
}

/// Move input focus to an already-resolved element via
/// `IUIAutomationElement::SetFocus`.
pub fn focus(element: &IUIAutomationElement) -> Result<PatternResult, WindowsMcpError> {
    let name = unsafe { elem_name(element) };
    let etype = unsafe { elem_type(element) };

    unsafe { element.SetFocus() }
        .map_err(|e| WindowsMcpError::TreeError(format!("SetFocus failed: {e}")))?;

    Ok(PatternResult {
        element_name: name,
        element_type: etype,
        action: "focus".into(),
        success: true,
        detail: "Focused".into(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_result_serialization() {
        let r = PatternResult {
            element_name: "OK Button".into(),
            element_type: "Button".into(),
            action: "invoke".into(),
            success: true,
            detail: "Invoked at (100,200)".into(),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("OK Button"));
    }

    #[test]
    fn test_pattern_result_failure() {
        let r = pattern_not_supported("test", "Button", "toggle", "TogglePattern");
        assert!(!r.success);
        assert!(r.detail.contains("TogglePattern"));
    }

    #[test]
    fn test_pattern_result_detail_formatting() {
        let r = PatternResult {
            element_name: "Check".into(),
            element_type: "CheckBox".into(),
            action: "toggle".into(),
            success: true,
            detail: "State: on".into(),
        };
        assert_eq!(r.detail, "State: on");
    }

    #[test]
    fn test_set_value_preview_truncation() {
        let long_value = "a".repeat(100);
        let preview = if long_value.len() > 50 {
            format!("{}...", &long_value[..50])
        } else {
            long_value.clone()
        };
        assert_eq!(preview.len(), 53); // 50 chars + "..."
        assert!(preview.ends_with("..."));
    }
}
