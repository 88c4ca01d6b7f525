//! UIA control-type -> canonical role mapping.
//!
//! Grounded directly on `CUP_ROLES` / `CONTROL_TYPES` from the benchmark
//! harness this crate's tree-capture pipeline is descended from: the 41
//! UIA control type IDs (50000-50040) each map to exactly one canonical
//! [`Role`], with `Pane` (50033) promoted to `Region` when the element
//! carries a non-empty name.

use crate::cup::node::Role;

/// `(UIA_ControlTypeId, Role)` in UIA numeric order. `Pane` (50033) is
/// listed here as its unrefined `Generic` mapping; [`control_type_to_role`]
/// applies the name-based promotion to `Region` on top of this table.
const CUP_ROLES: &[(i32, Role)] = &[
    (50000, Role::Button),       // Button
    (50001, Role::Grid),         // Calendar
    (50002, Role::Checkbox),     // CheckBox
    (50003, Role::Combobox),     // ComboBox
    (50004, Role::Textbox),      // Edit
    (50005, Role::Link),         // Hyperlink
    (50006, Role::Img),          // Image
    (50007, Role::Listitem),     // ListItem
    (50008, Role::List),         // List
    (50009, Role::Menu),         // Menu
    (50010, Role::Menubar),      // MenuBar
    (50011, Role::Menuitem),     // MenuItem
    (50012, Role::Progressbar),  // ProgressBar
    (50013, Role::Radio),        // RadioButton
    (50014, Role::Scrollbar),    // ScrollBar
    (50015, Role::Slider),       // Slider
    (50016, Role::Spinbutton),   // Spinner
    (50017, Role::Status),       // StatusBar
    (50018, Role::Tablist),      // Tab (the container)
    (50019, Role::Tab),          // TabItem
    (50020, Role::Text),         // Text
    (50021, Role::Toolbar),      // ToolBar
    (50022, Role::Tooltip),      // ToolTip
    (50023, Role::Tree),         // Tree
    (50024, Role::Treeitem),     // TreeItem
    (50025, Role::Generic),      // Custom
    (50026, Role::Group),        // Group
    (50027, Role::Generic),      // Thumb
    (50028, Role::Grid),         // DataGrid
    (50029, Role::Row),          // DataItem
    (50030, Role::Document),     // Document
    (50031, Role::Button),       // SplitButton
    (50032, Role::Window),       // Window
    (50033, Role::Generic),      // Pane -- context-dependent, refined by caller
    (50034, Role::Group),        // Header
    (50035, Role::Columnheader), // HeaderItem
    (50036, Role::Table),        // Table
    (50037, Role::Titlebar),     // TitleBar
    (50038, Role::Separator),    // Separator
    (50039, Role::Generic),      // SemanticZoom
    (50040, Role::Toolbar),      // AppBar
];

/// UIA control type ID for `Pane`, the one entry whose role depends on
/// whether the element carries a name.
const PANE_CONTROL_TYPE_ID: i32 = 50033;

/// Roles that accept text input: govern the `editable` state and the
/// `type` action in the Node Builder. Distinct from the serializer's
/// value-rendering role set below -- do not conflate the two.
pub const TEXT_INPUT_ROLES: &[Role] = &[Role::Textbox, Role::Searchbox, Role::Combobox, Role::Document];

/// Roles whose `value` the compact serializer renders. A superset of
/// [`TEXT_INPUT_ROLES`] plus `spinbutton`/`slider`, which take
/// `setvalue`/`increment`/`decrement` but never `type`.
pub const VALUE_SERIALIZATION_ROLES: &[Role] = &[
    Role::Textbox,
    Role::Searchbox,
    Role::Combobox,
    Role::Spinbutton,
    Role::Slider,
];

/// Map a raw UIA control type ID to its canonical role, defaulting to
/// `generic` for unrecognised IDs. `name` drives the Pane -> Region
/// promotion: any non-empty name, including a whitespace-only one,
/// counts (matches the originating harness's `if ct == 50033 and name:`
/// literally -- not `name.trim()`).
pub fn control_type_to_role(control_type_id: i32, name: &str) -> Role {
    if control_type_id == PANE_CONTROL_TYPE_ID && !name.is_empty() {
        return Role::Region;
    }
    CUP_ROLES
        .iter()
        .find(|(id, _)| *id == control_type_id)
        .map(|(_, role)| *role)
        .unwrap_or(Role::Generic)
}

pub fn is_text_input_role(role: Role) -> bool {
    TEXT_INPUT_ROLES.contains(&role)
}

pub fn is_value_serialization_role(role: Role) -> bool {
    VALUE_SERIALIZATION_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pane_without_name_is_generic() {
        assert_eq!(control_type_to_role(50033, ""), Role::Generic);
    }

    #[test]
    fn pane_with_name_is_region() {
        assert_eq!(control_type_to_role(50033, "Navigation"), Role::Region);
    }

    #[test]
    fn pane_with_whitespace_only_name_is_region() {
        // Matches the originating harness's truthiness check literally:
        // a whitespace-only Python string is still truthy.
        assert_eq!(control_type_to_role(50033, "   "), Role::Region);
    }

    #[test]
    fn edit_maps_to_textbox() {
        assert_eq!(control_type_to_role(50004, "Search"), Role::Textbox);
    }

    #[test]
    fn split_button_collapses_to_button() {
        assert_eq!(control_type_to_role(50031, ""), Role::Button);
    }

    #[test]
    fn calendar_and_data_grid_collapse_to_grid() {
        assert_eq!(control_type_to_role(50001, ""), Role::Grid);
        assert_eq!(control_type_to_role(50028, ""), Role::Grid);
    }

    #[test]
    fn unknown_control_type_is_generic() {
        assert_eq!(control_type_to_role(99999, "whatever"), Role::Generic);
    }

    #[test]
    fn value_roles_are_a_superset_of_text_input_roles_minus_document() {
        assert!(is_value_serialization_role(Role::Spinbutton));
        assert!(is_value_serialization_role(Role::Slider));
        assert!(!is_text_input_role(Role::Spinbutton));
        assert!(is_text_input_role(Role::Document));
        assert!(!is_value_serialization_role(Role::Document));
    }
}
