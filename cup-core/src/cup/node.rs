//! CUP Node, Envelope, and the canonical role/state/action vocabularies.

use serde::{Deserialize, Serialize};

/// Canonical role assigned by the Node Builder, independent of platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Button,
    Checkbox,
    Combobox,
    Textbox,
    Searchbox,
    Link,
    Img,
    List,
    Listitem,
    Menu,
    Menubar,
    Menuitem,
    Progressbar,
    Radio,
    Scrollbar,
    Slider,
    Spinbutton,
    Status,
    Tablist,
    Tab,
    Text,
    Toolbar,
    Tooltip,
    Tree,
    Treeitem,
    Grid,
    Row,
    Document,
    Window,
    Pane,
    Titlebar,
    Separator,
    Group,
    Region,
    Generic,
    Columnheader,
    Table,
    Heading,
    Dialog,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Checkbox => "checkbox",
            Role::Combobox => "combobox",
            Role::Textbox => "textbox",
            Role::Searchbox => "searchbox",
            Role::Link => "link",
            Role::Img => "img",
            Role::List => "list",
            Role::Listitem => "listitem",
            Role::Menu => "menu",
            Role::Menubar => "menubar",
            Role::Menuitem => "menuitem",
            Role::Progressbar => "progressbar",
            Role::Radio => "radio",
            Role::Scrollbar => "scrollbar",
            Role::Slider => "slider",
            Role::Spinbutton => "spinbutton",
            Role::Status => "status",
            Role::Tablist => "tablist",
            Role::Tab => "tab",
            Role::Text => "text",
            Role::Toolbar => "toolbar",
            Role::Tooltip => "tooltip",
            Role::Tree => "tree",
            Role::Treeitem => "treeitem",
            Role::Grid => "grid",
            Role::Row => "row",
            Role::Document => "document",
            Role::Window => "window",
            Role::Pane => "pane",
            Role::Titlebar => "titlebar",
            Role::Separator => "separator",
            Role::Group => "group",
            Role::Region => "region",
            Role::Generic => "generic",
            Role::Columnheader => "columnheader",
            Role::Table => "table",
            Role::Heading => "heading",
            Role::Dialog => "dialog",
        }
    }
}

/// Semantic state. Emitted only when true; absence means false/unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Disabled,
    Focused,
    Offscreen,
    Checked,
    Mixed,
    Collapsed,
    Expanded,
    Selected,
    Readonly,
    Editable,
    Required,
    Busy,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Disabled => "disabled",
            State::Focused => "focused",
            State::Offscreen => "offscreen",
            State::Checked => "checked",
            State::Mixed => "mixed",
            State::Collapsed => "collapsed",
            State::Expanded => "expanded",
            State::Selected => "selected",
            State::Readonly => "readonly",
            State::Editable => "editable",
            State::Required => "required",
            State::Busy => "busy",
        }
    }
}

/// Canonical action. `actions` on a node is an ordered subset of these 15,
/// with duplicates never introduced by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Click,
    Rightclick,
    Doubleclick,
    Toggle,
    Type,
    Setvalue,
    Select,
    Expand,
    Collapse,
    Scroll,
    Increment,
    Decrement,
    Focus,
    Longpress,
    Dismiss,
}

/// The full canonical action set, in the order spec.md lists it.
pub const CANONICAL_ACTIONS: &[Action] = &[
    Action::Click,
    Action::Rightclick,
    Action::Doubleclick,
    Action::Toggle,
    Action::Type,
    Action::Setvalue,
    Action::Select,
    Action::Expand,
    Action::Collapse,
    Action::Scroll,
    Action::Increment,
    Action::Decrement,
    Action::Focus,
    Action::Longpress,
    Action::Dismiss,
];

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Rightclick => "rightclick",
            Action::Doubleclick => "doubleclick",
            Action::Toggle => "toggle",
            Action::Type => "type",
            Action::Setvalue => "setvalue",
            Action::Select => "select",
            Action::Expand => "expand",
            Action::Collapse => "collapse",
            Action::Scroll => "scroll",
            Action::Increment => "increment",
            Action::Decrement => "decrement",
            Action::Focus => "focus",
            Action::Longpress => "longpress",
            Action::Dismiss => "dismiss",
        }
    }

    pub fn from_str(s: &str) -> Option<Action> {
        CANONICAL_ACTIONS.iter().copied().find(|a| a.as_str() == s)
    }
}

/// Screen-pixel bounding rectangle. Non-negative integers, device-pixel
/// space of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Typed sidecar for the handful of attribute keys the serializers and
/// Node Builder actually read/emit (§9 "dynamic property bags" design
/// note: a typed variant over known keys plus an open platform sidecar,
/// rather than a free-form map).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<f64>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.placeholder.is_none()
            && self.orientation.is_none()
            && self.value_min.is_none()
            && self.value_max.is_none()
    }
}

/// Windows-specific raw metadata: the "open sidecar for platform-specific
/// extensions" the design notes call for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_type_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub patterns: Vec<String>,
}

impl PlatformMeta {
    pub fn is_empty(&self) -> bool {
        self.control_type_id.is_none()
            && self.automation_id.is_none()
            && self.class_name.is_none()
            && self.patterns.is_empty()
    }
}

/// The unit of perception. See spec §3 for the full invariant set:
/// IDs are unique within a snapshot, parent IDs precede descendant IDs,
/// `actions` is always a subset of [`CANONICAL_ACTIONS`], and pruning
/// never changes a node's `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CupNode {
    pub id: String,
    pub role: Role,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub states: Vec<State>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_attrs_empty", default)]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "is_platform_empty", default)]
    pub platform: Option<PlatformMeta>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<CupNode>,
}

fn is_attrs_empty(a: &Option<Attributes>) -> bool {
    a.as_ref().map(Attributes::is_empty).unwrap_or(true)
}

fn is_platform_empty(p: &Option<PlatformMeta>) -> bool {
    p.as_ref().map(PlatformMeta::is_empty).unwrap_or(true)
}

impl CupNode {
    pub fn has_state(&self, s: State) -> bool {
        self.states.contains(&s)
    }

    pub fn has_meaningful_action(&self) -> bool {
        self.actions.iter().any(|a| *a != Action::Focus)
    }
}

/// `{w, h, scale?}` for the primary display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub w: i32,
    pub h: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// `{name?, pid?, bundleId?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// A WebMCP-style tool descriptor, passed through verbatim from the web
/// adapter when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The CUP envelope: `{version, platform, timestamp, screen, scope?, app?, tree, tools?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: String,
    pub platform: String,
    pub timestamp: i64,
    pub screen: ScreenInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppInfo>,
    pub tree: Vec<CupNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
}

pub const CUP_VERSION: &str = "0.1.0";

/// A window descriptor returned by `PlatformAdapter::get_all_windows`/
/// `get_foreground_window`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    pub handle: isize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub foreground: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `{nodes, max_depth, roles}` emitted alongside a captured tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureStats {
    pub nodes: usize,
    pub max_depth: usize,
    pub roles: std::collections::BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_from_str_round_trips() {
        for a in CANONICAL_ACTIONS {
            assert_eq!(Action::from_str(a.as_str()), Some(*a));
        }
    }

    #[test]
    fn action_from_str_rejects_unknown() {
        assert_eq!(Action::from_str("fly"), None);
    }

    #[test]
    fn node_serializes_camel_case_and_omits_empties() {
        let node = CupNode {
            id: "e0".into(),
            role: Role::Button,
            name: "Submit".into(),
            bounds: Some(Bounds { x: 100, y: 200, w: 80, h: 30 }),
            states: vec![State::Focused],
            actions: vec![Action::Click, Action::Focus],
            value: None,
            description: None,
            attributes: None,
            platform: None,
            children: vec![],
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"id\":\"e0\""));
        assert!(!json.contains("\"value\""));
        assert!(!json.contains("\"children\""));
    }
}
