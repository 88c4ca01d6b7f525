//! Envelope assembly and the compact/overview text serializers.
//!
//! Grounded in `cup/format.py`'s `build_envelope`, `serialize_overview`,
//! and `serialize_compact`/`_format_line`/`_emit_compact`: exact line
//! grammar, truncation lengths, and header layout are reproduced here,
//! not reinvented.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cup::node::{AppInfo, CupNode, Envelope, ScreenInfo, ToolDescriptor, CUP_VERSION};
use crate::cup::pruner::{count_nodes, prune_tree, Detail};
use crate::cup::roles::is_value_serialization_role;
use crate::cup::WindowDescriptor;

/// Current unix-millisecond timestamp.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Wrap a captured tree in the CUP envelope, stamping version and
/// timestamp.
pub fn build_envelope(
    tree: Vec<CupNode>,
    platform: &str,
    scope: Option<String>,
    screen: ScreenInfo,
    app: Option<AppInfo>,
    tools: Option<Vec<ToolDescriptor>>,
) -> Envelope {
    Envelope {
        version: CUP_VERSION.to_string(),
        platform: platform.to_string(),
        timestamp: now_millis(),
        screen,
        scope,
        app,
        tree,
        tools,
    }
}

/// `scope=overview` payload: a window list with no tree walking and no
/// element IDs, for situational awareness only.
pub fn serialize_overview(windows: &[WindowDescriptor], platform: &str, screen: ScreenInfo) -> String {
    let mut lines = vec![
        format!("# CUP {} | {} | {}x{}", CUP_VERSION, platform, screen.w, screen.h),
        format!("# overview | {} windows", windows.len()),
        String::new(),
    ];

    for win in windows {
        let prefix = if win.foreground { "* " } else { "  " };
        let marker = if win.foreground { "[fg] " } else { "" };

        let mut parts = vec![format!("{prefix}{marker}{}", win.title)];
        if let Some(pid) = win.pid {
            parts.push(format!("(pid:{pid})"));
        }
        if let Some(b) = win.bounds {
            parts.push(format!("@{},{} {}x{}", b.x, b.y, b.w, b.h));
        }
        if let Some(ref url) = win.url {
            let truncated = truncate_with_ellipsis(url, 80);
            parts.push(format!("url:{truncated}"));
        }

        lines.push(parts.join(" "));
    }

    lines.join("\n") + "\n"
}

fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn escape_for_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}

/// Format one CUP node as a compact one-liner:
/// `[id] role "name" @x,y wxh {states} [actions] val="value"`.
fn format_line(node: &CupNode) -> String {
    let mut parts = vec![format!("[{}]", node.id), node.role.as_str().to_string()];

    if !node.name.is_empty() {
        let truncated = truncate_with_ellipsis(&node.name, 80);
        parts.push(format!("\"{}\"", escape_for_quotes(&truncated)));
    }

    if let Some(b) = node.bounds {
        parts.push(format!("@{},{} {}x{}", b.x, b.y, b.w, b.h));
    }

    if !node.states.is_empty() {
        let states: Vec<&str> = node.states.iter().map(|s| s.as_str()).collect();
        parts.push(format!("{{{}}}", states.join(",")));
    }

    let actions: Vec<&str> = node
        .actions
        .iter()
        .filter(|a| **a != crate::cup::node::Action::Focus)
        .map(|a| a.as_str())
        .collect();
    if !actions.is_empty() {
        parts.push(format!("[{}]", actions.join(",")));
    }

    if let Some(ref value) = node.value {
        if !value.is_empty() && is_value_serialization_role(node.role) {
            let truncated = truncate_with_ellipsis(value, 120);
            parts.push(format!("val=\"{}\"", escape_for_quotes(&truncated)));
        }
    }

    if let Some(ref attrs) = node.attributes {
        let mut attr_parts = Vec::new();
        if let Some(level) = attrs.level {
            attr_parts.push(format!("L{level}"));
        }
        if let Some(ref placeholder) = attrs.placeholder {
            let truncated = truncate_with_ellipsis(placeholder, 30);
            attr_parts.push(format!("ph=\"{}\"", escape_for_quotes(&truncated)));
        }
        if let Some(ref orientation) = attrs.orientation {
            attr_parts.push(orientation.chars().next().unwrap_or('?').to_string());
        }
        if attrs.value_min.is_some() || attrs.value_max.is_some() {
            let min = attrs.value_min.map(|v| format_range_bound(v)).unwrap_or_default();
            let max = attrs.value_max.map(|v| format_range_bound(v)).unwrap_or_default();
            attr_parts.push(format!("range={min}..{max}"));
        }
        if !attr_parts.is_empty() {
            parts.push(format!("({})", attr_parts.join(" ")));
        }
    }

    parts.join(" ")
}

/// Render a range bound the way Python's `f"{x}"` would for values that
/// happen to be integral, so `range=0..100` prints without a trailing
/// `.0` while a genuine fraction like `0.5` survives unchanged.
fn format_range_bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn emit_compact(node: &CupNode, depth: usize, lines: &mut Vec<String>, count: &mut usize) {
    *count += 1;
    let indent = "  ".repeat(depth);
    lines.push(format!("{indent}{}", format_line(node)));
    for child in &node.children {
        emit_compact(child, depth + 1, lines, count);
    }
}

/// Serialize a CUP envelope to compact LLM-friendly text. Applies
/// pruning first; IDs are preserved so agents can reference them in
/// subsequent `execute` calls. `window_list` additionally lists other
/// open windows for the `foreground` scope.
pub fn serialize_compact(
    envelope: &Envelope,
    window_list: Option<&[WindowDescriptor]>,
    detail: Detail,
) -> String {
    let total_before = count_nodes(&envelope.tree);
    let pruned = prune_tree(&envelope.tree, detail);

    let mut lines = Vec::new();
    let mut count = 0usize;
    for root in &pruned {
        emit_compact(root, 0, &mut lines, &mut count);
    }

    let mut header = vec![format!(
        "# CUP {} | {} | {}x{}",
        envelope.version, envelope.platform, envelope.screen.w, envelope.screen.h
    )];

    if let Some(ref app) = envelope.app {
        header.push(format!("# app: {}", app.name.clone().unwrap_or_default()));
    }

    header.push(format!("# {count} nodes ({total_before} before pruning)"));

    if let Some(ref tools) = envelope.tools {
        let n = tools.len();
        header.push(format!("# {n} WebMCP tool{} available", if n != 1 { "s" } else { "" }));
    }

    if let Some(windows) = window_list {
        if !windows.is_empty() {
            header.push(format!("# --- {} open windows ---", windows.len()));
            for win in windows {
                let title = truncate_with_ellipsis_no_suffix(&win.title, 50);
                let marker = if win.foreground { " [fg]" } else { "" };
                header.push(format!("#   {title}{marker}"));
            }
        }
    }

    header.push(String::new());

    (header.into_iter().chain(lines).collect::<Vec<_>>().join("\n")) + "\n"
}

fn truncate_with_ellipsis_no_suffix(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cup::node::{Action, Attributes, Bounds, Role, State};

    fn sample_node() -> CupNode {
        CupNode {
            id: "e3".into(),
            role: Role::Checkbox,
            name: "Remember me".into(),
            bounds: Some(Bounds { x: 10, y: 20, w: 100, h: 24 }),
            states: vec![State::Checked],
            actions: vec![Action::Toggle, Action::Focus],
            value: None,
            description: None,
            attributes: None,
            platform: None,
            children: vec![],
        }
    }

    #[test]
    fn format_line_matches_exact_grammar_with_states_and_actions() {
        let line = format_line(&sample_node());
        assert_eq!(
            line,
            "[e3] checkbox \"Remember me\" @10,20 100x24 {checked} [toggle]"
        );
    }

    #[test]
    fn format_line_drops_focus_from_action_list() {
        let line = format_line(&sample_node());
        assert!(!line.contains("focus"));
    }

    #[test]
    fn format_line_renders_value_only_for_value_roles() {
        let mut textbox = sample_node();
        textbox.role = Role::Textbox;
        textbox.value = Some("hunter2".into());
        assert!(format_line(&textbox).contains("val=\"hunter2\""));

        let mut checkbox = sample_node();
        checkbox.value = Some("ignored".into());
        assert!(!format_line(&checkbox).contains("val="));
    }

    #[test]
    fn format_line_renders_level_and_placeholder_attributes() {
        let mut heading = sample_node();
        heading.role = Role::Heading;
        heading.attributes = Some(Attributes {
            level: Some(2),
            placeholder: None,
            orientation: None,
            value_min: None,
            value_max: None,
        });
        assert!(format_line(&heading).ends_with("(L2)"));

        let mut textbox = sample_node();
        textbox.role = Role::Textbox;
        textbox.attributes = Some(Attributes {
            level: None,
            placeholder: Some("Search".into()),
            orientation: None,
            value_min: None,
            value_max: None,
        });
        assert!(format_line(&textbox).ends_with("(ph=\"Search\")"));
    }

    #[test]
    fn format_line_renders_range_attribute_without_trailing_zero() {
        let mut slider = sample_node();
        slider.role = Role::Slider;
        slider.attributes = Some(Attributes {
            level: None,
            placeholder: None,
            orientation: Some("horizontal".into()),
            value_min: Some(0.0),
            value_max: Some(100.0),
        });
        let line = format_line(&slider);
        assert!(line.ends_with("(h range=0..100)"));
    }

    #[test]
    fn serialize_compact_header_reports_pruned_and_total_counts() {
        let envelope = build_envelope(
            vec![sample_node()],
            "windows",
            None,
            ScreenInfo { w: 1920, h: 1080, scale: None },
            None,
            None,
        );
        let text = serialize_compact(&envelope, None, Detail::Standard);
        assert!(text.starts_with("# CUP 0.1.0 | windows | 1920x1080"));
        assert!(text.contains("1 nodes (1 before pruning)"));
    }

    #[test]
    fn serialize_overview_marks_foreground_window() {
        let win = WindowDescriptor {
            handle: 1,
            title: "Notepad".into(),
            pid: Some(42),
            bundle_id: None,
            bounds: None,
            foreground: true,
            url: None,
        };
        let text = serialize_overview(&[win], "windows", ScreenInfo { w: 1920, h: 1080, scale: None });
        assert!(text.contains("* [fg] Notepad (pid:42)"));
    }
}
