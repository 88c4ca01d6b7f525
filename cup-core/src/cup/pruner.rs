//! Skip/hoist pruning rules and detail-level tree reduction.
//!
//! Grounded in `cup/format.py`'s `_should_skip`/`_should_hoist`/
//! `_prune_node`/`_prune_minimal_node`/`prune_tree`: a single preorder
//! pass, transitive hoisting (a hoisted node's children are themselves
//! re-evaluated against the node's own parent/sibling-count context), and
//! three detail levels. IDs are never reassigned by pruning.

use crate::cup::node::{CupNode, Role};

/// Pruning detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    Full,
    Standard,
    Minimal,
}

/// Count every node in a tree, including nested children.
pub fn count_nodes(nodes: &[CupNode]) -> usize {
    nodes
        .iter()
        .map(|n| 1 + count_nodes(&n.children))
        .sum()
}

fn should_skip(node: &CupNode, parent: Option<&CupNode>, siblings: usize) -> bool {
    // Offscreen nodes are skipped only if unnamed and actionless --
    // scrolled-away content with a name or an action is kept.
    if node.has_state(crate::cup::node::State::Offscreen) && node.name.is_empty() {
        if !node.has_meaningful_action() {
            return true;
        }
    }

    if node.role == Role::Img && node.name.is_empty() {
        return true;
    }

    if node.role == Role::Text && node.name.is_empty() {
        return true;
    }

    // Text that is the sole child of a named parent is a redundant label.
    if node.role == Role::Text {
        if let Some(p) = parent {
            if !p.name.is_empty() && siblings == 1 {
                return true;
            }
        }
    }

    false
}

fn should_hoist(node: &CupNode) -> bool {
    if node.role == Role::Generic && node.name.is_empty() {
        return true;
    }

    // Unnamed, actionless groups are structural wrappers (Pane->generic
    // already covers most of these on Windows; Group without a name and
    // without a meaningful action is the rest).
    if node.role == Role::Group && node.name.is_empty() && !node.has_meaningful_action() {
        return true;
    }

    false
}

/// Prune one node, returning zero or more nodes to replace it in its
/// parent's child list. Hoisted nodes vanish, their (pruned) children
/// splicing into their former position; skipped nodes drop with their
/// whole subtree; kept nodes recurse on their own children.
fn prune_node(node: &CupNode, parent: Option<&CupNode>, siblings: usize) -> Vec<CupNode> {
    if should_hoist(node) {
        let mut result = Vec::new();
        for child in &node.children {
            result.extend(prune_node(child, parent, node.children.len()));
        }
        return result;
    }

    if should_skip(node, parent, siblings) {
        return Vec::new();
    }

    let mut pruned_children = Vec::new();
    for child in &node.children {
        pruned_children.extend(prune_node(child, Some(node), node.children.len()));
    }

    let mut kept = node.clone();
    kept.children = pruned_children;
    vec![kept]
}

/// Minimal pruning: keep a node only if it (or a descendant) has a
/// meaningful action. Returns `None` when the entire subtree is
/// decorative -- an all-decorative tree prunes to an empty root list,
/// not the window root.
fn prune_minimal_node(node: &CupNode) -> Option<CupNode> {
    let kept_children: Vec<CupNode> = node
        .children
        .iter()
        .filter_map(prune_minimal_node)
        .collect();

    if node.has_meaningful_action() || !kept_children.is_empty() {
        let mut pruned = node.clone();
        pruned.children = kept_children;
        Some(pruned)
    } else {
        None
    }
}

/// Apply pruning to a captured tree, returning a new pruned tree. IDs are
/// preserved verbatim; `full` is a deep clone with no reduction at all.
pub fn prune_tree(tree: &[CupNode], detail: Detail) -> Vec<CupNode> {
    match detail {
        Detail::Full => tree.to_vec(),
        Detail::Minimal => tree.iter().filter_map(prune_minimal_node).collect(),
        Detail::Standard => {
            let mut result = Vec::new();
            for root in tree {
                result.extend(prune_node(root, None, tree.len()));
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cup::node::{Action, Bounds, State};

    fn leaf(id: &str, role: Role, name: &str) -> CupNode {
        CupNode {
            id: id.to_string(),
            role,
            name: name.to_string(),
            bounds: Some(Bounds { x: 0, y: 0, w: 10, h: 10 }),
            states: vec![],
            actions: vec![],
            value: None,
            description: None,
            attributes: None,
            platform: None,
            children: vec![],
        }
    }

    #[test]
    fn unnamed_generic_is_hoisted_not_dropped() {
        let child = leaf("e1", Role::Button, "OK");
        let mut wrapper = leaf("e0", Role::Generic, "");
        wrapper.children = vec![child];
        let pruned = prune_tree(&[wrapper], Detail::Standard);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, "e1");
    }

    #[test]
    fn unnamed_image_is_skipped() {
        let img = leaf("e0", Role::Img, "");
        assert!(prune_tree(&[img], Detail::Standard).is_empty());
    }

    #[test]
    fn redundant_text_label_is_skipped() {
        let text = leaf("e1", Role::Text, "Submit");
        let mut button = leaf("e0", Role::Button, "Submit");
        button.children = vec![text];
        let pruned = prune_tree(&[button], Detail::Standard);
        assert_eq!(pruned.len(), 1);
        assert!(pruned[0].children.is_empty());
    }

    #[test]
    fn standard_detail_preserves_offscreen_named_nodes() {
        let mut node = leaf("e0", Role::Button, "Load more");
        node.states.push(State::Offscreen);
        let pruned = prune_tree(&[node], Detail::Standard);
        assert_eq!(pruned.len(), 1);
    }

    #[test]
    fn minimal_detail_drops_all_decorative_tree_to_empty_root() {
        let decorative = leaf("e0", Role::Pane, "");
        assert!(prune_tree(&[decorative], Detail::Minimal).is_empty());
    }

    #[test]
    fn minimal_detail_keeps_ancestors_of_actionable_descendants() {
        let mut button = leaf("e1", Role::Button, "OK");
        button.actions = vec![Action::Click];
        let mut pane = leaf("e0", Role::Pane, "");
        pane.children = vec![button];
        let pruned = prune_tree(&[pane], Detail::Minimal);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].children.len(), 1);
    }

    #[test]
    fn full_detail_is_a_no_op() {
        let mut wrapper = leaf("e0", Role::Generic, "");
        wrapper.children = vec![leaf("e1", Role::Button, "OK")];
        let pruned = prune_tree(&[wrapper.clone()], Detail::Full);
        assert_eq!(pruned, vec![wrapper]);
    }

    #[test]
    fn pruning_never_reassigns_ids() {
        let mut button = leaf("e7", Role::Button, "OK");
        button.actions = vec![Action::Click];
        let pruned = prune_tree(&[button], Detail::Standard);
        assert_eq!(pruned[0].id, "e7");
    }

    #[test]
    fn pruning_is_idempotent_at_every_detail_level() {
        let mut button = leaf("e1", Role::Button, "OK");
        button.actions = vec![Action::Click];
        let text = leaf("e2", Role::Text, "");
        let mut wrapper = leaf("e0", Role::Generic, "");
        wrapper.children = vec![button, text];
        let tree = vec![wrapper];

        for detail in [Detail::Full, Detail::Standard, Detail::Minimal] {
            let once = prune_tree(&tree, detail);
            let twice = prune_tree(&once, detail);
            assert_eq!(once, twice, "prune_tree should be idempotent for {detail:?}");
        }
    }

    #[test]
    fn minimal_is_subset_of_standard_is_subset_of_full() {
        let mut button = leaf("e1", Role::Button, "OK");
        button.actions = vec![Action::Click];
        let text = leaf("e2", Role::Text, "");
        let mut root = leaf("e0", Role::Generic, "");
        root.children = vec![button, text];

        let full = count_nodes(&prune_tree(&[root.clone()], Detail::Full));
        let standard = count_nodes(&prune_tree(&[root.clone()], Detail::Standard));
        let minimal = count_nodes(&prune_tree(&[root], Detail::Minimal));
        assert!(minimal <= standard);
        assert!(standard <= full);
    }
}
