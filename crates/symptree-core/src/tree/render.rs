//! Plain-text outline of a built tree.

use super::builder::{DecisionTree, TreeNode};
use crate::models::branch_label;

/// Render the tree as an indented outline.
///
/// ```text
/// G01 [symptom]
///   yes: G02 [symptom]
///     yes: P01 [disease]
///     no: (undefined)
///   no: (undefined)
/// ```
pub fn render_outline(tree: &DecisionTree) -> String {
    render_outline_with(tree, |_| None)
}

/// Render the outline, appending the display name `names` returns for a code.
pub fn render_outline_with<F>(tree: &DecisionTree, names: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(root) = tree.root() else {
        return "(empty tree)".to_string();
    };

    let mut lines = Vec::new();
    render_node(root, None, 0, &names, &mut lines);
    lines.join("\n")
}

fn render_node<F>(
    node: &TreeNode,
    label: Option<&str>,
    depth: usize,
    names: &F,
    lines: &mut Vec<String>,
) where
    F: Fn(&str) -> Option<String>,
{
    let mut line = "  ".repeat(depth);
    if let Some(label) = label {
        line.push_str(label);
        line.push_str(": ");
    }
    line.push_str(&format!("{} [{}]", node.code(), node.node.node_type));
    if let Some(name) = names(node.code()) {
        line.push(' ');
        line.push_str(&name);
    }
    lines.push(line);

    for answer in [true, false] {
        match node.branch(answer) {
            Some(child) => render_node(child, Some(branch_label(answer)), depth + 1, names, lines),
            None if !node.node.is_terminal() => lines.push(format!(
                "{}{}: (undefined)",
                "  ".repeat(depth + 1),
                branch_label(answer)
            )),
            None => {}
        }
    }
}
