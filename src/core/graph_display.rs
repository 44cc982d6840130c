// src/core/graph_display.rs

use crate::models::{CommandNode, PredicateSpec};

/// Renders the command list as an ASCII tree, one line per node.
///
/// Top-level commands are printed as `- name`; nested nodes hang below their parent,
/// labelled with the branch (`then` / `else`) they belong to.
pub fn render_command_tree(commands: &[CommandNode]) -> Vec<String> {
    let mut lines = Vec::new();
    for command in commands {
        lines.push(format!("- {}{}", command.name, when_suffix(command.when.as_ref())));
        push_children(command, "  ", &mut lines);
    }
    lines
}

fn when_suffix(when: Option<&PredicateSpec>) -> String {
    let Some(when) = when else {
        return String::new();
    };
    let op = when.op.as_deref().unwrap_or("eq");
    if op.eq_ignore_ascii_case("exists") {
        format!("  [when {} exists]", when.query)
    } else {
        format!("  [when {} {} '{}']", when.query, op, when.value)
    }
}

fn push_children(node: &CommandNode, prefix: &str, lines: &mut Vec<String>) {
    let children: Vec<(&str, &CommandNode)> = node
        .on_true
        .iter()
        .map(|c| ("then", c))
        .chain(node.on_false.iter().map(|c| ("else", c)))
        .collect();

    for (i, (branch, child)) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        print_node(branch, child, prefix, is_last, lines);
    }
}

/// Recursive helper that renders a node and its descendants.
fn print_node(branch: &str, node: &CommandNode, prefix: &str, is_last: bool, lines: &mut Vec<String>) {
    let connector = if is_last { "└─" } else { "├─" };
    lines.push(format!(
        "{}{} {}: {}{}",
        prefix,
        connector,
        branch,
        node.name,
        when_suffix(node.when.as_ref())
    ));

    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    push_children(node, &child_prefix, lines);
}
