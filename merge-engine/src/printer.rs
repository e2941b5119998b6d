//! Serialization of merged trees back to source text.
//!
//! Parsing loses the original byte layout between declarations, so the
//! printer re-emits the tree with canonical indentation: four spaces per
//! nesting level, each member body stripped of its common leading whitespace
//! and re-indented, one blank line between members. Terminals whose body was
//! emptied (renamed away, deleted) vanish together with their prefix.

use crate::tree::{NodeArena, NodeId, NodeKind};

const INDENT: &str = "    ";

/// Serializes the tree rooted at `root`.
pub fn print_tree(arena: &NodeArena, root: NodeId) -> String {
    let mut out = String::new();
    print_node(arena, root, 0, &mut out);
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Serializes a single subtree, used by handlers that need the surviving
/// body of a node as conflict content.
pub fn print_subtree(arena: &NodeArena, node: NodeId) -> String {
    let mut out = String::new();
    print_node(arena, node, 0, &mut out);
    out.trim_end().to_string()
}

fn print_node(arena: &NodeArena, id: NodeId, depth: usize, out: &mut String) {
    match &arena.node(id).kind {
        NodeKind::Terminal { body, prefix, .. } => {
            if body.trim().is_empty() && prefix.trim().is_empty() {
                return;
            }
            let indent = INDENT.repeat(depth);
            if !prefix.trim().is_empty() {
                for line in prefix.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        out.push_str(&indent);
                        out.push_str(line);
                    }
                    out.push('\n');
                }
            }
            if !body.trim().is_empty() {
                out.push_str(&reindent(body.trim_end(), &indent));
                out.push('\n');
            }
        }
        NodeKind::NonTerminal { children } => {
            if arena.node(id).node_type == "CompilationUnit" {
                let mut unit = String::new();
                for &child in children {
                    let mut piece = String::new();
                    print_node(arena, child, depth, &mut piece);
                    if !piece.is_empty() {
                        if !unit.is_empty() {
                            unit.push('\n');
                        }
                        unit.push_str(&piece);
                    }
                }
                out.push_str(&unit);
                return;
            }

            // A type declaration: header at this depth, members nested with
            // a blank line in between, and the closing brace restored.
            let before_header = out.len();
            for &child in children {
                if arena.node(child).node_type == "TypeHeader" {
                    print_node(arena, child, depth, out);
                    break;
                }
            }
            let header_printed = out.len() > before_header;

            let mut members = String::new();
            for &child in children {
                if arena.node(child).node_type == "TypeHeader" {
                    continue;
                }
                let mut piece = String::new();
                print_node(arena, child, depth + 1, &mut piece);
                if !piece.is_empty() {
                    if !members.is_empty() {
                        members.push('\n');
                    }
                    members.push_str(&piece);
                }
            }

            if !header_printed && members.is_empty() {
                return;
            }
            out.push_str(&members);
            if header_printed {
                out.push_str(&INDENT.repeat(depth));
                out.push_str("}\n");
            }
        }
    }
}

/// Re-indents a body: the common leading whitespace of its continuation
/// lines is replaced by the target indentation.
fn reindent(body: &str, indent: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let common = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim().is_empty() {
            continue;
        }
        let leading = line.len() - line.trim_start().len();
        let stripped = if i == 0 {
            line.trim_start()
        } else {
            &line[common.min(leading)..]
        };
        out.push_str(indent);
        out.push_str(stripped);
    }
    out
}
