//! Java source parsing via tree-sitter.
//!
//! The engine consumes trees at declaration granularity: classes and other
//! type declarations become non-terminals, members (methods, constructors,
//! fields, initializer blocks) become terminals carrying their raw source
//! text. tree-sitter-java provides the concrete syntax; this adapter decides
//! each node's merge identity:
//!
//! - methods and constructors are named by signature, `name(ParamType,…)`,
//!   so an overload never collides with its siblings;
//! - fields are named by their normalized declaration text — two sides
//!   adding `int k = 0;` verbatim match, while different initializers stay
//!   apart for the duplicated-declaration handler to arbitrate;
//! - initializer blocks share the fixed names `static`/`instance`, which is
//!   what the initialization-block handlers straighten out afterwards.

use std::path::Path;

use tree_sitter::{Node as TsNode, Parser};

use crate::config::MergeConfig;
use crate::error::ParseError;
use crate::files::{normalized_single_line, read_file_content};
use crate::tree::{MergingMechanism, NodeArena, NodeId};

/// Parses a Java file into a tree allocated in `arena`.
pub fn parse_file(
    arena: &mut NodeArena,
    path: &Path,
    cfg: &MergeConfig,
) -> Result<NodeId, ParseError> {
    if !path.exists() {
        return Err(ParseError::MissingFile(path.to_path_buf()));
    }
    if !cfg.is_git && !is_java_file(path) {
        return Err(ParseError::NotJavaFile(path.to_path_buf()));
    }
    if !cfg.is_git {
        tracing::info!(path = %path.display(), "parsing");
    }
    let source = read_file_content(path)?;
    parse_source(arena, &source, path)
}

fn is_java_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_lowercase().contains(".java"))
}

/// Parses Java source text into a tree allocated in `arena`. `path` is only
/// used for error reporting.
pub fn parse_source(
    arena: &mut NodeArena,
    source: &str,
    path: &Path,
) -> Result<NodeId, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| ParseError::Language(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Syntax(path.to_path_buf()))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseError::Syntax(path.to_path_buf()));
    }

    let unit = arena.new_non_terminal("CompilationUnit", "");
    let mut cursor = root.walk();
    let mut anchor = 0usize;
    for child in root.children(&mut cursor) {
        match child.kind() {
            "line_comment" | "block_comment" => {
                // Stays inside the span picked up as the next node's prefix.
            }
            "package_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &child);
                let body = text(source, &child);
                let terminal = arena.new_terminal(
                    "PackageDecl",
                    "",
                    body,
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(unit, terminal);
            }
            "import_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &child);
                let body = text(source, &child);
                let name = normalized_single_line(&body);
                let terminal =
                    arena.new_terminal("ImportDecl", name, body, prefix, MergingMechanism::Default);
                arena.add_child(unit, terminal);
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &child);
                let decl = build_type_declaration(arena, source, &child);
                attach_prefix(arena, decl, prefix);
                arena.add_child(unit, decl);
            }
            _ => {
                anchor = child.end_byte();
            }
        }
    }
    Ok(unit)
}

/// Source span between the previous sibling and `node`, kept as the node's
/// special token prefix when it holds a comment.
fn take_prefix(source: &str, anchor: &mut usize, node: &TsNode) -> String {
    let start = node.start_byte();
    let span = if *anchor <= start {
        &source[*anchor..start]
    } else {
        ""
    };
    *anchor = node.end_byte();
    if span.trim().is_empty() {
        String::new()
    } else {
        span.trim_matches('\n').trim_end().to_string()
    }
}

fn attach_prefix(arena: &mut NodeArena, decl: NodeId, prefix: String) {
    if prefix.is_empty() {
        return;
    }
    // Non-terminals carry no prefix of their own; hang it on the header.
    if let Some(&header) = arena.children(decl).first() {
        arena.set_prefix(header, prefix);
    }
}

fn text(source: &str, node: &TsNode) -> String {
    source[node.start_byte()..node.end_byte()].to_string()
}

fn build_type_declaration(arena: &mut NodeArena, source: &str, node: &TsNode) -> NodeId {
    let node_type = match node.kind() {
        "interface_declaration" => "InterfaceDecl",
        "enum_declaration" => "EnumDecl",
        "annotation_type_declaration" => "AnnotationDecl",
        _ => "ClassDecl",
    };
    let name = node
        .child_by_field_name("name")
        .map(|n| text(source, &n))
        .unwrap_or_default();
    let decl = arena.new_non_terminal(node_type, name.clone());

    let Some(body) = node.child_by_field_name("body") else {
        // Bodyless declarations degenerate to a header-only shell.
        let header = arena.new_terminal(
            "TypeHeader",
            name,
            text(source, node),
            "",
            MergingMechanism::ConflictMerge,
        );
        arena.add_child(decl, header);
        return decl;
    };

    // Header runs from the declaration start through the opening brace.
    let header_end = body.start_byte() + 1;
    let header_text = source[node.start_byte()..header_end].to_string();
    let header = arena.new_terminal(
        "TypeHeader",
        name,
        header_text,
        "",
        MergingMechanism::ConflictMerge,
    );
    arena.add_child(decl, header);

    build_members(arena, source, &body, decl, header_end);
    decl
}

fn build_members(
    arena: &mut NodeArena,
    source: &str,
    body: &TsNode,
    decl: NodeId,
    mut anchor: usize,
) {
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "line_comment" | "block_comment" => {}
            "method_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let signature = callable_signature(source, &member);
                let terminal = arena.new_terminal(
                    "MethodDecl",
                    signature,
                    text(source, &member),
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "constructor_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let signature = callable_signature(source, &member);
                let terminal = arena.new_terminal(
                    "ConstructorDecl",
                    signature,
                    text(source, &member),
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "field_declaration" | "constant_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let body_text = text(source, &member);
                let name = normalized_single_line(&body_text);
                let terminal = arena.new_terminal(
                    "FieldDecl",
                    name,
                    body_text,
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "enum_constant" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let name = member
                    .child_by_field_name("name")
                    .map(|n| text(source, &n))
                    .unwrap_or_else(|| normalized_single_line(&text(source, &member)));
                let terminal = arena.new_terminal(
                    "EnumConstantDecl",
                    name,
                    text(source, &member),
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "static_initializer" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let terminal = arena.new_terminal(
                    "InitializerBlock",
                    "static",
                    text(source, &member),
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "block" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let terminal = arena.new_terminal(
                    "InitializerBlock",
                    "instance",
                    text(source, &member),
                    prefix,
                    MergingMechanism::ConflictMerge,
                );
                arena.add_child(decl, terminal);
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration" => {
                let prefix = take_prefix(source, &mut anchor, &member);
                let nested = build_type_declaration(arena, source, &member);
                attach_prefix(arena, nested, prefix);
                arena.add_child(decl, nested);
            }
            "enum_body_declarations" => {
                build_members(arena, source, &member, decl, member.start_byte() + 1);
                anchor = member.end_byte();
            }
            kind if member.is_named() => {
                // Unfamiliar member shapes are kept as identity-matched
                // leaves so they survive the merge verbatim.
                tracing::debug!(kind, "keeping unclassified member as a plain leaf");
                let prefix = take_prefix(source, &mut anchor, &member);
                let body_text = text(source, &member);
                let name = normalized_single_line(&body_text);
                let terminal =
                    arena.new_terminal(kind, name, body_text, prefix, MergingMechanism::Default);
                arena.add_child(decl, terminal);
            }
            _ => {
                anchor = member.end_byte();
            }
        }
    }
}

/// `name(ParamType,…)` — the merge identity of a method or constructor.
fn callable_signature(source: &str, node: &TsNode) -> String {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(source, &n))
        .unwrap_or_default();
    let mut param_types = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if matches!(param.kind(), "formal_parameter" | "spread_parameter") {
                if let Some(ty) = param.child_by_field_name("type") {
                    param_types.push(normalized_single_line(&text(source, &ty)));
                }
            }
        }
    }
    format!("{}({})", name, param_types.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str) -> (NodeArena, NodeId) {
        let mut arena = NodeArena::new();
        let root = parse_source(&mut arena, source, &PathBuf::from("Test.java")).unwrap();
        (arena, root)
    }

    #[test]
    fn parses_class_with_members() {
        let (arena, root) = parse(
            "package p;\n\nimport java.util.List;\n\npublic class A {\n    int k = 0;\n\n    void m(int x) {\n        use(x);\n    }\n}\n",
        );
        let names: Vec<(&str, &str)> = arena
            .children(root)
            .iter()
            .map(|&c| {
                let n = arena.node(c);
                (n.node_type.as_str(), n.name.as_str())
            })
            .collect();
        assert_eq!(names[0], ("PackageDecl", ""));
        assert_eq!(names[1].0, "ImportDecl");
        assert_eq!(names[2], ("ClassDecl", "A"));

        let class = arena.children(root)[2];
        let members: Vec<(&str, &str)> = arena
            .children(class)
            .iter()
            .map(|&c| {
                let n = arena.node(c);
                (n.node_type.as_str(), n.name.as_str())
            })
            .collect();
        assert_eq!(members[0], ("TypeHeader", "A"));
        assert_eq!(members[1], ("FieldDecl", "intk=0;"));
        assert_eq!(members[2], ("MethodDecl", "m(int)"));
    }

    #[test]
    fn method_signature_uses_parameter_types() {
        let (arena, root) = parse("class A { void m(int a, String b) {} void m(long a) {} }");
        let class = arena.children(root)[0];
        let sigs: Vec<&str> = arena
            .children(class)
            .iter()
            .filter(|&&c| arena.node(c).node_type == "MethodDecl")
            .map(|&c| arena.node(c).name.as_str())
            .collect();
        assert_eq!(sigs, vec!["m(int,String)", "m(long)"]);
    }

    #[test]
    fn header_includes_opening_brace() {
        let (arena, root) = parse("class A extends B {\n}\n");
        let class = arena.children(root)[0];
        let header = arena.children(class)[0];
        assert_eq!(arena.body(header), "class A extends B {");
    }

    #[test]
    fn initializer_blocks_get_fixed_names() {
        let (arena, root) = parse("class A {\n    static { setup(); }\n    { init(); }\n}");
        let class = arena.children(root)[0];
        let blocks: Vec<&str> = arena
            .children(class)
            .iter()
            .filter(|&&c| arena.node(c).node_type == "InitializerBlock")
            .map(|&c| arena.node(c).name.as_str())
            .collect();
        assert_eq!(blocks, vec!["static", "instance"]);
    }

    #[test]
    fn leading_comment_becomes_member_prefix() {
        let (arena, root) = parse("class A {\n    // counts things\n    int k = 0;\n}");
        let class = arena.children(root)[0];
        let field = arena.children(class)[1];
        assert!(arena.prefix(field).contains("// counts things"));
    }

    #[test]
    fn nested_classes_become_nested_non_terminals() {
        let (arena, root) = parse("class A { class B { void m() {} } }");
        let outer = arena.children(root)[0];
        let inner = arena
            .children(outer)
            .iter()
            .copied()
            .find(|&c| arena.node(c).node_type == "ClassDecl")
            .unwrap();
        assert_eq!(arena.node(inner).name, "B");
        assert_eq!(arena.children(inner).len(), 2); // header + method
    }

    #[test]
    fn rejects_broken_source() {
        let mut arena = NodeArena::new();
        let result = parse_source(&mut arena, "class A { void m( }", &PathBuf::from("T.java"));
        assert!(matches!(result, Err(ParseError::Syntax(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let mut arena = NodeArena::new();
        let cfg = MergeConfig::default();
        let result = parse_file(&mut arena, &PathBuf::from("/no/such/File.java"), &cfg);
        assert!(matches!(result, Err(ParseError::MissingFile(_))));
    }
}
