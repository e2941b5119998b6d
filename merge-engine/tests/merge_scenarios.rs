//! End-to-end merge scenarios over real Java sources.

use indoc::indoc;
use ssmerge_engine::files::{extract_merge_conflicts, has_conflict_markers};
use ssmerge_engine::superimposer::{SEMANTIC_MARKER, SEPARATOR};
use ssmerge_engine::{
    semistructured_merge, semistructured_merge_sources, three_way_textual_merge, MergeConfig,
    StrategyKind,
};

fn merge(left: &str, base: &str, right: &str, cfg: &MergeConfig) -> String {
    let merged = semistructured_merge_sources(left, base, right, cfg).unwrap();
    assert!(
        !merged.contains(SEMANTIC_MARKER) && !merged.contains(SEPARATOR),
        "internal sentinels leaked into the output:\n{merged}"
    );
    merged
}

const BASE: &str = indoc! {"
    package app;

    public class A {
        int counter = 0;

        void m() {
            x();
        }
    }
"};

#[test]
fn identity_merge_is_stable() {
    let cfg = MergeConfig::default();
    let once = merge(BASE, BASE, BASE, &cfg);
    let twice = merge(&once, &once, &once, &cfg);
    assert_eq!(once, twice);
    assert!(once.contains("int counter = 0;"));
    assert!(once.contains("void m() {"));
}

#[test]
fn merge_is_deterministic() {
    let cfg = MergeConfig::default();
    let left = BASE.replace("x();", "x(); y();");
    let right = BASE.replace("int counter = 0;", "int counter = 1;");
    let first = merge(&left, BASE, &right, &cfg);
    let second = merge(&left, BASE, &right, &cfg);
    assert_eq!(first, second);
}

#[test]
fn one_sided_edits_always_win() {
    let cfg = MergeConfig::default();
    let edited = BASE.replace("x();", "x();\n        added();");
    let from_left = merge(&edited, BASE, BASE, &cfg);
    assert!(from_left.contains("added();"));
    let from_right = merge(BASE, BASE, &edited, &cfg);
    assert!(from_right.contains("added();"));
}

#[test]
fn independent_edits_to_different_methods_merge_cleanly() {
    let cfg = MergeConfig::default();
    let base = indoc! {"
        class A {
            void one() {
                a();
            }

            void two() {
                b();
            }
        }
    "};
    let left = base.replace("a();", "a();\n        aMore();");
    let right = base.replace("b();", "b();\n        bMore();");
    let merged = merge(&left, base, &right, &cfg);
    assert!(merged.contains("aMore();"));
    assert!(merged.contains("bMore();"));
    assert!(!has_conflict_markers(&merged));
}

// Same parameter of the same call edited on both sides.
#[test]
fn same_parameter_edit_conflicts_under_diff3() {
    let cfg = MergeConfig::default();
    let base = BASE.replace("x();", "f(1, 2);");
    let left = BASE.replace("x();", "f(10, 2);");
    let right = BASE.replace("x();", "f(1, 20);");
    let merged = merge(&left, &base, &right, &cfg);
    let conflicts = extract_merge_conflicts(&merged);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].left.contains("f(10, 2);"));
    assert!(conflicts[0].right.contains("f(1, 20);"));
}

#[test]
fn same_call_edits_merge_under_csdiff() {
    let cfg = MergeConfig {
        strategy: StrategyKind::CsDiffAndDiff3,
        ..MergeConfig::default()
    };
    let base = BASE.replace("x();", "f(1, 2);");
    let left = BASE.replace("x();", "f(10, 2);");
    let right = BASE.replace("x();", "f(1, 20);");
    let merged = merge(&left, &base, &right, &cfg);
    assert!(merged.contains("f(10, 20);"));
    assert!(!has_conflict_markers(&merged));
}

// Different arguments of the same call edited independently.
#[test]
fn different_argument_edits_merge_under_csdiff() {
    let cfg = MergeConfig {
        strategy: StrategyKind::CsDiffAndDiff3,
        ..MergeConfig::default()
    };
    let base = BASE.replace("x();", "g(a, b);");
    let left = BASE.replace("x();", "g(A, b);");
    let right = BASE.replace("x();", "g(a, B);");
    let merged = merge(&left, &base, &right, &cfg);
    assert!(merged.contains("g(A, B);"));
    assert!(!has_conflict_markers(&merged));
}

// A method renamed on one side and edited on the other.
#[test]
fn safe_renaming_carries_edits_into_the_new_name() {
    let cfg = MergeConfig::default();
    let left = BASE.replace("void m()", "void renamed()");
    let right = BASE.replace("x();", "x();\n        y();");
    let merged = merge(&left, BASE, &right, &cfg);
    assert!(merged.contains("void renamed() {"));
    assert!(merged.contains("y();"));
    assert!(!merged.contains("void m()"));
    assert!(!has_conflict_markers(&merged));
}

#[test]
fn renaming_without_the_handler_leaves_a_conflict() {
    let cfg = MergeConfig {
        method_and_constructor_renaming_and_deletion_handler: false,
        ..MergeConfig::default()
    };
    let left = BASE.replace("void m()", "void renamed()");
    let right = BASE.replace("x();", "x();\n        y();");
    let merged = merge(&left, BASE, &right, &cfg);
    assert!(merged.contains("void renamed()"));
    assert!(has_conflict_markers(&merged));
}

// A method deleted on one side, referenced by a new method on
// the other.
#[test]
fn new_method_referencing_deleted_one_conflicts() {
    let cfg = MergeConfig::default();
    let left = indoc! {"
        package app;

        public class A {
            int counter = 0;
        }
    "};
    let right = BASE.replace(
        "void m() {\n        x();\n    }",
        "void m() {\n        x();\n    }\n\n    void n() {\n        m();\n    }",
    );
    let merged = merge(left, BASE, &right, &cfg);
    let conflicts = extract_merge_conflicts(&merged);
    assert!(!conflicts.is_empty());
    assert!(conflicts
        .iter()
        .any(|c| c.left.contains("m()") || c.right.contains("n()")));
}

#[test]
fn silent_acceptance_without_the_new_element_handler() {
    let cfg = MergeConfig {
        new_element_referencing_edited_one_handler: false,
        ..MergeConfig::default()
    };
    let left = indoc! {"
        package app;

        public class A {
            int counter = 0;
        }
    "};
    let right = BASE.replace(
        "void m() {\n        x();\n    }",
        "void m() {\n        x();\n    }\n\n    void n() {\n        m();\n    }",
    );
    let merged = merge(left, BASE, &right, &cfg);
    assert!(merged.contains("void n() {"));
    assert!(!has_conflict_markers(&merged));
}

// Both sides add an identical field.
#[test]
fn identical_field_additions_collapse() {
    let cfg = MergeConfig::default();
    let base = indoc! {"
        class A {
        }
    "};
    let added = indoc! {"
        class A {
            int k = 0;
        }
    "};
    let merged = merge(added, base, added, &cfg);
    assert_eq!(merged.matches("int k = 0;").count(), 1);
    assert!(!has_conflict_markers(&merged));
}

#[test]
fn same_variable_different_initializers_conflict() {
    let cfg = MergeConfig::default();
    let base = "class A {\n}\n";
    let left = "class A {\n    int k = 0;\n}\n";
    let right = "class A {\n    int k = 1;\n}\n";
    let merged = merge(left, base, right, &cfg);
    let conflicts = extract_merge_conflicts(&merged);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].left.contains("int k = 0;"));
    assert!(conflicts[0].right.contains("int k = 1;"));
}

#[test]
fn colliding_import_additions_conflict() {
    let cfg = MergeConfig::default();
    let base = "package app;\n\nclass A {\n}\n";
    let left = "package app;\n\nimport x.util.Pair;\n\nclass A {\n}\n";
    let right = "package app;\n\nimport y.tuples.Pair;\n\nclass A {\n}\n";
    let merged = merge(left, base, right, &cfg);
    let conflicts = extract_merge_conflicts(&merged);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].left.contains("x.util.Pair"));
    assert!(conflicts[0].right.contains("y.tuples.Pair"));
}

#[test]
fn mine_and_yours_swap_under_argument_swap() {
    let cfg = MergeConfig::default();
    let base = BASE.replace("x();", "f(1, 2);");
    let left = BASE.replace("x();", "f(10, 2);");
    let right = BASE.replace("x();", "f(1, 20);");
    let forward = merge(&left, &base, &right, &cfg);
    let backward = merge(&right, &base, &left, &cfg);
    let fwd = extract_merge_conflicts(&forward);
    let bwd = extract_merge_conflicts(&backward);
    assert_eq!(fwd.len(), 1);
    assert_eq!(bwd.len(), 1);
    assert_eq!(fwd[0].left, bwd[0].right);
    assert_eq!(fwd[0].right, bwd[0].left);
}

#[test]
fn show_base_adds_the_base_section_to_conflicts() {
    let cfg = MergeConfig {
        show_base: true,
        ..MergeConfig::default()
    };
    let base = BASE.replace("x();", "f(1, 2);");
    let left = BASE.replace("x();", "f(10, 2);");
    let right = BASE.replace("x();", "f(1, 20);");
    let merged = merge(&left, &base, &right, &cfg);
    let conflicts = extract_merge_conflicts(&merged);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].base.contains("f(1, 2);"));
}

#[test]
fn comments_ride_along_with_their_declaration() {
    let cfg = MergeConfig::default();
    let commented = BASE.replace("void m()", "// entry point\n    void m()");
    let merged = merge(&commented, &commented, &commented, &cfg);
    assert!(merged.contains("// entry point"));
}

#[test]
fn file_based_merge_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    };
    let left = write("Left.java", &BASE.replace("x();", "x();\n        y();"));
    let base = write("Base.java", BASE);
    let right = write("Right.java", BASE);

    let cfg = MergeConfig::default();
    let merged = semistructured_merge(&left, &base, &right, &cfg).unwrap();
    assert!(merged.contains("y();"));
    assert!(!has_conflict_markers(&merged));
}

#[test]
fn textual_merge_treats_missing_files_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("Base.java");
    let right = dir.path().join("Right.java");
    std::fs::write(&base, "class A {\n}\n").unwrap();
    std::fs::write(&right, "class A {\n}\n").unwrap();

    let merged =
        three_way_textual_merge(&dir.path().join("gone"), &base, &right, true).unwrap();
    assert_eq!(merged, "");
}
