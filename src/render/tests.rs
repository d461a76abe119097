// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;

use super::{render_tree, truncate_with_ellipsis, RenderOptions};
use crate::model::fixtures::{nid, small_tree};
use crate::model::{Subtree, Value};

#[test]
fn trees_render_with_guides() {
    let mut graph = small_tree();
    graph
        .insert_subtree(&nid("root"), 0, Subtree::new(nid("f1"), "Folder"))
        .expect("folder");
    let text = render_tree(&graph, &RenderOptions { show_properties: false, max_value_len: 0 });
    let expected = [
        "Workspace root",
        "├─ Table t1",
        "│  ├─ Column c1",
        "│  └─ Column c2",
        "└─ Folder f1",
        "",
    ]
    .join("\n");
    assert_eq!(text, expected);
}

#[test]
fn properties_follow_the_node() {
    let text = render_tree(&small_tree(), &RenderOptions::default());
    assert!(text.contains("Table t1  name=\"People\"\n"));
    assert!(text.contains("Column c2  name=\"Age\"\n"));
}

#[test]
fn long_values_are_truncated() {
    let mut graph = small_tree();
    graph
        .set_property(&nid("c1"), "description", Value::from("a".repeat(50)))
        .expect("set");
    let text = render_tree(&graph, &RenderOptions { show_properties: true, max_value_len: 8 });
    assert!(text.contains("description=\"aaaaaa…"));
}

#[rstest]
#[case("abc", 0, "abc")]
#[case("abc", 3, "abc")]
#[case("abcdef", 4, "abc…")]
#[case("abcdef", 1, "…")]
#[case("ääää", 3, "ää…")]
fn truncation_counts_chars(#[case] text: &str, #[case] max: usize, #[case] expected: &str) {
    assert_eq!(truncate_with_ellipsis(text, max), expected);
}
