// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Plain-text dump of a graph, one node per line with Unicode tree guides.

use std::fmt::Write as _;

use crate::model::{Graph, Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_properties: bool,
    /// Longer property values are cut with an ellipsis. `0` disables truncation.
    pub max_value_len: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { show_properties: true, max_value_len: 40 }
    }
}

pub fn render_tree(graph: &Graph, options: &RenderOptions) -> String {
    let mut out = String::new();
    let root = graph.root();
    write_node(&mut out, root, options);
    write_children(&mut out, graph, root.children(), "", options);
    out
}

fn write_children(
    out: &mut String,
    graph: &Graph,
    children: &[NodeId],
    prefix: &str,
    options: &RenderOptions,
) {
    for (idx, id) in children.iter().enumerate() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        let last = idx + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└─ " } else { "├─ " });
        write_node(out, node, options);

        let nested = format!("{prefix}{}", if last { "   " } else { "│  " });
        write_children(out, graph, node.children(), &nested, options);
    }
}

fn write_node(out: &mut String, node: &Node, options: &RenderOptions) {
    let _ = write!(out, "{} {}", node.type_tag(), node.id());
    if options.show_properties {
        for (name, value) in node.properties() {
            let text = truncate_with_ellipsis(&value.to_string(), options.max_value_len);
            let _ = write!(out, "  {name}={text}");
        }
    }
    out.push('\n');
}

pub(crate) fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 || text.chars().count() <= max_len {
        return text.to_owned();
    }
    if max_len == 1 {
        return "…".to_owned();
    }
    let mut out: String = text.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests;
