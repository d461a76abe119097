// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use super::ids::{NodeId, PropertyName, TypeTag};
use super::value::Value;

pub(crate) type ChildIds = SmallVec<[NodeId; 4]>;

/// One element of the graph.
///
/// The parent link is a plain id: nodes are owned by the [`Graph`](super::Graph) arena, so the
/// back-reference never keeps anything alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    type_tag: TypeTag,
    parent: Option<NodeId>,
    children: ChildIds,
    properties: BTreeMap<PropertyName, Value>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        type_tag: TypeTag,
        parent: Option<NodeId>,
        properties: BTreeMap<PropertyName, Value>,
    ) -> Self {
        Self { id, type_tag, parent, children: ChildIds::new(), properties }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn properties(&self) -> &BTreeMap<PropertyName, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut ChildIds {
        &mut self.children
    }

    /// Stores `value` (clearing the entry for `Null`) and returns the previous value.
    pub(crate) fn replace_property(&mut self, name: PropertyName, value: Value) -> Value {
        let previous = if value.is_null() {
            self.properties.remove(&name)
        } else {
            self.properties.insert(name, value)
        };
        previous.unwrap_or_default()
    }
}

/// A node and its descendants, detached from any graph.
///
/// Used to insert whole subtrees, to describe removed subtrees in notifications, and to compare
/// graphs structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    pub id: NodeId,
    pub type_tag: TypeTag,
    pub properties: BTreeMap<PropertyName, Value>,
    pub children: Vec<Subtree>,
}

impl Subtree {
    pub fn new(id: NodeId, type_tag: impl Into<TypeTag>) -> Self {
        Self { id, type_tag: type_tag.into(), properties: BTreeMap::new(), children: Vec::new() }
    }

    pub fn with_property(mut self, name: impl Into<PropertyName>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.properties.insert(name.into(), value);
        }
        self
    }

    pub fn with_child(mut self, child: Subtree) -> Self {
        self.children.push(child);
        self
    }

    /// Ids of this node and all descendants, pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Rewrites every occurrence of `old` (node ids and references) to `new`.
    pub(crate) fn rename(&mut self, old: &NodeId, new: &NodeId) {
        if &self.id == old {
            self.id = new.clone();
        }
        for value in self.properties.values_mut() {
            rename_reference(value, old, new);
        }
        for child in &mut self.children {
            child.rename(old, new);
        }
    }
}

pub(crate) fn rename_reference(value: &mut Value, old: &NodeId, new: &NodeId) {
    match value {
        Value::Reference(id) if id == old => *id = new.clone(),
        Value::List(items) => {
            for item in items {
                rename_reference(item, old, new);
            }
        }
        _ => {}
    }
}
