// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use super::event::{GraphEvent, GraphListener};
use super::ids::{NodeId, PropertyName, TypeTag};
use super::node::{rename_reference, Node, Subtree};
use super::value::Value;

/// Resolves node ids for cross-reference conversion.
pub trait NodeLookup {
    fn contains_node(&self, id: &NodeId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node not found (id={node_id})")]
    NodeNotFound { node_id: NodeId },
    #[error("node id already in use (id={node_id})")]
    DuplicateId { node_id: NodeId },
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node ids may only change while loading (id={node_id})")]
    IdChangeOutsideLoading { node_id: NodeId },
}

impl GraphError {
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::NodeNotFound { node_id }
            | Self::DuplicateId { node_id }
            | Self::IdChangeOutsideLoading { node_id } => node_id,
            Self::NotAChild { child, .. } => child,
        }
    }
}

/// A subtree taken out of the graph, with where it used to sit.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// Index among same-typed siblings.
    pub index: usize,
    /// Position among all children of the parent.
    pub position: usize,
    pub subtree: Subtree,
}

/// In-memory hierarchical object graph.
///
/// Nodes live in an id-indexed arena; the tree shape is kept through child id lists and parent
/// ids. Every mutation raises a [`GraphEvent`] to the registered listeners.
pub struct Graph {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    listeners: Vec<Arc<dyn GraphListener>>,
    loading: bool,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("loading", &self.loading)
            .finish()
    }
}

impl Graph {
    pub fn new(root: NodeId, type_tag: impl Into<TypeTag>) -> Self {
        let node = Node::new(root.clone(), type_tag.into(), None, BTreeMap::new());
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), node);
        Self { root, nodes, listeners: Vec::new(), loading: false }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &Node {
        self.nodes.get(&self.root).expect("graph root is always present")
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(Node::parent)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Position of `id` among its parent's children that share its type tag.
    pub fn sibling_index(&self, id: &NodeId) -> Option<usize> {
        let node = self.nodes.get(id)?;
        let parent = self.nodes.get(node.parent()?)?;
        parent
            .children()
            .iter()
            .filter(|child| self.type_of(child) == Some(node.type_tag()))
            .position(|child| child == id)
    }

    pub fn children_of_type<'a>(&'a self, parent: &NodeId, type_tag: &'a str) -> Vec<&'a NodeId> {
        let Some(parent) = self.nodes.get(parent) else {
            return Vec::new();
        };
        parent
            .children()
            .iter()
            .filter(|child| self.type_of(child) == Some(type_tag))
            .collect()
    }

    /// Pre-order walk starting at (and including) `id`.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            stack.extend(node.children().iter().rev().cloned());
            out.push(next);
        }
        out
    }

    pub fn subtree(&self, id: &NodeId) -> Option<Subtree> {
        let node = self.nodes.get(id)?;
        Some(Subtree {
            id: node.id().clone(),
            type_tag: node.type_tag().into(),
            properties: node.properties().clone(),
            children: node.children().iter().filter_map(|child| self.subtree(child)).collect(),
        })
    }

    pub fn add_listener(&mut self, listener: Arc<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn GraphListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|candidate| !Arc::ptr_eq(candidate, listener));
        self.listeners.len() != before
    }

    pub fn begin(&mut self, message: impl Into<String>) {
        self.fire(|| GraphEvent::TransactionStarted { message: message.into() });
    }

    pub fn commit(&mut self) {
        self.fire(|| GraphEvent::TransactionEnded);
    }

    pub fn rollback(&mut self, message: impl Into<String>) {
        self.fire(|| GraphEvent::TransactionRolledBack { message: message.into() });
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.fire(|| GraphEvent::LoadingStarted);
    }

    pub fn end_loading(&mut self) {
        self.loading = false;
        self.fire(|| GraphEvent::LoadingFinished);
    }

    /// Inserts a detached subtree under `parent` at `index` among same-typed siblings.
    ///
    /// Indices past the end append after the last sibling of that type. Returns the effective
    /// index.
    pub fn insert_subtree(
        &mut self,
        parent: &NodeId,
        index: usize,
        subtree: Subtree,
    ) -> Result<usize, GraphError> {
        self.check_insertable(parent, &subtree)?;
        let (position, effective_index) = self.insertion_point(parent, &subtree.type_tag, index);
        self.place(parent, position, effective_index, subtree);
        Ok(effective_index)
    }

    /// Reinserts a removed subtree at its absolute `position` among all children of `parent`,
    /// clamped to the end. Returns the index it takes among same-typed siblings.
    pub fn restore_subtree(
        &mut self,
        parent: &NodeId,
        position: usize,
        subtree: Subtree,
    ) -> Result<usize, GraphError> {
        self.check_insertable(parent, &subtree)?;
        let children = self.nodes.get(parent).map(Node::children).unwrap_or_default();
        let position = position.min(children.len());
        let effective_index = children[..position]
            .iter()
            .filter(|child| self.type_of(child) == Some(subtree.type_tag.as_str()))
            .count();
        self.place(parent, position, effective_index, subtree);
        Ok(effective_index)
    }

    /// Removes `child` and all of its descendants.
    pub fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<Removal, GraphError> {
        if self.parent_of(child) != Some(parent) {
            if !self.nodes.contains_key(child) {
                return Err(GraphError::NodeNotFound { node_id: child.clone() });
            }
            return Err(GraphError::NotAChild { parent: parent.clone(), child: child.clone() });
        }

        let index = self.sibling_index(child).unwrap_or_default();
        let mut position = 0;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            let children = parent_node.children_mut();
            if let Some(found) = children.iter().position(|candidate| candidate == child) {
                children.remove(found);
                position = found;
            }
        }
        let removed = self.detach(child);

        if !self.listeners.is_empty() {
            let event_child = removed.clone();
            self.fire(|| GraphEvent::ChildRemoved {
                parent: parent.clone(),
                index,
                position,
                child: event_child,
            });
        }
        Ok(Removal { index, position, subtree: removed })
    }

    /// Sets (or, for `Null`, clears) a property and returns the previous value.
    pub fn set_property(
        &mut self,
        id: &NodeId,
        name: impl Into<PropertyName>,
        value: Value,
    ) -> Result<Value, GraphError> {
        let name = name.into();
        let Some(node) = self.nodes.get_mut(id) else {
            return Err(GraphError::NodeNotFound { node_id: id.clone() });
        };
        if node.property(&name).unwrap_or(&Value::Null) == &value {
            return Ok(value);
        }

        let event_new = (!self.listeners.is_empty()).then(|| value.clone());
        let old = node.replace_property(name.clone(), value);
        if let Some(new) = event_new {
            let event_old = old.clone();
            self.fire(|| GraphEvent::PropertyChanged {
                node: id.clone(),
                name,
                old: event_old,
                new,
            });
        }
        Ok(old)
    }

    /// Changes a node's identity. Only legal while loading.
    pub fn change_id(&mut self, old: &NodeId, new: NodeId) -> Result<(), GraphError> {
        if !self.loading {
            return Err(GraphError::IdChangeOutsideLoading { node_id: old.clone() });
        }
        if self.nodes.contains_key(&new) {
            return Err(GraphError::DuplicateId { node_id: new });
        }
        let Some(mut node) = self.nodes.remove(old) else {
            return Err(GraphError::NodeNotFound { node_id: old.clone() });
        };

        node.set_id(new.clone());
        if let Some(parent) = node.parent().cloned() {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                for child in parent_node.children_mut().iter_mut() {
                    if child == old {
                        *child = new.clone();
                    }
                }
            }
        }
        for child in node.children().to_vec() {
            if let Some(child_node) = self.nodes.get_mut(&child) {
                child_node.set_parent(Some(new.clone()));
            }
        }
        self.nodes.insert(new.clone(), node);
        for node in self.nodes.values_mut() {
            let names = node
                .properties()
                .iter()
                .filter(|(_, value)| matches!(value, Value::Reference(_) | Value::List(_)))
                .map(|(name, _)| name.clone())
                .collect::<Vec<_>>();
            for name in names {
                let mut value = node.property(&name).cloned().unwrap_or_default();
                rename_reference(&mut value, old, &new);
                node.replace_property(name, value);
            }
        }
        if &self.root == old {
            self.root = new.clone();
        }

        let old = old.clone();
        self.fire(|| GraphEvent::IdChanged { old, new });
        Ok(())
    }

    fn type_of(&self, id: &NodeId) -> Option<&str> {
        self.nodes.get(id).map(Node::type_tag)
    }

    fn insertion_point(&self, parent: &NodeId, type_tag: &str, index: usize) -> (usize, usize) {
        let children = self.nodes.get(parent).map(Node::children).unwrap_or_default();
        let same_type = children
            .iter()
            .enumerate()
            .filter(|(_, child)| self.type_of(child) == Some(type_tag))
            .map(|(position, _)| position)
            .collect::<Vec<_>>();

        match same_type.get(index) {
            Some(&position) => (position, index),
            None => match same_type.last() {
                Some(&last) => (last + 1, same_type.len()),
                None => (children.len(), 0),
            },
        }
    }

    fn check_insertable(&self, parent: &NodeId, subtree: &Subtree) -> Result<(), GraphError> {
        if !self.nodes.contains_key(parent) {
            return Err(GraphError::NodeNotFound { node_id: parent.clone() });
        }
        let mut seen = HashSet::new();
        for id in subtree.ids() {
            if self.nodes.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(GraphError::DuplicateId { node_id: id });
            }
        }
        Ok(())
    }

    fn place(&mut self, parent: &NodeId, position: usize, index: usize, subtree: Subtree) {
        let event_child = (!self.listeners.is_empty()).then(|| subtree.clone());
        let child_id = subtree.id.clone();
        self.attach(parent, subtree);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children_mut().insert(position, child_id);
        }

        if let Some(child) = event_child {
            self.fire(|| GraphEvent::ChildAdded { parent: parent.clone(), index, child });
        }
    }

    fn attach(&mut self, parent: &NodeId, subtree: Subtree) {
        let Subtree { id, type_tag, properties, children } = subtree;
        let mut node = Node::new(id.clone(), type_tag, Some(parent.clone()), properties);
        node.children_mut().extend(children.iter().map(|child| child.id.clone()));
        self.nodes.insert(id.clone(), node);
        for child in children {
            self.attach(&id, child);
        }
    }

    fn detach(&mut self, id: &NodeId) -> Subtree {
        let Some(node) = self.nodes.remove(id) else {
            return Subtree::new(id.clone(), "");
        };
        let children = node.children().iter().map(|child| self.detach(child)).collect();
        Subtree {
            id: node.id().clone(),
            type_tag: node.type_tag().into(),
            properties: node.properties().clone(),
            children,
        }
    }

    fn fire(&self, event: impl FnOnce() -> GraphEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let event = event();
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

impl NodeLookup for Graph {
    fn contains_node(&self, id: &NodeId) -> bool {
        self.contains(id)
    }
}

#[cfg(test)]
mod tests;
