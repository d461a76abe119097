// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::warn;

use crate::model::node::rename_reference;
use crate::model::{Graph, GraphError, NodeId, PropertyName, Subtree, Value};

/// One reversible graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// Re-insert a detached subtree at `position` among all children of `parent`.
    Insert { parent: NodeId, position: usize, subtree: Subtree },
    Remove { parent: NodeId, node: NodeId },
    /// Set `name` on `node` to `value` (`Null` clears it).
    SetProperty { node: NodeId, name: PropertyName, value: Value },
}

impl EditAction {
    /// Performs the action and returns the action that undoes it.
    pub fn apply(&self, graph: &mut Graph) -> Result<EditAction, GraphError> {
        match self {
            Self::Insert { parent, position, subtree } => {
                graph.restore_subtree(parent, *position, subtree.clone())?;
                Ok(Self::Remove { parent: parent.clone(), node: subtree.id.clone() })
            }
            Self::Remove { parent, node } => {
                let removal = graph.remove_child(parent, node)?;
                Ok(Self::Insert {
                    parent: parent.clone(),
                    position: removal.position,
                    subtree: removal.subtree,
                })
            }
            Self::SetProperty { node, name, value } => {
                let old = graph.set_property(node, name.clone(), value.clone())?;
                Ok(Self::SetProperty { node: node.clone(), name: name.clone(), value: old })
            }
        }
    }

    pub(crate) fn rename(&mut self, old: &NodeId, new: &NodeId) {
        let swap = |id: &mut NodeId| {
            if id == old {
                *id = new.clone();
            }
        };
        match self {
            Self::Insert { parent, subtree, .. } => {
                swap(parent);
                subtree.rename(old, new);
            }
            Self::Remove { parent, node } => {
                swap(parent);
                swap(node);
            }
            Self::SetProperty { node, value, .. } => {
                swap(node);
                rename_reference(value, old, new);
            }
        }
    }
}

/// Compensating actions captured between an outermost transaction start and end.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundEdit {
    pub label: String,
    /// In capture order.
    pub actions: Vec<EditAction>,
}

impl CompoundEdit {
    pub fn new(label: impl Into<String>, actions: Vec<EditAction>) -> Self {
        Self { label: label.into(), actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Applies the actions last-to-first and returns the edit that reverses this one.
    ///
    /// On failure the actions already applied are reverted before the error is returned, so the
    /// graph is left as it was.
    pub fn apply(&self, graph: &mut Graph) -> Result<CompoundEdit, GraphError> {
        let mut inverse = Vec::with_capacity(self.actions.len());
        for action in self.actions.iter().rev() {
            match action.apply(graph) {
                Ok(undo) => inverse.push(undo),
                Err(err) => {
                    for undo in inverse.iter().rev() {
                        if let Err(restore) = undo.apply(graph) {
                            warn!(error = %restore, "could not restore partially applied edit");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(Self { label: self.label.clone(), actions: inverse })
    }

    pub(crate) fn rename(&mut self, old: &NodeId, new: &NodeId) {
        for action in &mut self.actions {
            action.rename(old, new);
        }
    }
}
