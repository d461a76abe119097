// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Commit-time replay of one buffered transaction.
//!
//! Records are applied in buffered order. A creation whose parent or constructor reference is
//! still waiting to be created in the same transaction is deferred and retried after every
//! successful creation; property records for deferred nodes wait with it. Every mutation pushes
//! its compensating action onto a journal, which is unwound if anything fails.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::convert::{ConversionError, TypeConverter, WirePrimitive};
use crate::helpers::{ConstructionContext, HelperError, HelperRegistry};
use crate::model::{Graph, GraphError, NodeId, PropertyName, Subtree, Value, ValueKind};
use crate::ops::OperationRecord;
use crate::persist::{DependencyError, PersistError};
use crate::undo::EditAction;

pub(super) fn run(
    graph: &mut Graph,
    registry: &HelperRegistry,
    converter: &TypeConverter,
    records: &[OperationRecord],
) -> Result<(), PersistError> {
    graph.begin("replay");
    let mut replay = Replay::new(registry, converter, records);
    match replay.apply(graph) {
        Ok(()) => {
            graph.commit();
            debug!(records = records.len(), mutations = replay.journal.len(), "replay committed");
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, node_id = ?err.node_id(), "replay failed, restoring graph");
            replay.revert(graph);
            graph.rollback(err.to_string());
            Err(err)
        }
    }
}

/// Value of `name` on `node_id` as its helper reports it; `None` if anything is unknown.
pub(super) fn live_value(
    graph: &Graph,
    registry: &HelperRegistry,
    node_id: &NodeId,
    name: &str,
) -> Option<Value> {
    let node = graph.get(node_id)?;
    let helper = registry.get(node.type_tag()).ok()?;
    helper.read_property(node, name).ok()
}

pub(super) fn check_expected(
    converter: &TypeConverter,
    node_id: &NodeId,
    name: &PropertyName,
    live: &Value,
    expected: &WirePrimitive,
) -> Result<(), PersistError> {
    let (_, actual) = converter.to_wire(live).map_err(|source| PersistError::Conversion {
        node_id: node_id.clone(),
        property: name.clone(),
        source,
    })?;
    if &actual == expected {
        return Ok(());
    }
    Err(PersistError::Conflict {
        node_id: node_id.clone(),
        property: name.clone(),
        expected: expected.clone(),
        actual,
    })
}

struct Replay<'a> {
    registry: &'a HelperRegistry,
    converter: &'a TypeConverter,
    records: &'a [OperationRecord],
    consumed: Vec<bool>,
    /// Ids announced by a creation record that has not been applied yet.
    pending: HashSet<NodeId>,
    /// Ids removed so far, descendants included.
    removed: HashSet<NodeId>,
    deferred_creates: Vec<usize>,
    deferred_props: Vec<usize>,
    journal: Vec<EditAction>,
}

impl<'a> Replay<'a> {
    fn new(
        registry: &'a HelperRegistry,
        converter: &'a TypeConverter,
        records: &'a [OperationRecord],
    ) -> Self {
        let pending = records
            .iter()
            .filter_map(|record| match record {
                OperationRecord::CreateNode { node_id, .. } => Some(node_id.clone()),
                _ => None,
            })
            .collect();
        Self {
            registry,
            converter,
            records,
            consumed: vec![false; records.len()],
            pending,
            removed: HashSet::new(),
            deferred_creates: Vec::new(),
            deferred_props: Vec::new(),
            journal: Vec::new(),
        }
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<(), PersistError> {
        self.check_conditions(graph)?;

        let records = self.records;
        for (idx, record) in records.iter().enumerate() {
            if self.consumed[idx] {
                continue;
            }
            match record {
                OperationRecord::CreateNode { .. } => {
                    if self.try_create(graph, idx)? {
                        self.retry_deferred(graph)?;
                    } else {
                        self.deferred_creates.push(idx);
                    }
                }
                OperationRecord::SetProperty { node_id, .. }
                | OperationRecord::SetPropertyConditional { node_id, .. } => {
                    if graph.contains(node_id) && !self.waits_behind(idx) {
                        if !self.apply_property(graph, idx)? {
                            self.deferred_props.push(idx);
                        }
                    } else if graph.contains(node_id) || self.pending.contains(node_id) {
                        self.deferred_props.push(idx);
                    } else {
                        return Err(PersistError::dependency(node_id, DependencyError::UnknownNode));
                    }
                }
                OperationRecord::RemoveNode { parent_id, node_id } => {
                    self.remove(graph, parent_id, node_id)?;
                }
                OperationRecord::Begin | OperationRecord::Commit | OperationRecord::Rollback => {}
            }
        }

        self.retry_deferred(graph)?;
        let waiting = self.deferred_creates.len() + self.deferred_props.len();
        let stuck = self.deferred_creates.iter().chain(&self.deferred_props).next();
        match stuck.and_then(|&idx| records[idx].node_id()) {
            Some(stuck) => Err(PersistError::dependency(
                stuck,
                DependencyError::Stalled { pending: waiting },
            )),
            None => Ok(()),
        }
    }

    /// Optimistic checks that can run before anything is mutated: conditional sets on existing
    /// nodes whose property nothing earlier in the transaction touches.
    fn check_conditions(&self, graph: &Graph) -> Result<(), PersistError> {
        let mut structural = HashSet::new();
        let mut touched = HashSet::new();
        for record in self.records {
            match record {
                OperationRecord::CreateNode { node_id, .. }
                | OperationRecord::RemoveNode { node_id, .. } => {
                    structural.insert(node_id);
                }
                OperationRecord::SetProperty { node_id, name, .. } => {
                    touched.insert((node_id, name));
                }
                OperationRecord::SetPropertyConditional { node_id, name, old_value, .. } => {
                    if !structural.contains(node_id) && touched.insert((node_id, name)) {
                        if let Some(live) = live_value(graph, self.registry, node_id, name) {
                            check_expected(self.converter, node_id, name, &live, old_value)?;
                        }
                    }
                }
                OperationRecord::Begin | OperationRecord::Commit | OperationRecord::Rollback => {}
            }
        }
        Ok(())
    }

    fn retry_deferred(&mut self, graph: &mut Graph) -> Result<(), PersistError> {
        loop {
            let mut progressed = false;
            let mut pos = 0;
            while pos < self.deferred_creates.len() {
                let idx = self.deferred_creates[pos];
                if self.consumed[idx] || self.try_create(graph, idx)? {
                    self.deferred_creates.remove(pos);
                    progressed = true;
                } else {
                    pos += 1;
                }
            }
            self.flush_deferred_props(graph)?;
            if !progressed {
                return Ok(());
            }
        }
    }

    fn flush_deferred_props(&mut self, graph: &mut Graph) -> Result<(), PersistError> {
        let waiting = std::mem::take(&mut self.deferred_props);
        for idx in waiting {
            if self.consumed[idx] {
                continue;
            }
            let ready = self.records[idx].node_id().is_some_and(|id| graph.contains(id));
            if !ready || self.waits_behind(idx) || !self.apply_property(graph, idx)? {
                self.deferred_props.push(idx);
            }
        }
        Ok(())
    }

    /// Returns `Ok(false)` when the creation has to wait for another node of this transaction.
    fn try_create(&mut self, graph: &mut Graph, idx: usize) -> Result<bool, PersistError> {
        let records = self.records;
        let registry = self.registry;
        let OperationRecord::CreateNode { parent_id, type_tag, node_id, index } = &records[idx]
        else {
            return Ok(true);
        };

        let helper = registry
            .get(type_tag)
            .map_err(|err| PersistError::from_helper(node_id, err.into()))?;
        let Some(parent) = graph.get(parent_id) else {
            if self.pending.contains(parent_id) {
                trace!(%node_id, %parent_id, "creation waits for its parent");
                return Ok(false);
            }
            return Err(PersistError::dependency(
                node_id,
                DependencyError::MissingParent { parent_id: parent_id.clone() },
            ));
        };
        let parent_helper = registry
            .get(parent.type_tag())
            .map_err(|err| PersistError::from_helper(parent_id, err.into()))?;
        if !parent_helper.allows_child(type_tag) {
            return Err(PersistError::dependency(
                node_id,
                DependencyError::IncompatibleChild {
                    parent_type: parent.type_tag().into(),
                    child_type: type_tag.clone(),
                },
            ));
        }
        if graph.contains(node_id) {
            return Err(GraphError::DuplicateId { node_id: node_id.clone() }.into());
        }

        let mut ctx = ReplayContext {
            graph: &*graph,
            registry,
            converter: self.converter,
            records,
            consumed: &self.consumed,
            pending: &self.pending,
            node_id: node_id.clone(),
            taken: Vec::new(),
        };
        let subtree = match helper.construct(node_id, &mut ctx) {
            Ok(subtree) => subtree,
            Err(HelperError::NotReady { waiting_for }) => {
                trace!(%node_id, %waiting_for, "construction waits for a reference");
                return Ok(false);
            }
            Err(err) => return Err(PersistError::from_helper(node_id, err)),
        };
        let taken = ctx.taken;

        self.consumed[idx] = true;
        for consumed in taken {
            self.consumed[consumed] = true;
        }
        for id in subtree.ids() {
            self.pending.remove(&id);
        }
        let effective = graph.insert_subtree(parent_id, *index, subtree)?;
        trace!(%node_id, %parent_id, index = effective, "node created");
        self.journal.push(EditAction::Remove { parent: parent_id.clone(), node: node_id.clone() });
        Ok(true)
    }

    /// Whether an earlier record for the same property is still deferred.
    fn waits_behind(&self, idx: usize) -> bool {
        let target = property_target(&self.records[idx]);
        target.is_some()
            && self
                .deferred_props
                .iter()
                .any(|&other| property_target(&self.records[other]) == target)
    }

    /// Returns `Ok(false)` when the value references a node not created yet.
    fn apply_property(&mut self, graph: &mut Graph, idx: usize) -> Result<bool, PersistError> {
        let records = self.records;
        let (node_id, name, value, expected) = match &records[idx] {
            OperationRecord::SetProperty { node_id, name, value, .. } => {
                (node_id, name, value, None)
            }
            OperationRecord::SetPropertyConditional {
                node_id, name, old_value, new_value, ..
            } => (node_id, name, new_value, Some(old_value)),
            _ => return Ok(true),
        };

        let node = graph
            .get(node_id)
            .ok_or_else(|| PersistError::dependency(node_id, DependencyError::UnknownNode))?;
        let helper = self
            .registry
            .get(node.type_tag())
            .map_err(|err| PersistError::from_helper(node_id, err.into()))?;
        let kind = helper.property_kind(name).ok_or_else(|| {
            PersistError::dependency(
                node_id,
                DependencyError::UnknownProperty {
                    type_tag: node.type_tag().into(),
                    property: name.clone(),
                },
            )
        })?;
        if let Some(expected) = expected {
            let live = helper
                .read_property(node, name)
                .map_err(|err| PersistError::from_helper(node_id, err))?;
            check_expected(self.converter, node_id, name, &live, expected)?;
        }

        let value = match self.converter.from_wire(value, kind, &*graph) {
            Ok(value) => value,
            Err(ConversionError::UnresolvedReference { node_id: target })
                if self.pending.contains(&target) =>
            {
                trace!(%node_id, %target, "property waits for its target");
                return Ok(false);
            }
            Err(source) => {
                let err = HelperError::Conversion { property: name.clone(), source };
                return Err(PersistError::from_helper(node_id, err));
            }
        };
        let old = helper
            .apply_property(graph, node_id, name, value)
            .map_err(|err| PersistError::from_helper(node_id, err))?;
        self.consumed[idx] = true;
        self.journal.push(EditAction::SetProperty {
            node: node_id.clone(),
            name: name.clone(),
            value: old,
        });
        Ok(true)
    }

    fn remove(
        &mut self,
        graph: &mut Graph,
        parent_id: &NodeId,
        node_id: &NodeId,
    ) -> Result<(), PersistError> {
        if !graph.contains(node_id) {
            if self.removed.contains(node_id) {
                trace!(%node_id, "already removed with an ancestor");
                return Ok(());
            }
            return Err(PersistError::dependency(node_id, DependencyError::UnknownNode));
        }
        if graph.parent_of(node_id) != Some(parent_id) {
            return Err(PersistError::dependency(
                node_id,
                DependencyError::ParentMismatch { expected: parent_id.clone() },
            ));
        }

        let removal = graph.remove_child(parent_id, node_id)?;
        self.removed.extend(removal.subtree.ids());
        self.journal.push(EditAction::Insert {
            parent: parent_id.clone(),
            position: removal.position,
            subtree: removal.subtree,
        });
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) {
        for action in self.journal.drain(..).rev() {
            if let Err(err) = action.apply(graph) {
                warn!(error = %err, "could not revert replayed mutation");
            }
        }
    }
}

fn property_target(record: &OperationRecord) -> Option<(&NodeId, &PropertyName)> {
    match record {
        OperationRecord::SetProperty { node_id, name, .. }
        | OperationRecord::SetPropertyConditional { node_id, name, .. } => Some((node_id, name)),
        _ => None,
    }
}

/// Hands buffered values of the current transaction to a helper's `construct`.
struct ReplayContext<'r> {
    graph: &'r Graph,
    registry: &'r HelperRegistry,
    converter: &'r TypeConverter,
    records: &'r [OperationRecord],
    consumed: &'r [bool],
    pending: &'r HashSet<NodeId>,
    node_id: NodeId,
    /// Records used by this construction; consumed only if it succeeds.
    taken: Vec<usize>,
}

impl ReplayContext<'_> {
    fn available(&self, idx: usize) -> bool {
        !self.consumed[idx] && !self.taken.contains(&idx)
    }
}

impl ConstructionContext for ReplayContext<'_> {
    fn take_property(&mut self, name: &str, kind: ValueKind) -> Result<Option<Value>, HelperError> {
        let found = self.records.iter().enumerate().find_map(|(idx, record)| match record {
            OperationRecord::SetProperty { node_id, name: candidate, value, .. }
                if node_id == &self.node_id && candidate == name && self.available(idx) =>
            {
                Some((idx, value))
            }
            _ => None,
        });
        let Some((idx, primitive)) = found else {
            return Ok(None);
        };

        let value = match self.converter.from_wire(primitive, kind, self.graph) {
            Ok(value) => value,
            Err(ConversionError::UnresolvedReference { node_id })
                if self.pending.contains(&node_id) =>
            {
                return Err(HelperError::NotReady { waiting_for: node_id });
            }
            Err(source) => return Err(HelperError::Conversion { property: name.into(), source }),
        };
        self.taken.push(idx);
        Ok(Some(value))
    }

    fn take_child(&mut self, type_tag: &str) -> Result<Option<Subtree>, HelperError> {
        let found = self.records.iter().enumerate().find_map(|(idx, record)| match record {
            OperationRecord::CreateNode { parent_id, type_tag: candidate, node_id, .. }
                if parent_id == &self.node_id && candidate == type_tag && self.available(idx) =>
            {
                Some((idx, node_id.clone()))
            }
            _ => None,
        });
        let Some((idx, child_id)) = found else {
            return Ok(None);
        };
        if self.graph.contains(&child_id) {
            return Err(GraphError::DuplicateId { node_id: child_id }.into());
        }

        let helper = self.registry.get(type_tag)?;
        self.taken.push(idx);
        let parent = std::mem::replace(&mut self.node_id, child_id.clone());
        let built = helper.construct(&child_id, self);
        self.node_id = parent;
        built.map(Some)
    }
}
