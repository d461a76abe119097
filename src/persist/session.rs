// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

mod replay;

use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use super::txn::TxnLock;
use super::{PersistError, Persister};
use crate::convert::{TypeConverter, WireKind, WirePrimitive};
use crate::helpers::HelperRegistry;
use crate::model::{Graph, NodeId, PropertyName, TypeTag};
use crate::ops::{Method, OperationRecord};

/// Receiving end: buffers records per transaction and replays them on the outermost commit.
///
/// The replay either applies the whole transaction or leaves the graph as it was.
pub struct SessionPersister {
    graph: Arc<Mutex<Graph>>,
    registry: Arc<HelperRegistry>,
    converter: TypeConverter,
    txn: TxnLock<OperationRecord>,
}

impl std::fmt::Debug for SessionPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersister").field("registry", &self.registry).finish_non_exhaustive()
    }
}

impl SessionPersister {
    pub fn new(graph: Arc<Mutex<Graph>>, registry: Arc<HelperRegistry>) -> Self {
        Self { graph, registry, converter: TypeConverter::new(), txn: TxnLock::default() }
    }

    pub fn graph(&self) -> &Arc<Mutex<Graph>> {
        &self.graph
    }

    pub fn registry(&self) -> &Arc<HelperRegistry> {
        &self.registry
    }

    /// Current nesting depth; 0 when idle.
    pub fn depth(&self) -> usize {
        self.txn.enter().depth()
    }

    pub fn buffered(&self) -> usize {
        self.txn.enter().records().len()
    }

    fn buffer(&self, record: OperationRecord) -> Result<(), PersistError> {
        self.txn.enter().push(record.method(), record)
    }

    /// Early optimistic check for a conditional set on a node that already exists.
    ///
    /// Skipped when the transaction already touches that node or property: the live value is
    /// then only meaningful at replay time.
    fn check_live_value(
        &self,
        buffered: &[OperationRecord],
        node_id: &NodeId,
        name: &PropertyName,
        expected: &WirePrimitive,
    ) -> Result<(), PersistError> {
        let touched = buffered.iter().any(|record| match record {
            OperationRecord::CreateNode { node_id: id, .. }
            | OperationRecord::RemoveNode { node_id: id, .. } => id == node_id,
            OperationRecord::SetProperty { node_id: id, name: other, .. }
            | OperationRecord::SetPropertyConditional { node_id: id, name: other, .. } => {
                id == node_id && other == name
            }
            _ => false,
        });
        if touched {
            return Ok(());
        }

        let graph = self.graph.lock().expect("session graph lock poisoned");
        let Some(live) = replay::live_value(&graph, &self.registry, node_id, name) else {
            return Ok(());
        };
        replay::check_expected(&self.converter, node_id, name, &live, expected)
    }
}

impl Persister for SessionPersister {
    fn begin(&self) -> Result<(), PersistError> {
        if self.txn.enter().begin() {
            debug!("session transaction opened");
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    fn commit(&self) -> Result<(), PersistError> {
        let mut txn = self.txn.enter();
        let Some(records) = txn.commit()? else {
            return Ok(());
        };
        let mut graph = self.graph.lock().expect("session graph lock poisoned");
        replay::run(&mut graph, &self.registry, &self.converter, &records)
    }

    fn rollback(&self) {
        let dropped = self.txn.enter().rollback();
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "session transaction rolled back");
        }
    }

    fn create_node(
        &self,
        parent_id: NodeId,
        type_tag: TypeTag,
        node_id: NodeId,
        index: usize,
    ) -> Result<(), PersistError> {
        self.buffer(OperationRecord::CreateNode { parent_id, type_tag, node_id, index })
    }

    fn set_property(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        value: WirePrimitive,
    ) -> Result<(), PersistError> {
        self.buffer(OperationRecord::SetProperty { node_id, name, kind, value })
    }

    fn set_property_conditional(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        old_value: WirePrimitive,
        new_value: WirePrimitive,
    ) -> Result<(), PersistError> {
        let mut txn = self.txn.enter();
        if !txn.is_open() {
            return Err(PersistError::NotInTransaction {
                operation: Method::SetPropertyConditional,
            });
        }
        self.check_live_value(txn.records(), &node_id, &name, &old_value)?;
        let record =
            OperationRecord::SetPropertyConditional { node_id, name, kind, old_value, new_value };
        txn.push(record.method(), record)
    }

    fn remove_node(&self, parent_id: NodeId, node_id: NodeId) -> Result<(), PersistError> {
        self.buffer(OperationRecord::RemoveNode { parent_id, node_id })
    }
}

#[cfg(test)]
mod tests;
