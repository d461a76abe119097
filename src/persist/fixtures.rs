// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{DependencyError, PersistError, Persister, Transport, TransportError};
use crate::convert::{WireKind, WirePrimitive};
use crate::model::{NodeId, PropertyName, TypeTag};
use crate::ops::OperationRecord;

/// Persister that logs every call, boundaries included, and can refuse one node id.
#[derive(Debug, Default)]
pub(crate) struct RecordingPersister {
    calls: Mutex<Vec<OperationRecord>>,
    refuse: Option<NodeId>,
}

impl RecordingPersister {
    pub(crate) fn refusing(node_id: NodeId) -> Self {
        Self { calls: Mutex::default(), refuse: Some(node_id) }
    }

    pub(crate) fn calls(&self) -> Vec<OperationRecord> {
        self.calls.lock().expect("recording persister lock poisoned").clone()
    }

    fn log(&self, record: OperationRecord) -> Result<(), PersistError> {
        if let (Some(refused), Some(node_id)) = (&self.refuse, record.node_id()) {
            if refused == node_id {
                return Err(PersistError::dependency(node_id, DependencyError::UnknownNode));
            }
        }
        self.calls.lock().expect("recording persister lock poisoned").push(record);
        Ok(())
    }
}

impl Persister for RecordingPersister {
    fn begin(&self) -> Result<(), PersistError> {
        self.log(OperationRecord::Begin)
    }

    fn commit(&self) -> Result<(), PersistError> {
        self.log(OperationRecord::Commit)
    }

    fn rollback(&self) {
        let _ = self.log(OperationRecord::Rollback);
    }

    fn create_node(
        &self,
        parent_id: NodeId,
        type_tag: TypeTag,
        node_id: NodeId,
        index: usize,
    ) -> Result<(), PersistError> {
        self.log(OperationRecord::CreateNode { parent_id, type_tag, node_id, index })
    }

    fn set_property(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        value: WirePrimitive,
    ) -> Result<(), PersistError> {
        self.log(OperationRecord::SetProperty { node_id, name, kind, value })
    }

    fn set_property_conditional(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        old_value: WirePrimitive,
        new_value: WirePrimitive,
    ) -> Result<(), PersistError> {
        self.log(OperationRecord::SetPropertyConditional {
            node_id,
            name,
            kind,
            old_value,
            new_value,
        })
    }

    fn remove_node(&self, parent_id: NodeId, node_id: NodeId) -> Result<(), PersistError> {
        self.log(OperationRecord::RemoveNode { parent_id, node_id })
    }
}

/// Transport that keeps every batch; can be switched to fail.
#[derive(Debug, Default)]
pub(crate) struct MemoryTransport {
    batches: Mutex<Vec<String>>,
    broken: AtomicBool,
}

impl MemoryTransport {
    pub(crate) fn batches(&self) -> Vec<String> {
        self.batches.lock().expect("memory transport lock poisoned").clone()
    }

    pub(crate) fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }
}

impl Transport for MemoryTransport {
    fn send(&self, batch: &str) -> Result<(), TransportError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(TransportError::Failed("link down".to_owned()));
        }
        self.batches.lock().expect("memory transport lock poisoned").push(batch.to_owned());
        Ok(())
    }
}
