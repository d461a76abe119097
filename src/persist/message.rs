// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, instrument, warn};

use super::transport::Transport;
use super::txn::TxnLock;
use super::{PersistError, Persister, TransportError};
use crate::codec;
use crate::convert::{WireKind, WirePrimitive};
use crate::model::{NodeId, PropertyName, TypeTag};
use crate::ops::OperationRecord;

/// Sending end: buffers records and ships each outermost transaction as one JSON batch.
#[derive(Debug)]
pub struct MessagePersister<T> {
    transport: T,
    txn: TxnLock<OperationRecord>,
    pretty: bool,
    sent: AtomicUsize,
}

impl<T: Transport> MessagePersister<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, txn: TxnLock::default(), pretty: false, sent: AtomicUsize::new(0) }
    }

    /// Encode batches with one record per line.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn depth(&self) -> usize {
        self.txn.enter().depth()
    }

    /// Batches handed to the transport so far.
    pub fn batches_sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    fn buffer(&self, record: OperationRecord) -> Result<(), PersistError> {
        self.txn.enter().push(record.method(), record)
    }

    fn encode(&self, records: Vec<OperationRecord>) -> Result<String, TransportError> {
        let mut batch = Vec::with_capacity(records.len() + 2);
        batch.push(OperationRecord::Begin);
        batch.extend(records);
        batch.push(OperationRecord::Commit);
        let encoded = if self.pretty {
            codec::encode_batch_pretty(&batch)
        } else {
            codec::encode_batch(&batch)
        };
        encoded.map_err(|err| TransportError::Failed(err.to_string()))
    }
}

impl<T: Transport> Persister for MessagePersister<T> {
    fn begin(&self) -> Result<(), PersistError> {
        self.txn.enter().begin();
        Ok(())
    }

    #[instrument(skip(self), err)]
    fn commit(&self) -> Result<(), PersistError> {
        let mut txn = self.txn.enter();
        let Some(records) = txn.commit()? else {
            return Ok(());
        };
        if records.is_empty() {
            debug!("empty transaction, nothing sent");
            return Ok(());
        }

        let count = records.len();
        match self.encode(records).and_then(|batch| self.transport.send(&batch)) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                debug!(records = count, "batch sent");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, records = count, "batch not delivered, rolled back");
                txn.rollback();
                Err(err.into())
            }
        }
    }

    fn rollback(&self) {
        let dropped = self.txn.enter().rollback();
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "transaction rolled back");
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
        self.buffer(OperationRecord::SetPropertyConditional {
            node_id,
            name,
            kind,
            old_value,
            new_value,
        })
    }

    fn remove_node(&self, parent_id: NodeId, node_id: NodeId) -> Result<(), PersistError> {
        self.buffer(OperationRecord::RemoveNode { parent_id, node_id })
    }
}
