// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{SessionPersister, TransportError};
use crate::codec::{self, CodecError};

/// Delivers encoded batches to a receiver.
///
/// Called while the sending persister holds its transaction lock; a returned error rolls the
/// sender's transaction back.
pub trait Transport: Send + Sync {
    fn send(&self, batch: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, batch: &str) -> Result<(), TransportError> {
        (**self).send(batch)
    }
}

/// Applies every batch synchronously to an in-process [`SessionPersister`].
#[derive(Debug, Clone)]
pub struct LocalTransport {
    session: Arc<SessionPersister>,
}

impl LocalTransport {
    pub fn new(session: Arc<SessionPersister>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionPersister> {
        &self.session
    }
}

impl Transport for LocalTransport {
    fn send(&self, batch: &str) -> Result<(), TransportError> {
        codec::decode_and_apply(batch, self.session.as_ref())
            .map(|applied| debug!(applied, "batch applied locally"))
            .map_err(TransportError::Rejected)
    }
}

/// Queues batches on a tokio channel; see [`apply_incoming`] for the receiving task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, batch: &str) -> Result<(), TransportError> {
        self.tx.send(batch.to_owned()).map_err(|_| TransportError::Closed)
    }
}

/// Applies batches from `rx` to `session` until every sender is gone.
///
/// Returns the number of batches applied, or the first batch failure.
pub async fn apply_incoming(
    mut rx: mpsc::UnboundedReceiver<String>,
    session: Arc<SessionPersister>,
) -> Result<usize, CodecError> {
    let mut batches = 0;
    while let Some(batch) = rx.recv().await {
        match codec::decode_and_apply(&batch, session.as_ref()) {
            Ok(records) => {
                batches += 1;
                debug!(batches, records, "incoming batch applied");
            }
            Err(err) => {
                warn!(error = %err, last_uuid = ?err.last_uuid(), "incoming batch rejected");
                return Err(err);
            }
        }
    }
    Ok(batches)
}
