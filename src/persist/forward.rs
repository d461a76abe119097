// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};

use tracing::{trace, warn};

use super::{PersistError, Persister};
use crate::convert::{TypeConverter, WireKind};
use crate::helpers::{emit_subtree, HelperRegistry};
use crate::model::{GraphEvent, GraphListener};
use crate::ops::{self, OperationRecord};

#[derive(Debug, Default)]
struct ForwardState {
    depth: usize,
    /// Set when a record of the open transaction failed; the rest of it is skipped.
    failed: bool,
    loading: bool,
    errors: Vec<PersistError>,
}

/// Mirrors local graph changes into a [`Persister`].
///
/// Graph transactions map one-to-one onto persister transactions; a change raised outside a
/// graph transaction is sent as a transaction of its own. Failures cannot propagate out of a
/// listener, so they are logged and kept for [`take_errors`](Self::take_errors).
pub struct PersisterForwarder<P: ?Sized> {
    registry: Arc<HelperRegistry>,
    converter: TypeConverter,
    state: Mutex<ForwardState>,
    persister: Arc<P>,
}

impl<P: ?Sized> std::fmt::Debug for PersisterForwarder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersisterForwarder").field("state", &self.state).finish_non_exhaustive()
    }
}

impl<P: Persister + ?Sized> PersisterForwarder<P> {
    pub fn new(persister: Arc<P>, registry: Arc<HelperRegistry>) -> Self {
        Self {
            registry,
            converter: TypeConverter::new(),
            state: Mutex::new(ForwardState::default()),
            persister,
        }
    }

    pub fn persister(&self) -> &Arc<P> {
        &self.persister
    }

    /// Drains the failures collected so far.
    pub fn take_errors(&self) -> Vec<PersistError> {
        std::mem::take(&mut self.state().errors)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ForwardState> {
        self.state.lock().expect("forwarder state lock poisoned")
    }

    fn records_for(&self, event: &GraphEvent) -> Result<Vec<OperationRecord>, PersistError> {
        let mut records = Vec::new();
        match event {
            GraphEvent::ChildAdded { parent, index, child } => {
                emit_subtree(&self.registry, &self.converter, parent, *index, child, &mut records)
                    .map_err(|err| PersistError::from_helper(&child.id, err))?;
            }
            GraphEvent::ChildRemoved { parent, child, .. } => {
                records.push(OperationRecord::RemoveNode {
                    parent_id: parent.clone(),
                    node_id: child.id.clone(),
                });
            }
            GraphEvent::PropertyChanged { node, name, old, new } => {
                let conversion = |source| PersistError::Conversion {
                    node_id: node.clone(),
                    property: name.clone(),
                    source,
                };
                let (old_kind, old_value) = self.converter.to_wire(old).map_err(conversion)?;
                let (new_kind, new_value) = self.converter.to_wire(new).map_err(conversion)?;
                let kind = if new_kind == WireKind::Null { old_kind } else { new_kind };
                records.push(OperationRecord::SetPropertyConditional {
                    node_id: node.clone(),
                    name: name.clone(),
                    kind,
                    old_value,
                    new_value,
                });
            }
            _ => {}
        }
        Ok(records)
    }

    fn send(&self, records: Vec<OperationRecord>, standalone: bool) -> Result<(), PersistError> {
        if standalone {
            self.persister.begin()?;
        }
        for record in records {
            ops::dispatch(self.persister.as_ref(), record)?;
        }
        if standalone {
            self.persister.commit()?;
        }
        Ok(())
    }

    fn fail(&self, state: &mut ForwardState, err: PersistError) {
        warn!(error = %err, node_id = ?err.node_id(), "change not forwarded");
        self.persister.rollback();
        state.failed = state.depth > 0;
        state.errors.push(err);
    }
}

impl<P: Persister + ?Sized> GraphListener for PersisterForwarder<P> {
    fn on_event(&self, event: &GraphEvent) {
        let mut state = self.state();
        match event {
            GraphEvent::LoadingStarted => state.loading = true,
            GraphEvent::LoadingFinished => state.loading = false,
            GraphEvent::TransactionStarted { .. } => {
                state.depth += 1;
                if state.depth == 1 {
                    state.failed = false;
                }
                if !state.failed {
                    if let Err(err) = self.persister.begin() {
                        self.fail(&mut state, err);
                    }
                }
            }
            GraphEvent::TransactionEnded => {
                if state.depth == 0 {
                    trace!("transaction end without a start");
                    return;
                }
                state.depth -= 1;
                if state.failed {
                    if state.depth == 0 {
                        state.failed = false;
                    }
                    return;
                }
                if let Err(err) = self.persister.commit() {
                    self.fail(&mut state, err);
                }
            }
            GraphEvent::TransactionRolledBack { .. } => {
                if state.depth > 0 && !state.failed {
                    self.persister.rollback();
                }
                state.depth = 0;
                state.failed = false;
            }
            _ if state.loading || state.failed => {}
            _ => {
                let standalone = state.depth == 0;
                let sent = self.records_for(event).and_then(|records| {
                    if records.is_empty() {
                        return Ok(());
                    }
                    self.send(records, standalone)
                });
                if let Err(err) = sent {
                    self.fail(&mut state, err);
                }
            }
        }
    }
}
