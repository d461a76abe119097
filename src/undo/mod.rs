// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Undo/redo history built from graph notifications.
//!
//! The coordinator listens to a [`Graph`] and turns every structural or property change into
//! its compensating [`EditAction`]. Changes raised between an outermost transaction start and
//! end form one [`CompoundEdit`]; changes raised outside a transaction form an edit of their
//! own.

mod edit;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SyncConfig;
use crate::model::{Graph, GraphError, GraphEvent, GraphListener, NodeId};
use crate::ops::Method;
use crate::persist::TxnBuffer;

pub use edit::{CompoundEdit, EditAction};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum UndoError {
    #[error("an undo or redo is already running")]
    Busy,
    #[error("cannot undo or redo while a transaction is open")]
    TransactionOpen,
    #[error("edit could not be replayed: {0}")]
    Graph(#[from] GraphError),
}

#[derive(Debug)]
struct History {
    undo: VecDeque<CompoundEdit>,
    redo: Vec<CompoundEdit>,
    open: TxnBuffer<EditAction>,
    label: String,
    loading: bool,
    limit: usize,
}

impl History {
    fn record(&mut self, edit: CompoundEdit) {
        if edit.is_empty() {
            return;
        }
        trace!(label = %edit.label, actions = edit.len(), "edit recorded");
        self.redo.clear();
        self.push_undo(edit);
    }

    fn push_undo(&mut self, edit: CompoundEdit) {
        self.undo.push_back(edit);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    fn capture(&mut self, action: EditAction) {
        if !self.open.is_open() {
            self.record(CompoundEdit::new("edit", vec![action]));
            return;
        }
        if let Err(err) = self.open.push(Method::SetProperty, action) {
            trace!(error = %err, "action dropped");
        }
    }

    fn rename(&mut self, old: &NodeId, new: &NodeId) {
        for edit in self.undo.iter_mut().chain(self.redo.iter_mut()) {
            edit.rename(old, new);
        }
        for action in self.open.records_mut() {
            action.rename(old, new);
        }
    }
}

/// Records graph changes as compound edits and replays them backwards or forwards.
///
/// Register it on the graph with [`Graph::add_listener`]; drive it with [`undo`](Self::undo)
/// and [`redo`](Self::redo), passing the same graph.
#[derive(Debug)]
pub struct UndoCoordinator {
    history: Mutex<History>,
    replaying: AtomicBool,
}

impl Default for UndoCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl UndoCoordinator {
    /// `limit` caps the number of undoable edits; the oldest are dropped first.
    pub fn new(limit: usize) -> Self {
        Self {
            history: Mutex::new(History {
                undo: VecDeque::new(),
                redo: Vec::new(),
                open: TxnBuffer::new(),
                label: String::new(),
                loading: false,
                limit: limit.max(1),
            }),
            replaying: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.undo_history_limit)
    }

    fn history(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().expect("undo history lock poisoned")
    }

    pub fn can_undo(&self) -> bool {
        !self.history().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history().redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.history().undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.history().redo.len()
    }

    /// Label of the edit the next [`undo`](Self::undo) would revert.
    pub fn undo_label(&self) -> Option<String> {
        self.history().undo.back().map(|edit| edit.label.clone())
    }

    pub fn clear(&self) {
        let mut history = self.history();
        history.undo.clear();
        history.redo.clear();
    }

    /// Reverts the most recent edit. Returns `false` if there was nothing to undo.
    pub fn undo(&self, graph: &mut Graph) -> Result<bool, UndoError> {
        self.replay(graph, Direction::Undo)
    }

    /// Re-applies the most recently undone edit. Returns `false` if there was nothing to redo.
    pub fn redo(&self, graph: &mut Graph) -> Result<bool, UndoError> {
        self.replay(graph, Direction::Redo)
    }

    fn replay(&self, graph: &mut Graph, direction: Direction) -> Result<bool, UndoError> {
        let _replaying = ReplayGuard::claim(&self.replaying)?;

        let edit = {
            let mut history = self.history();
            if history.open.is_open() {
                return Err(UndoError::TransactionOpen);
            }
            let edit = match direction {
                Direction::Undo => history.undo.pop_back(),
                Direction::Redo => history.redo.pop(),
            };
            let Some(edit) = edit else {
                return Ok(false);
            };
            edit
        };

        graph.begin(format!("{} {}", direction.as_str(), edit.label));
        match edit.apply(graph) {
            Ok(inverse) => {
                graph.commit();
                debug!(label = %edit.label, direction = direction.as_str(), "edit replayed");
                let mut history = self.history();
                match direction {
                    Direction::Undo => history.redo.push(inverse),
                    Direction::Redo => history.push_undo(inverse),
                }
                Ok(true)
            }
            Err(err) => {
                graph.rollback(err.to_string());
                let mut history = self.history();
                match direction {
                    Direction::Undo => history.push_undo(edit),
                    Direction::Redo => history.redo.push(edit),
                }
                Err(err.into())
            }
        }
    }
}

impl GraphListener for UndoCoordinator {
    fn on_event(&self, event: &GraphEvent) {
        if self.replaying.load(Ordering::Acquire) {
            return;
        }
        let mut history = self.history();
        match event {
            GraphEvent::LoadingStarted => history.loading = true,
            GraphEvent::LoadingFinished => history.loading = false,
            GraphEvent::IdChanged { old, new } => history.rename(old, new),
            GraphEvent::TransactionStarted { message } => {
                if history.open.begin() {
                    history.label = message.clone();
                }
            }
            GraphEvent::TransactionEnded => match history.open.commit() {
                Ok(Some(actions)) => {
                    let label = std::mem::take(&mut history.label);
                    history.record(CompoundEdit::new(label, actions));
                }
                Ok(None) => {}
                Err(_) => trace!("transaction end without a start"),
            },
            GraphEvent::TransactionRolledBack { .. } => {
                let discarded = history.open.rollback();
                if !discarded.is_empty() {
                    debug!(discarded = discarded.len(), "open edit discarded");
                }
            }
            _ if history.loading => {}
            GraphEvent::ChildAdded { parent, child, .. } => {
                let node = child.id.clone();
                history.capture(EditAction::Remove { parent: parent.clone(), node });
            }
            GraphEvent::ChildRemoved { parent, position, child, .. } => {
                history.capture(EditAction::Insert {
                    parent: parent.clone(),
                    position: *position,
                    subtree: child.clone(),
                });
            }
            GraphEvent::PropertyChanged { node, name, old, .. } => {
                history.capture(EditAction::SetProperty {
                    node: node.clone(),
                    name: name.clone(),
                    value: old.clone(),
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Suspends capture while an undo or redo runs.
struct ReplayGuard<'a>(&'a AtomicBool);

impl<'a> ReplayGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Result<Self, UndoError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| UndoError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
