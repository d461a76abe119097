// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use super::PersistError;
use crate::ops::Method;

/// Nesting depth plus the records buffered since the outermost `begin`.
#[derive(Debug)]
pub struct TxnBuffer<R> {
    depth: usize,
    records: Vec<R>,
}

impl<R> Default for TxnBuffer<R> {
    fn default() -> Self {
        Self { depth: 0, records: Vec::new() }
    }
}

impl<R> TxnBuffer<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    /// Returns `true` when this call opened the transaction.
    pub fn begin(&mut self) -> bool {
        self.depth += 1;
        self.depth == 1
    }

    pub fn push(&mut self, operation: Method, record: R) -> Result<(), PersistError> {
        if !self.is_open() {
            return Err(PersistError::NotInTransaction { operation });
        }
        self.records.push(record);
        Ok(())
    }

    /// Closes one level. Hands back the buffered records when the outermost level closes.
    pub fn commit(&mut self) -> Result<Option<Vec<R>>, PersistError> {
        if !self.is_open() {
            return Err(PersistError::NotInTransaction { operation: Method::Commit });
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.records)))
    }

    /// Discards everything at any depth. Returns the discarded records.
    pub fn rollback(&mut self) -> Vec<R> {
        self.depth = 0;
        std::mem::take(&mut self.records)
    }
}

#[derive(Debug)]
pub(crate) struct TxnState<R> {
    owner: Option<ThreadId>,
    buffer: TxnBuffer<R>,
}

impl<R> TxnState<R> {
    /// Like [`TxnBuffer::begin`], claiming the transaction for the calling thread.
    pub(crate) fn begin(&mut self) -> bool {
        let opened = self.buffer.begin();
        if opened {
            self.owner = Some(thread::current().id());
        }
        opened
    }

    pub(crate) fn commit(&mut self) -> Result<Option<Vec<R>>, PersistError> {
        let flushed = self.buffer.commit()?;
        if flushed.is_some() {
            self.owner = None;
        }
        Ok(flushed)
    }

    pub(crate) fn rollback(&mut self) -> Vec<R> {
        self.owner = None;
        self.buffer.rollback()
    }
}

impl<R> Deref for TxnState<R> {
    type Target = TxnBuffer<R>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<R> DerefMut for TxnState<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Transaction-scoped critical section.
///
/// The thread that opens a transaction owns the persister until the outermost commit or a
/// rollback; any other thread entering meanwhile waits for its turn. The guard is held across
/// the flush/replay of a closing commit, so batches leave in commit order.
#[derive(Debug)]
pub(crate) struct TxnLock<R> {
    state: Mutex<TxnState<R>>,
    turn: Condvar,
}

impl<R> Default for TxnLock<R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(TxnState { owner: None, buffer: TxnBuffer::new() }),
            turn: Condvar::new(),
        }
    }
}

impl<R> TxnLock<R> {
    pub(crate) fn enter(&self) -> TxnGuard<'_, R> {
        let me = thread::current().id();
        let mut state = self.state.lock().expect("transaction lock poisoned");
        while state.owner.is_some_and(|owner| owner != me) {
            state = self.turn.wait(state).expect("transaction lock poisoned");
        }
        TxnGuard { state, turn: &self.turn }
    }
}

pub(crate) struct TxnGuard<'a, R> {
    state: MutexGuard<'a, TxnState<R>>,
    turn: &'a Condvar,
}

impl<R> Deref for TxnGuard<'_, R> {
    type Target = TxnState<R>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<R> DerefMut for TxnGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl<R> Drop for TxnGuard<'_, R> {
    fn drop(&mut self) {
        if self.state.owner.is_none() {
            self.turn.notify_all();
        }
    }
}
