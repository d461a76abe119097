// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON batch codec.
//!
//! A batch is a JSON array of [`WireRecord`]s. Decoding comes in two flavours: materialize the
//! whole batch ([`decode_batch`]) or stream it into a [`Persister`] one record at a time
//! ([`decode_and_apply`]), so large batches never sit in memory as a whole.

mod wire;

use std::fmt;
use std::io;

use serde::de::{self, Deserializer as _, SeqAccess, Visitor};
use thiserror::Error;
use tracing::{debug, trace};

use crate::model::NodeId;
use crate::ops::{self, OperationRecord};
use crate::persist::{PersistError, Persister};

pub use wire::{RecordError, WireRecord};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed batch (last uuid: {}): {source}", display_uuid(.last_uuid))]
    Malformed {
        last_uuid: Option<String>,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid record (last uuid: {}): {source}", display_uuid(.last_uuid))]
    InvalidRecord {
        last_uuid: Option<String>,
        #[source]
        source: RecordError,
    },
    #[error("record rejected (last uuid: {}): {source}", display_uuid(.last_uuid))]
    Apply {
        last_uuid: Option<String>,
        #[source]
        source: Box<PersistError>,
    },
    #[error("cannot encode batch: {0}")]
    Encode(#[source] serde_json::Error),
}

fn display_uuid(uuid: &Option<String>) -> &str {
    uuid.as_deref().unwrap_or("none")
}

impl CodecError {
    /// Most recent node id seen before the failure.
    pub fn last_uuid(&self) -> Option<&str> {
        match self {
            Self::Malformed { last_uuid, .. }
            | Self::InvalidRecord { last_uuid, .. }
            | Self::Apply { last_uuid, .. } => last_uuid.as_deref(),
            Self::Encode(_) => None,
        }
    }

    /// The node the failure is about: the one named by the rejecting persister, if any.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::Apply { source, .. } => source.node_id(),
            _ => None,
        }
    }
}

pub fn encode_batch(records: &[OperationRecord]) -> Result<String, CodecError> {
    let wire = records.iter().map(WireRecord::from_record).collect::<Vec<_>>();
    serde_json::to_string(&wire).map_err(CodecError::Encode)
}

/// Like [`encode_batch`], one record per line.
pub fn encode_batch_pretty(records: &[OperationRecord]) -> Result<String, CodecError> {
    let wire = records.iter().map(WireRecord::from_record).collect::<Vec<_>>();
    serde_json::to_string_pretty(&wire).map_err(CodecError::Encode)
}

pub fn decode_batch(input: &str) -> Result<Vec<OperationRecord>, CodecError> {
    let mut de = serde_json::Deserializer::from_str(input);
    let mut state = StreamState::default();
    let result = (&mut de)
        .deserialize_seq(CollectVisitor { state: &mut state })
        .and_then(|records| de.end().map(|()| records));

    result.map_err(|source| {
        state
            .failure
            .take()
            .unwrap_or(CodecError::Malformed { last_uuid: state.last_uuid.take(), source })
    })
}

/// Decodes `input` record by record, feeding each into `persister` as soon as it is parsed.
///
/// Returns the number of records applied. If decoding or applying fails while the batch has a
/// transaction open, the persister is rolled back before the error is returned.
pub fn decode_and_apply<P: Persister + ?Sized>(
    input: &str,
    persister: &P,
) -> Result<usize, CodecError> {
    apply_from(serde_json::Deserializer::from_str(input), persister)
}

pub fn decode_and_apply_reader<R: io::Read, P: Persister + ?Sized>(
    reader: R,
    persister: &P,
) -> Result<usize, CodecError> {
    apply_from(serde_json::Deserializer::from_reader(reader), persister)
}

/// JSON schema of a batch.
pub fn batch_schema() -> schemars::Schema {
    schemars::schema_for!(Vec<WireRecord>)
}

#[derive(Debug, Default)]
struct StreamState {
    last_uuid: Option<String>,
    /// Transaction depth opened by this batch.
    depth: usize,
    failure: Option<CodecError>,
}

fn apply_from<'de, R, P>(
    mut de: serde_json::Deserializer<R>,
    persister: &P,
) -> Result<usize, CodecError>
where
    R: serde_json::de::Read<'de>,
    P: Persister + ?Sized,
{
    let mut state = StreamState::default();
    let result = (&mut de)
        .deserialize_seq(ApplyVisitor { persister, state: &mut state })
        .and_then(|applied| de.end().map(|()| applied));

    match result {
        Ok(applied) => {
            debug!(applied, "batch applied");
            Ok(applied)
        }
        Err(source) => {
            if state.depth > 0 {
                persister.rollback();
            }
            Err(state.failure.take().unwrap_or(CodecError::Malformed {
                last_uuid: state.last_uuid.take(),
                source,
            }))
        }
    }
}

/// Reads the next record, remembering its uuid before it is validated.
fn next_record<'de, A: SeqAccess<'de>>(
    seq: &mut A,
    state: &mut StreamState,
) -> Result<Option<OperationRecord>, A::Error> {
    let Some(wire) = seq.next_element::<WireRecord>()? else {
        return Ok(None);
    };
    if wire.uuid.is_some() {
        state.last_uuid = wire.uuid.clone();
    }
    match wire.into_record() {
        Ok(record) => Ok(Some(record)),
        Err(source) => {
            let last_uuid = state.last_uuid.clone();
            state.failure = Some(CodecError::InvalidRecord { last_uuid, source });
            Err(de::Error::custom("invalid record"))
        }
    }
}

struct CollectVisitor<'a> {
    state: &'a mut StreamState,
}

impl<'de> Visitor<'de> for CollectVisitor<'_> {
    type Value = Vec<OperationRecord>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of operation records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut records = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(record) = next_record(&mut seq, self.state)? {
            records.push(record);
        }
        Ok(records)
    }
}

struct ApplyVisitor<'a, P: ?Sized> {
    persister: &'a P,
    state: &'a mut StreamState,
}

impl<'de, P: Persister + ?Sized> Visitor<'de> for ApplyVisitor<'_, P> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of operation records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<usize, A::Error> {
        let mut applied = 0;
        while let Some(record) = next_record(&mut seq, self.state)? {
            trace!(method = %record.method(), uuid = ?self.state.last_uuid, "applying record");

            let method = record.method();
            if let Err(err) = ops::dispatch(self.persister, record) {
                let last_uuid = self.state.last_uuid.clone();
                self.state.failure = Some(CodecError::Apply { last_uuid, source: Box::new(err) });
                return Err(de::Error::custom("record rejected"));
            }
            match method {
                ops::Method::Begin => self.state.depth += 1,
                ops::Method::Commit => self.state.depth = self.state.depth.saturating_sub(1),
                ops::Method::Rollback => self.state.depth = 0,
                _ => {}
            }
            applied += 1;
        }
        Ok(applied)
    }
}
