// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;

use super::{HelperError, HelperRegistry};
use crate::convert::TypeConverter;
use crate::model::{Graph, NodeId, Subtree};
use crate::ops::{self, OperationRecord};
use crate::persist::{PersistError, Persister};

/// Records creating `subtree` (and everything below it) under `parent` at `index`.
///
/// Children follow their parent in pre-order, each with its index among same-typed siblings.
pub fn emit_subtree(
    registry: &HelperRegistry,
    converter: &TypeConverter,
    parent: &NodeId,
    index: usize,
    subtree: &Subtree,
    out: &mut Vec<OperationRecord>,
) -> Result<(), HelperError> {
    let helper = registry.get(&subtree.type_tag)?;
    out.extend(helper.emit(parent, index, subtree, converter)?);
    emit_children(registry, converter, subtree, out)
}

fn emit_children(
    registry: &HelperRegistry,
    converter: &TypeConverter,
    subtree: &Subtree,
    out: &mut Vec<OperationRecord>,
) -> Result<(), HelperError> {
    let mut seen = HashMap::<&str, usize>::new();
    for child in &subtree.children {
        let slot = seen.entry(child.type_tag.as_str()).or_default();
        let index = *slot;
        *slot += 1;
        emit_subtree(registry, converter, &subtree.id, index, child, out)?;
    }
    Ok(())
}

/// A full transaction describing `graph`: root properties, then every node in pre-order.
pub fn snapshot_records(
    graph: &Graph,
    registry: &HelperRegistry,
    converter: &TypeConverter,
) -> Result<Vec<OperationRecord>, HelperError> {
    let root = graph
        .subtree(graph.root_id())
        .unwrap_or_else(|| Subtree::new(graph.root_id().clone(), graph.root().type_tag()));

    let mut records = vec![OperationRecord::Begin];
    records.extend(registry.get(&root.type_tag)?.emit_properties(&root, converter)?);
    emit_children(registry, converter, &root, &mut records)?;
    records.push(OperationRecord::Commit);
    Ok(records)
}

/// Pushes a snapshot of `graph` through `persister` as one transaction.
pub fn persist_snapshot<P: Persister + ?Sized>(
    graph: &Graph,
    registry: &HelperRegistry,
    converter: &TypeConverter,
    persister: &P,
) -> Result<usize, PersistError> {
    let records = snapshot_records(graph, registry, converter).map_err(|err| {
        PersistError::from_helper(graph.root_id(), err)
    })?;
    let count = records.len();
    for record in records {
        if let Err(err) = ops::dispatch(persister, record) {
            persister.rollback();
            return Err(err);
        }
    }
    Ok(count)
}
