// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use treesync::codec::{decode_and_apply, encode_batch};
use treesync::model::NodeId;
use treesync::ops::{self, OperationRecord};
use treesync::persist::SessionPersister;
use treesync::schema::{empty_workspace, workspace_registry};

mod fixtures;
mod profiler;

use fixtures::Case;

fn fresh_session(registry: &Arc<treesync::helpers::HelperRegistry>) -> SessionPersister {
    let root = NodeId::new("root").expect("root id");
    SessionPersister::new(Arc::new(Mutex::new(empty_workspace(root))), registry.clone())
}

/// Children first, then parents: every creation waits for the one after it.
fn reversed(records: &[OperationRecord]) -> Vec<OperationRecord> {
    let inner = &records[1..records.len() - 1];
    let mut out = vec![OperationRecord::Begin];
    out.extend(inner.iter().rev().cloned());
    out.push(OperationRecord::Commit);
    out
}

// Group name `replay.commit` and the case ids are stable across refactors.
fn benches_replay(c: &mut Criterion) {
    let registry = Arc::new(workspace_registry());
    let mut group = c.benchmark_group("replay.commit");

    for case in [Case::Small, Case::Medium] {
        let records = fixtures::snapshot(&registry, case);
        let in_order = records.clone();
        group.bench_function(format!("{}_in_order", case.id()), |b| {
            b.iter_batched_ref(
                || fresh_session(&registry),
                |session| {
                    for record in in_order.iter().cloned() {
                        ops::dispatch(&*session, black_box(record)).expect("dispatch");
                    }
                },
                BatchSize::SmallInput,
            )
        });

        let backwards = reversed(&records);
        group.bench_function(format!("{}_reversed", case.id()), |b| {
            b.iter_batched_ref(
                || fresh_session(&registry),
                |session| {
                    for record in backwards.iter().cloned() {
                        ops::dispatch(&*session, black_box(record)).expect("dispatch");
                    }
                },
                BatchSize::SmallInput,
            )
        });

        let encoded = encode_batch(&records).expect("encode");
        group.bench_function(format!("{}_decode_and_apply", case.id()), |b| {
            b.iter_batched_ref(
                || fresh_session(&registry),
                |session| black_box(decode_and_apply(&encoded, &*session).expect("apply")),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_replay
}
criterion_main!(benches);
