// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};

use super::SessionPersister;
use crate::convert::{WireKind, WirePrimitive};
use crate::model::fixtures::{attach_recorder, nid};
use crate::model::{GraphEvent, NodeId, Value};
use crate::ops::{self, Method, OperationRecord};
use crate::persist::{DependencyError, PersistError, Persister};
use crate::schema::{empty_workspace, workspace_registry};

#[fixture]
fn session() -> SessionPersister {
    let graph = Arc::new(Mutex::new(empty_workspace(nid("root"))));
    SessionPersister::new(graph, Arc::new(workspace_registry()))
}

fn create(parent: &str, type_tag: &str, id: &str, index: usize) -> OperationRecord {
    OperationRecord::CreateNode {
        parent_id: nid(parent),
        type_tag: type_tag.into(),
        node_id: nid(id),
        index,
    }
}

fn text(value: &str) -> WirePrimitive {
    WirePrimitive::String(value.to_owned())
}

fn set(id: &str, name: &str, value: WirePrimitive) -> OperationRecord {
    OperationRecord::set_property(nid(id), name, value)
}

fn change(id: &str, name: &str, old: WirePrimitive, new: WirePrimitive) -> OperationRecord {
    OperationRecord::set_property_conditional(nid(id), name, old, new)
}

fn transact(session: &SessionPersister, records: Vec<OperationRecord>) -> Result<(), PersistError> {
    session.begin()?;
    for record in records {
        if let Err(err) = ops::dispatch(session, record) {
            session.rollback();
            return Err(err);
        }
    }
    session.commit()
}

fn property(session: &SessionPersister, id: &str, name: &str) -> Value {
    let graph = session.graph().lock().expect("graph lock");
    graph.get(&nid(id)).and_then(|node| node.property(name)).cloned().unwrap_or_default()
}

fn children(session: &SessionPersister, id: &str) -> Vec<NodeId> {
    let graph = session.graph().lock().expect("graph lock");
    graph.get(&nid(id)).map(|node| node.children().to_vec()).unwrap_or_default()
}

fn contains(session: &SessionPersister, id: &str) -> bool {
    session.graph().lock().expect("graph lock").contains(&nid(id))
}

fn dependency(err: &PersistError) -> &DependencyError {
    match err {
        PersistError::Dependency { reason, .. } => reason,
        other => panic!("expected a dependency error, got {other:?}"),
    }
}

#[rstest]
fn column_batch_builds_the_column(session: SessionPersister) {
    transact(
        &session,
        vec![
            create("root", "Column", "c1", 0),
            set("c1", "name", text("Age")),
            set("c1", "integer", WirePrimitive::Integer(42)),
        ],
    )
    .expect("commit");

    assert_eq!(children(&session, "root"), vec![nid("c1")]);
    assert_eq!(property(&session, "c1", "name"), Value::from("Age"));
    assert_eq!(property(&session, "c1", "integer"), Value::Integer(42));
    assert_eq!(session.depth(), 0);
}

#[rstest]
fn sibling_indices_are_honoured(session: SessionPersister) {
    transact(
        &session,
        vec![create("root", "Table", "a", 0), create("root", "Table", "b", 0)],
    )
    .expect("commit");
    assert_eq!(children(&session, "root"), vec![nid("b"), nid("a")]);
}

#[rstest]
fn children_may_arrive_before_their_parent(session: SessionPersister) {
    transact(
        &session,
        vec![
            create("t1", "Column", "c1", 0),
            set("c1", "name", text("Region")),
            create("root", "Table", "t1", 0),
        ],
    )
    .expect("commit");
    assert_eq!(children(&session, "t1"), vec![nid("c1")]);
    assert_eq!(property(&session, "c1", "name"), Value::from("Region"));
}

#[rstest]
fn constructor_references_wait_for_their_target(session: SessionPersister) {
    transact(
        &session,
        vec![
            create("root", "Chart", "ch1", 0),
            set("ch1", "source", WirePrimitive::Reference("t1".into())),
            set("ch1", "name", text("Revenue")),
            create("ch1", "Legend", "ch1.legend", 0),
            set("ch1.legend", "position", text("TOP")),
            create("root", "Table", "t1", 0),
            set("root", "focus", WirePrimitive::Reference("ch1".into())),
        ],
    )
    .expect("commit");

    assert_eq!(property(&session, "ch1", "source"), Value::Reference(nid("t1")));
    assert_eq!(property(&session, "ch1", "name"), Value::from("Revenue"));
    assert_eq!(children(&session, "ch1"), vec![nid("ch1.legend")]);
    assert!(matches!(property(&session, "ch1.legend", "position"), Value::Enum(_)));
    assert_eq!(property(&session, "root", "focus"), Value::Reference(nid("ch1")));
}

#[rstest]
fn removing_a_child_after_its_parent_is_harmless(session: SessionPersister) {
    transact(
        &session,
        vec![create("root", "Table", "t1", 0), create("t1", "Column", "c1", 0)],
    )
    .expect("setup");

    transact(
        &session,
        vec![
            OperationRecord::RemoveNode { parent_id: nid("root"), node_id: nid("t1") },
            OperationRecord::RemoveNode { parent_id: nid("t1"), node_id: nid("c1") },
        ],
    )
    .expect("commit");
    assert!(!contains(&session, "t1"));
    assert!(!contains(&session, "c1"));
}

#[rstest]
fn nested_commits_replay_once(session: SessionPersister) {
    session.begin().expect("outer");
    session.begin().expect("inner");
    ops::dispatch(&session, create("root", "Column", "c1", 0)).expect("buffer");
    session.commit().expect("inner commit");
    assert!(!contains(&session, "c1"));
    assert_eq!(session.buffered(), 1);

    session.commit().expect("outer commit");
    assert!(contains(&session, "c1"));
    assert_eq!(session.buffered(), 0);
}

#[rstest]
fn rollback_forgets_everything(session: SessionPersister) {
    session.begin().expect("begin");
    session.begin().expect("begin");
    ops::dispatch(&session, create("root", "Column", "c1", 0)).expect("buffer");
    session.rollback();
    assert_eq!(session.depth(), 0);
    assert_eq!(session.buffered(), 0);
    assert!(!contains(&session, "c1"));
}

#[rstest]
fn buffering_needs_a_transaction(session: SessionPersister) {
    let err = ops::dispatch(&session, create("root", "Column", "c1", 0)).expect_err("state");
    assert!(matches!(err, PersistError::NotInTransaction { operation: Method::CreateNode }));
    assert!(matches!(session.commit(), Err(PersistError::NotInTransaction { .. })));
    assert_eq!(session.buffered(), 0);
}

#[rstest]
fn matching_conditionals_apply(session: SessionPersister) {
    transact(&session, vec![create("root", "Column", "c1", 0), set("c1", "name", text("Age"))])
        .expect("setup");
    transact(&session, vec![change("c1", "name", text("Age"), text("Years"))]).expect("commit");
    assert_eq!(property(&session, "c1", "name"), Value::from("Years"));

    let widen = change("c1", "width", WirePrimitive::Null, WirePrimitive::Double(80.0));
    transact(&session, vec![widen]).expect("unset matches null");
    assert_eq!(property(&session, "c1", "width"), Value::Double(80.0));
}

#[rstest]
fn stale_conditionals_are_rejected_eagerly(session: SessionPersister) {
    transact(&session, vec![create("root", "Column", "c1", 0), set("c1", "name", text("Age"))])
        .expect("setup");

    session.begin().expect("begin");
    let err = session
        .set_property_conditional(
            nid("c1"),
            "name".into(),
            WireKind::String,
            text("Stale"),
            text("Years"),
        )
        .expect_err("conflict");
    assert!(matches!(err, PersistError::Conflict { .. }));
    assert_eq!(err.node_id(), Some(&nid("c1")));
    assert_eq!(session.depth(), 1);
    assert_eq!(session.buffered(), 0);

    session.rollback();
    assert_eq!(property(&session, "c1", "name"), Value::from("Age"));
}

#[rstest]
fn late_conflicts_restore_the_graph(session: SessionPersister) {
    transact(&session, vec![create("root", "Column", "c1", 0), set("c1", "name", text("Age"))])
        .expect("setup");
    let recorder = attach_recorder(&mut session.graph().lock().expect("graph lock"));

    let err = transact(
        &session,
        vec![
            create("root", "Column", "c2", 0),
            set("c1", "name", text("Other")),
            change("c1", "name", text("Age"), text("Years")),
        ],
    )
    .expect_err("conflict at commit");

    assert!(matches!(err, PersistError::Conflict { .. }));
    assert_eq!(err.node_id(), Some(&nid("c1")));
    assert!(!contains(&session, "c2"));
    assert_eq!(property(&session, "c1", "name"), Value::from("Age"));
    assert!(matches!(
        recorder.events().last(),
        Some(GraphEvent::TransactionRolledBack { .. })
    ));
    assert_eq!(session.depth(), 0);
}

#[rstest]
fn failed_commits_put_removed_nodes_back_in_place(session: SessionPersister) {
    transact(
        &session,
        vec![
            create("root", "Table", "t1", 0),
            create("t1", "Column", "c2", 0),
            create("root", "Column", "c1", 0),
            set("c1", "name", text("Age")),
        ],
    )
    .expect("setup");
    let root = nid("root");
    let before = session.graph().lock().expect("graph lock").subtree(&root);
    assert_eq!(children(&session, "root"), vec![nid("t1"), nid("c1")]);

    transact(
        &session,
        vec![
            OperationRecord::RemoveNode { parent_id: nid("root"), node_id: nid("t1") },
            set("c1", "name", text("Other")),
            change("c1", "name", text("Age"), text("Years")),
        ],
    )
    .expect_err("conflict at commit");

    assert_eq!(children(&session, "root"), vec![nid("t1"), nid("c1")]);
    assert_eq!(session.graph().lock().expect("graph lock").subtree(&root), before);
}

#[rstest]
fn unknown_types_are_dependency_errors(session: SessionPersister) {
    let err = transact(&session, vec![create("root", "Gizmo", "g1", 0)]).expect_err("unknown");
    assert!(matches!(dependency(&err), DependencyError::UnknownType { .. }));
    assert_eq!(err.node_id(), Some(&nid("g1")));
}

#[rstest]
fn missing_parents_are_dependency_errors(session: SessionPersister) {
    let err = transact(
        &session,
        vec![create("root", "Column", "c1", 0), create("ghost", "Column", "c2", 0)],
    )
    .expect_err("missing parent");
    assert_eq!(dependency(&err), &DependencyError::MissingParent { parent_id: nid("ghost") });
    assert_eq!(err.node_id(), Some(&nid("c2")));
    assert!(!contains(&session, "c1"));
}

#[rstest]
fn incompatible_children_are_rejected(session: SessionPersister) {
    let err = transact(
        &session,
        vec![create("root", "Column", "c1", 0), create("c1", "Column", "c2", 0)],
    )
    .expect_err("column under column");
    assert!(matches!(dependency(&err), DependencyError::IncompatibleChild { .. }));
}

#[rstest]
fn required_constructor_properties_must_be_supplied(session: SessionPersister) {
    let err = transact(&session, vec![create("root", "Folder", "f1", 0)]).expect_err("nameless");
    assert_eq!(
        dependency(&err),
        &DependencyError::MissingConstructorProperty { property: "name".into() }
    );
}

#[rstest]
fn references_must_resolve_by_commit(session: SessionPersister) {
    let dangling = set("root", "focus", WirePrimitive::Reference("nowhere".into()));
    let err = transact(&session, vec![dangling]).expect_err("dangling");
    assert_eq!(
        dependency(&err),
        &DependencyError::UnresolvedReference { target: nid("nowhere") }
    );
    assert_eq!(property(&session, "root", "focus"), Value::Null);
}

#[rstest]
fn unknown_properties_are_rejected(session: SessionPersister) {
    let err = transact(
        &session,
        vec![create("root", "Column", "c1", 0), set("c1", "colour", text("red"))],
    )
    .expect_err("unknown property");
    assert!(matches!(dependency(&err), DependencyError::UnknownProperty { .. }));
    assert!(!contains(&session, "c1"));
}

#[rstest]
fn wrong_parents_are_rejected_on_removal(session: SessionPersister) {
    transact(
        &session,
        vec![create("root", "Table", "t1", 0), create("t1", "Column", "c1", 0)],
    )
    .expect("setup");
    let err = transact(
        &session,
        vec![OperationRecord::RemoveNode { parent_id: nid("root"), node_id: nid("c1") }],
    )
    .expect_err("wrong parent");
    assert_eq!(dependency(&err), &DependencyError::ParentMismatch { expected: nid("root") });
    assert!(contains(&session, "c1"));
}
