// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use super::{Graph, GraphError};
use crate::model::fixtures::{attach_recorder, nid, small_tree};
use crate::model::{GraphEvent, Subtree, Value};

#[fixture]
fn graph() -> Graph {
    small_tree()
}

#[rstest]
fn insert_places_children_by_same_type_index(mut graph: Graph) {
    let root = nid("root");
    graph
        .insert_subtree(&root, 0, Subtree::new(nid("a"), "Column"))
        .expect("insert a");
    graph
        .insert_subtree(&root, 0, Subtree::new(nid("b"), "Column"))
        .expect("insert b");

    let columns = graph.children_of_type(&root, "Column");
    assert_eq!(columns, vec![&nid("b"), &nid("a")]);
    // The table is not a column and keeps its own index.
    assert_eq!(graph.sibling_index(&nid("t1")), Some(0));
    assert_eq!(graph.sibling_index(&nid("a")), Some(1));
}

#[rstest]
fn insert_past_end_appends_after_last_sibling_of_type(mut graph: Graph) {
    let index = graph
        .insert_subtree(&nid("t1"), 99, Subtree::new(nid("c3"), "Column"))
        .expect("insert");
    assert_eq!(index, 2);
    assert_eq!(graph.get(&nid("t1")).expect("t1").children(), &[nid("c1"), nid("c2"), nid("c3")]);
}

#[rstest]
fn insert_rejects_duplicate_ids(mut graph: Graph) {
    let err = graph
        .insert_subtree(&nid("root"), 0, Subtree::new(nid("c1"), "Column"))
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateId { node_id: nid("c1") });
    assert_eq!(graph.len(), 4);
}

#[rstest]
fn remove_child_cascades_and_reports_subtree(mut graph: Graph) {
    let recorder = attach_recorder(&mut graph);

    let removal = graph.remove_child(&nid("root"), &nid("t1")).expect("remove");
    assert_eq!((removal.index, removal.position), (0, 0));
    let removed = removal.subtree;
    assert_eq!(removed.ids(), vec![nid("t1"), nid("c1"), nid("c2")]);
    assert!(!graph.contains(&nid("c1")));
    assert_eq!(graph.len(), 1);

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GraphEvent::ChildRemoved { child, .. } if child == &removed));
}

#[rstest]
fn restore_puts_subtrees_back_at_their_position(mut graph: Graph) {
    let root = nid("root");
    graph.insert_subtree(&root, 0, Subtree::new(nid("a"), "Column")).expect("insert a");
    assert_eq!(graph.get(&root).expect("root").children(), &[nid("t1"), nid("a")]);
    let before = graph.subtree(&root);
    let recorder = attach_recorder(&mut graph);

    let removal = graph.remove_child(&root, &nid("t1")).expect("remove");
    assert_eq!((removal.index, removal.position), (0, 0));
    let index = graph.restore_subtree(&root, removal.position, removal.subtree).expect("restore");
    assert_eq!(index, 0);
    assert_eq!(graph.subtree(&root), before);
    assert!(matches!(
        &recorder.events()[1],
        GraphEvent::ChildAdded { index: 0, child, .. } if child.id == nid("t1")
    ));

    let index = graph
        .restore_subtree(&root, 99, Subtree::new(nid("b"), "Column"))
        .expect("restore past end");
    assert_eq!(index, 1);
    assert_eq!(graph.get(&root).expect("root").children(), &[nid("t1"), nid("a"), nid("b")]);
    let err = graph.restore_subtree(&root, 0, Subtree::new(nid("b"), "Column")).unwrap_err();
    assert_eq!(err, GraphError::DuplicateId { node_id: nid("b") });
}

#[rstest]
fn remove_child_rejects_wrong_parent(mut graph: Graph) {
    let err = graph.remove_child(&nid("root"), &nid("c1")).unwrap_err();
    assert_eq!(err, GraphError::NotAChild { parent: nid("root"), child: nid("c1") });

    let err = graph.remove_child(&nid("root"), &nid("missing")).unwrap_err();
    assert_eq!(err, GraphError::NodeNotFound { node_id: nid("missing") });
}

#[rstest]
fn set_property_raises_event_only_on_change(mut graph: Graph) {
    let recorder = attach_recorder(&mut graph);
    let c1 = nid("c1");

    let old = graph.set_property(&c1, "name", Value::from("Full name")).expect("set");
    assert_eq!(old, Value::from("Name"));
    graph.set_property(&c1, "name", Value::from("Full name")).expect("set again");
    graph.set_property(&c1, "name", Value::Null).expect("clear");

    assert_eq!(graph.get(&c1).expect("c1").property("name"), None);
    assert_eq!(
        recorder.events(),
        vec![
            GraphEvent::PropertyChanged {
                node: c1.clone(),
                name: "name".into(),
                old: Value::from("Name"),
                new: Value::from("Full name"),
            },
            GraphEvent::PropertyChanged {
                node: c1,
                name: "name".into(),
                old: Value::from("Full name"),
                new: Value::Null,
            },
        ]
    );
}

#[rstest]
fn change_id_requires_loading_and_rewrites_references(mut graph: Graph) {
    graph
        .set_property(&nid("root"), "focus", Value::Reference(nid("c2")))
        .expect("set reference");

    let err = graph.change_id(&nid("c2"), nid("age")).unwrap_err();
    assert_eq!(err, GraphError::IdChangeOutsideLoading { node_id: nid("c2") });

    graph.begin_loading();
    graph.change_id(&nid("c2"), nid("age")).expect("change id");
    graph.end_loading();

    assert!(!graph.contains(&nid("c2")));
    assert_eq!(graph.parent_of(&nid("age")), Some(&nid("t1")));
    assert_eq!(graph.get(&nid("t1")).expect("t1").children(), &[nid("c1"), nid("age")]);
    assert_eq!(
        graph.get(&nid("root")).expect("root").property("focus"),
        Some(&Value::Reference(nid("age")))
    );
}

#[rstest]
fn descendants_are_pre_order(graph: Graph) {
    assert_eq!(
        graph.descendants(&nid("root")),
        vec![nid("root"), nid("t1"), nid("c1"), nid("c2")]
    );
}

#[rstest]
fn removed_listener_stops_receiving_events(mut graph: Graph) {
    let recorder = attach_recorder(&mut graph);
    let as_listener: std::sync::Arc<dyn crate::model::GraphListener> = recorder.clone();
    assert!(graph.remove_listener(&as_listener));

    graph.begin("ignored");
    graph.commit();
    assert!(recorder.events().is_empty());
}
