// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};

use super::event::{GraphEvent, GraphListener};
use super::graph::Graph;
use super::ids::NodeId;
use super::node::Subtree;

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

/// Listener that keeps every event it sees.
#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    events: Mutex<Vec<GraphEvent>>,
}

impl RecordingListener {
    pub(crate) fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().expect("recording listener lock poisoned").clone()
    }
}

impl GraphListener for RecordingListener {
    fn on_event(&self, event: &GraphEvent) {
        self.events.lock().expect("recording listener lock poisoned").push(event.clone());
    }
}

/// `root` with one table `t1` holding columns `c1`, `c2`.
pub(crate) fn small_tree() -> Graph {
    let mut graph = Graph::new(nid("root"), "Workspace");
    let table = Subtree::new(nid("t1"), "Table")
        .with_property("name", "People")
        .with_child(Subtree::new(nid("c1"), "Column").with_property("name", "Name"))
        .with_child(Subtree::new(nid("c2"), "Column").with_property("name", "Age"));
    graph.insert_subtree(&nid("root"), 0, table).expect("insert table");
    graph
}

pub(crate) fn attach_recorder(graph: &mut Graph) -> Arc<RecordingListener> {
    let recorder = Arc::new(RecordingListener::default());
    graph.add_listener(recorder.clone());
    recorder
}
