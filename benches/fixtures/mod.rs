// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use treesync::convert::TypeConverter;
use treesync::helpers::{snapshot_records, HelperRegistry};
use treesync::model::{Graph, NodeId, Value};
use treesync::ops::OperationRecord;
use treesync::schema::{self, empty_workspace};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// 4 tables x 8 columns.
    Small,
    /// 32 tables x 24 columns, plus one chart per table.
    Medium,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
        }
    }

    fn shape(self) -> (usize, usize, bool) {
        match self {
            Self::Small => (4, 8, false),
            Self::Medium => (32, 24, true),
        }
    }
}

fn id(raw: String) -> NodeId {
    NodeId::new(raw).expect("fixture id")
}

pub fn workspace(registry: &HelperRegistry, case: Case) -> Graph {
    let (tables, columns, charts) = case.shape();
    let mut graph = empty_workspace(id("root".to_owned()));
    let root = graph.root_id().clone();
    for t in 0..tables {
        let table_id = id(format!("t{t}"));
        let mut table = registry
            .build(schema::TABLE, table_id.clone(), vec![("name".into(), Value::from("Table"))])
            .expect("table");
        for c in 0..columns {
            let column = registry
                .build(
                    schema::COLUMN,
                    id(format!("t{t}c{c}")),
                    vec![
                        ("name".into(), Value::String(format!("Column {c}"))),
                        ("integer".into(), Value::Integer(c as i32 * 7)),
                        ("width".into(), Value::Double(40.0 + c as f64)),
                        ("visible".into(), Value::Boolean(c % 3 != 0)),
                        ("tags".into(), Value::List(vec![Value::from("a, b"), Value::from("c")])),
                    ],
                )
                .expect("column");
            table = table.with_child(column);
        }
        graph.insert_subtree(&root, t, table).expect("insert table");

        if charts {
            let chart = registry
                .build(
                    schema::CHART,
                    id(format!("ch{t}")),
                    vec![("source".into(), Value::Reference(table_id))],
                )
                .expect("chart");
            graph.insert_subtree(&root, t, chart).expect("insert chart");
        }
    }
    graph
}

pub fn snapshot(registry: &HelperRegistry, case: Case) -> Vec<OperationRecord> {
    snapshot_records(&workspace(registry, case), registry, &TypeConverter::new())
        .expect("snapshot")
}
