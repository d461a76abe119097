// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in workspace node types.
//!
//! A workspace holds folders, tables and charts. Tables hold columns; every chart owns exactly
//! one legend, created with it.

use chrono::{TimeZone, Utc};

use crate::helpers::{HelperError, HelperRegistry, NodeType};
use crate::model::{Color, EnumType, Graph, NodeId, Point, Rect, Size, Value, ValueKind};

pub const WORKSPACE: &str = "Workspace";
pub const FOLDER: &str = "Folder";
pub const TABLE: &str = "Table";
pub const COLUMN: &str = "Column";
pub const CHART: &str = "Chart";
pub const LEGEND: &str = "Legend";

pub static ALIGNMENT: EnumType =
    EnumType { name: "Alignment", symbols: &["LEFT", "CENTER", "RIGHT"] };
pub static CHART_TYPE: EnumType = EnumType { name: "ChartType", symbols: &["BAR", "LINE", "PIE"] };
pub static LEGEND_POSITION: EnumType =
    EnumType { name: "LegendPosition", symbols: &["TOP", "BOTTOM", "LEFT", "RIGHT"] };

pub fn node_types() -> Vec<NodeType> {
    vec![
        NodeType::new(WORKSPACE)
            .property("name", ValueKind::String)
            .property("focus", ValueKind::Reference)
            .property("modified", ValueKind::DateTime)
            .child(FOLDER)
            .child(TABLE)
            .child(CHART)
            .child(COLUMN),
        NodeType::new(FOLDER)
            .constructor("name", ValueKind::String, true)
            .property("color", ValueKind::Color)
            .property("created", ValueKind::DateTime)
            .child(FOLDER)
            .child(TABLE)
            .child(CHART),
        NodeType::new(TABLE)
            .constructor("name", ValueKind::String, false)
            .property("description", ValueKind::String)
            .property("row_limit", ValueKind::Long)
            .property("row_count", ValueKind::BigInteger)
            .property("data", ValueKind::Binary)
            .child(COLUMN),
        NodeType::new(COLUMN)
            .property("name", ValueKind::String)
            .property("integer", ValueKind::Integer)
            .property("width", ValueKind::Double)
            .property("alignment", ValueKind::Enum(&ALIGNMENT))
            .property("visible", ValueKind::Boolean)
            .property("precision", ValueKind::Short)
            .property("scale", ValueKind::Float)
            .property("total", ValueKind::BigDecimal)
            .property("formatter", ValueKind::ClassRef)
            .property("locale", ValueKind::Locale)
            .property("tags", ValueKind::List),
        NodeType::new(CHART)
            .constructor("source", ValueKind::Reference, true)
            .property("name", ValueKind::String)
            .property("chart_type", ValueKind::Enum(&CHART_TYPE))
            .property("origin", ValueKind::Point)
            .property("bounds", ValueKind::Rect)
            .mandatory_child(LEGEND),
        NodeType::new(LEGEND)
            .property("position", ValueKind::Enum(&LEGEND_POSITION))
            .property("size", ValueKind::Size)
            .property("font_color", ValueKind::Color),
    ]
}

/// Registry with a helper for every built-in type.
pub fn workspace_registry() -> HelperRegistry {
    let mut registry = HelperRegistry::new();
    for node_type in node_types() {
        registry
            .register_type(node_type)
            .expect("built-in node types have distinct tags");
    }
    registry
}

pub fn empty_workspace(root: NodeId) -> Graph {
    Graph::new(root, WORKSPACE)
}

fn id(raw: &str) -> NodeId {
    NodeId::new(raw).expect("built-in demo ids are valid")
}

fn symbol(ty: &'static EnumType, name: &str) -> Value {
    ty.symbol(name).map(Value::Enum).unwrap_or_default()
}

/// A small populated workspace used by the CLI `demo` command, tests and benches.
pub fn demo_workspace(registry: &HelperRegistry) -> Result<Graph, HelperError> {
    let mut graph = empty_workspace(id("root"));
    let root = graph.root_id().clone();
    graph.set_property(&root, "name", Value::from("Quarterly report"))?;

    let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).single().unwrap_or_default();
    let folder = registry.build(
        FOLDER,
        id("f1"),
        vec![
            ("name".into(), Value::from("Sales")),
            ("color".into(), Value::Color(Color::rgb(32, 96, 160))),
            ("created".into(), Value::DateTime(created)),
        ],
    )?;
    graph.insert_subtree(&root, 0, folder)?;

    let table = registry
        .build(
            TABLE,
            id("t1"),
            vec![
                ("name".into(), Value::from("Revenue")),
                ("description".into(), Value::from("Revenue per region, in CHF")),
                ("row_limit".into(), Value::Long(10_000)),
                ("row_count".into(), Value::BigInteger("18446744073709551616".into())),
                ("data".into(), Value::Binary(vec![0xca, 0xfe, 0x00, 0x42])),
            ],
        )?
        .with_child(registry.build(
            COLUMN,
            id("c1"),
            vec![
                ("name".into(), Value::from("Region")),
                ("alignment".into(), symbol(&ALIGNMENT, "LEFT")),
                ("visible".into(), Value::Boolean(true)),
                ("width".into(), Value::Double(120.5)),
                ("locale".into(), Value::Locale("de_CH".into())),
                (
                    "tags".into(),
                    Value::List(vec![Value::from("geo"), Value::from("key, primary")]),
                ),
            ],
        )?)
        .with_child(registry.build(
            COLUMN,
            id("c2"),
            vec![
                ("name".into(), Value::from("Amount")),
                ("integer".into(), Value::Integer(42)),
                ("precision".into(), Value::Short(2)),
                ("scale".into(), Value::Float(0.5)),
                ("total".into(), Value::BigDecimal("1234567.89".into())),
                ("formatter".into(), Value::ClassRef("report.format.Currency".into())),
                ("tags".into(), Value::List(vec![Value::Integer(3), Value::Integer(7)])),
            ],
        )?);
    graph.insert_subtree(&id("f1"), 0, table)?;

    let mut chart = registry.build(
        CHART,
        id("ch1"),
        vec![
            ("source".into(), Value::Reference(id("t1"))),
            ("name".into(), Value::from("Revenue by region")),
            ("chart_type".into(), symbol(&CHART_TYPE, "BAR")),
            ("origin".into(), Value::Point(Point { x: 10, y: 20 })),
            ("bounds".into(), Value::Rect(Rect { x: 10, y: 20, width: 400, height: 300 })),
        ],
    )?;
    if let Some(legend) = chart.children.first_mut() {
        legend.properties.insert("position".into(), symbol(&LEGEND_POSITION, "BOTTOM"));
        legend.properties.insert("size".into(), Value::Size(Size { width: 400, height: 40 }));
        legend.properties.insert("font_color".into(), Value::Color(Color::rgb(0, 0, 0)));
    }
    graph.insert_subtree(&root, 0, chart)?;

    graph.set_property(&root, "focus", Value::Reference(id("c2")))?;
    graph.set_property(&root, "modified", Value::DateTime(created))?;
    Ok(graph)
}
