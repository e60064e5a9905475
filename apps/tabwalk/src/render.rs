// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Render query results as console lines.
// Author: Lukas Bower

//! Console rendering of query results.

use tabwalk_core::{QueryResult, Table, TableSet, Varbind};

/// Render one identifier/value pair.
#[must_use]
pub fn render_varbind(varbind: &Varbind) -> String {
    format!("{:<30} --> {:>30}", varbind.oid.to_string(), varbind.value)
}

/// Render every materialised cell of a table in row order.
#[must_use]
pub fn render_table(table: &Table) -> Vec<String> {
    let mut lines: Vec<String> = table
        .present_rows()
        .flat_map(|(_, row)| {
            row.iter()
                .map(|(oid, value)| format!("{:<30} --> {:>30}", oid.to_string(), value))
        })
        .collect();
    if table.is_truncated() {
        lines.push(format!("(walk truncated after row {})", table.len()));
    }
    lines
}

/// Render a table set with one header per requested root.
#[must_use]
pub fn render_table_set(set: &TableSet) -> Vec<String> {
    let mut lines = Vec::new();
    for (position, table) in set.iter().enumerate() {
        lines.push(format!("table {position}:"));
        match table {
            Some(table) => lines.extend(render_table(table)),
            None => lines.push("(no response)".to_owned()),
        }
    }
    lines
}

/// Render any query result.
#[must_use]
pub fn render_result(result: &QueryResult) -> Vec<String> {
    match result {
        QueryResult::Value(varbind) => vec![render_varbind(varbind)],
        QueryResult::ValueList(varbinds) => varbinds.iter().map(render_varbind).collect(),
        QueryResult::Table(table) => render_table(table),
        QueryResult::TableSet(set) => render_table_set(set),
    }
}
