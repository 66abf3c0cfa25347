//! JSON state files: one record per line, keyed by line index.
//!
//! ```json
//! { "0": { "time": "2017-09-08T02:10:07.250",
//!          "trace": { "columns": ["x", "y", "z", "rho"],
//!                     "data": [[1.0, 2.0, 3.0, 0.5], ...] } } }
//! ```

use std::io::{Read, Write};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{FieldlinesState, Model};
use crate::error::FieldlinesError;

const POSITION_COLUMNS: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Serialize, Deserialize)]
struct JsonLine {
    time: String,
    trace: JsonTrace,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonTrace {
    columns: Vec<String>,
    data: Vec<Vec<f32>>,
}

/// Sort record keys numerically when every key is an index, otherwise
/// keep the map's lexicographic order.
fn ordered_records(
    records: serde_json::Map<String, serde_json::Value>,
) -> Vec<(String, serde_json::Value)> {
    let mut entries: Vec<(String, serde_json::Value)> = records.into_iter().collect();
    if entries.iter().all(|(key, _)| key.parse::<u64>().is_ok()) {
        entries.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));
    }
    entries
}

pub(super) fn read_json(
    reader: impl Read,
    model: Model,
    coord_to_meters: f32,
) -> Result<FieldlinesState, FieldlinesError> {
    let records: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(reader)?;
    let mut lines = Vec::with_capacity(records.len());
    for (key, value) in ordered_records(records) {
        let line: JsonLine = serde_json::from_value(value).map_err(|e| {
            FieldlinesError::MalformedFile(format!("line '{key}': {e}"))
        })?;
        lines.push((key, line));
    }

    let Some((_, first)) = lines.first() else {
        return Err(FieldlinesError::MalformedFile(
            "JSON state holds no lines".to_owned(),
        ));
    };
    if first.trace.columns.len() < POSITION_COLUMNS.len() {
        return Err(FieldlinesError::MalformedFile(
            "'columns' must start with the variables 'x', 'y' and 'z'".to_owned(),
        ));
    }
    let n_columns = first.trace.columns.len();

    let mut state = FieldlinesState::new();
    state.model = model;
    state.trigger_time = crate::time::j2000_from_iso(&first.time)?;
    state.set_extra_quantity_names(first.trace.columns[POSITION_COLUMNS.len()..].to_vec());

    for (key, line) in lines {
        let mut vertices = Vec::with_capacity(line.trace.data.len());
        for (row_index, row) in line.trace.data.iter().enumerate() {
            if row.len() != n_columns {
                return Err(FieldlinesError::MalformedFile(format!(
                    "line '{key}' row {row_index} has {} values, expected {n_columns}",
                    row.len()
                )));
            }
            vertices.push(coord_to_meters * Vec3::new(row[0], row[1], row[2]));
            for (quantity, &value) in state
                .extra_quantities
                .iter_mut()
                .zip(&row[POSITION_COLUMNS.len()..])
            {
                quantity.push(value);
            }
        }
        state.add_line(&mut vertices);
    }
    Ok(state)
}

pub(super) fn write_json(
    state: &FieldlinesState,
    writer: &mut impl Write,
) -> Result<(), FieldlinesError> {
    let time = crate::time::iso_from_j2000(state.trigger_time)?;
    let columns: Vec<String> = POSITION_COLUMNS
        .iter()
        .map(|c| (*c).to_owned())
        .chain(state.extra_quantity_names.iter().cloned())
        .collect();

    let mut records = serde_json::Map::with_capacity(state.n_lines());
    for line_index in 0..state.n_lines() {
        let range = state.line_range(line_index).ok_or_else(|| {
            FieldlinesError::InconsistentState(format!("line {line_index} has no range"))
        })?;
        let mut data = Vec::with_capacity(range.len());
        for point in range {
            let p = state.vertex_positions.get(point).ok_or_else(|| {
                FieldlinesError::InconsistentState(format!("vertex {point} out of range"))
            })?;
            let mut row = vec![p.x, p.y, p.z];
            for quantity in &state.extra_quantities {
                row.push(quantity.get(point).copied().unwrap_or(f32::NAN));
            }
            data.push(row);
        }
        let line = JsonLine {
            time: time.clone(),
            trace: JsonTrace {
                columns: columns.clone(),
                data,
            },
        };
        let _ = records.insert(line_index.to_string(), serde_json::to_value(line)?);
    }

    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writer.write_all(b"\n")?;
    Ok(())
}
