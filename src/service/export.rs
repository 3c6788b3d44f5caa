//! Spreadsheet-grid assembly for report export.

use serde_json::Value as Json;

use crate::catalog::FieldCatalogEntry;

/// One export column: display label, raw per-row values, optional total.
#[derive(Debug, Clone)]
pub struct ExportField {
    pub label: String,
    pub values: Vec<Json>,
    pub total: Option<f64>,
}

/// Aggregate a field's values according to its catalog aggregation type.
/// Fields without one contribute no total.
pub fn compute_total(entry: &FieldCatalogEntry, values: &[Json]) -> Option<f64> {
    let aggregation = entry.aggregation_type.as_deref()?;
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    match aggregation.to_ascii_uppercase().as_str() {
        "SUM" => Some(numbers.iter().sum()),
        "AVG" => {
            if numbers.is_empty() {
                Some(0.0)
            } else {
                Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        "COUNT" => Some(values.len() as f64),
        _ => None,
    }
}

/// Assemble the grid: a header row of labels, one row per index across the
/// longest column with blanks padding shorter ones, and a totals row when
/// any field carries a total.
pub fn build_grid(fields: &[ExportField]) -> Vec<Vec<String>> {
    let mut grid = Vec::new();
    grid.push(fields.iter().map(|f| f.label.clone()).collect());

    let depth = fields.iter().map(|f| f.values.len()).max().unwrap_or(0);
    for i in 0..depth {
        grid.push(
            fields
                .iter()
                .map(|f| f.values.get(i).map(cell_text).unwrap_or_default())
                .collect(),
        );
    }

    if fields.iter().any(|f| f.total.is_some()) {
        grid.push(
            fields
                .iter()
                .map(|f| f.total.map(|t| t.to_string()).unwrap_or_default())
                .collect(),
        );
    }
    grid
}

pub fn render_csv(fields: &[ExportField]) -> Vec<u8> {
    let grid = build_grid(fields);
    let mut out = String::new();
    for row in &grid {
        let cells: Vec<String> = row.iter().map(|cell| escape_csv(cell)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

fn cell_text(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_csv(cell: &str) -> String {
    if cell.chars().any(|c| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
