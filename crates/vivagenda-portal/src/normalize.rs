//! Normalization from the raw gadget payload to [`vivagenda_core::AgendaTable`].
//!
//! Fails soft by design: structural anomalies degrade to an empty table and
//! individual bad rows are dropped with a warning. An empty table means
//! "no usable data", which callers must present distinctly from a fetch
//! error even though neither produces records.

use chrono::NaiveDate;
use serde_json::Value;

use vivagenda_core::{AgendaRecord, AgendaTable, MIN_ROW_WIDTH};

// Raw cell positions, identifier included.
const IDX_UNIDADE: usize = 1;
const IDX_ESPECIALIDADE: usize = 2;
const IDX_PROFISSIONAL: usize = 3;
const IDX_SERVICO: usize = 4;
const IDX_ORIGEM: usize = 5;
const IDX_TIPO: usize = 6;
const IDX_HORA: usize = 7;
const IDX_AGENDA_DIRETA: usize = 8;
const IDX_DATA: usize = 9;
const IDX_DATA_CADASTRO: usize = 10;
const IDX_PROFISSIONAL_CADASTRO: usize = 11;
const IDX_TIPO_SERVICO: usize = 12;
const IDX_OBS: usize = 13;

/// Converts a raw payload into the canonical table.
///
/// - `None`, a non-object, a missing or non-array `"data"` key, and an
///   empty array all yield an empty table.
/// - Rows that are not arrays, are narrower than [`MIN_ROW_WIDTH`], or
///   whose date cell does not parse day-first are dropped individually.
/// - Cell 0 (the portal's `DT_RowId`) is always discarded.
/// - Rows wider than the canonical schema keep only the canonical cells;
///   rows between [`MIN_ROW_WIDTH`] and full width yield records whose
///   trailing audit fields are `None` (partial schema).
#[must_use]
pub fn normalize(payload: Option<&Value>) -> AgendaTable {
    let Some(rows) = payload.and_then(|v| v.get("data")).and_then(Value::as_array) else {
        tracing::debug!("payload has no usable \"data\" array, returning empty table");
        return AgendaTable::default();
    };

    let mut table = AgendaTable::default();
    for (idx, row) in rows.iter().enumerate() {
        let Some(cells) = row.as_array() else {
            tracing::warn!(row = idx, "skipping non-array row");
            continue;
        };
        if cells.len() < MIN_ROW_WIDTH {
            tracing::warn!(
                row = idx,
                width = cells.len(),
                "skipping row too narrow to carry the appointment date"
            );
            continue;
        }

        let raw_date = cell_text(cells.get(IDX_DATA));
        let Some(data) = parse_day_first(&raw_date) else {
            tracing::warn!(row = idx, raw_date = %raw_date, "skipping row with unparsable date");
            continue;
        };

        table.push(AgendaRecord {
            unidade: cell_text(cells.get(IDX_UNIDADE)),
            especialidade: cell_text(cells.get(IDX_ESPECIALIDADE)),
            profissional: cell_text(cells.get(IDX_PROFISSIONAL)),
            servico: cell_text(cells.get(IDX_SERVICO)),
            origem: cell_text(cells.get(IDX_ORIGEM)),
            tipo: cell_text(cells.get(IDX_TIPO)),
            hora: cell_text(cells.get(IDX_HORA)),
            agenda_direta: cell_text(cells.get(IDX_AGENDA_DIRETA)),
            data,
            data_cadastro: opt_cell_text(cells.get(IDX_DATA_CADASTRO)),
            profissional_cadastro: opt_cell_text(cells.get(IDX_PROFISSIONAL_CADASTRO)),
            tipo_servico: opt_cell_text(cells.get(IDX_TIPO_SERVICO)),
            obs: opt_cell_text(cells.get(IDX_OBS)),
        });
    }
    table
}

/// Parses the appointment date. Day-first (`31/12/2023`) is the portal's
/// native format; ISO (`2023-12-31`) shows up on some gadget configurations.
fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Renders a scalar cell as text. Strings come through verbatim, `null`
/// and absent cells become the empty string, other scalars keep their JSON
/// rendering.
fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn opt_cell_text(cell: Option<&Value>) -> Option<String> {
    cell.map(|value| cell_text(Some(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use vivagenda_core::CANONICAL_COLUMNS;

    fn full_row() -> Value {
        json!([
            "1",
            "Centro",
            "Clinico",
            "Dr. A",
            "Consulta",
            "Online",
            "Normal",
            "09:00",
            "Sim",
            "01/06/2023",
            "15/05/2023",
            "Sistema",
            "Consulta",
            ""
        ])
    }

    #[test]
    fn normalizes_a_full_width_row() {
        let payload = json!({ "data": [full_row()] });
        let table = normalize(Some(&payload));
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert_eq!(record.unidade, "Centro");
        assert_eq!(record.profissional, "Dr. A");
        assert_eq!(record.hora, "09:00");
        assert_eq!(record.data, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(record.data_cadastro.as_deref(), Some("15/05/2023"));
        assert_eq!(record.obs.as_deref(), Some(""));
    }

    #[test]
    fn drops_the_identifier_column() {
        let payload = json!({ "data": [full_row()] });
        let table = normalize(Some(&payload));
        let json = serde_json::to_value(&table.records()[0]).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("DT_RowId"));
        assert_eq!(obj.len(), CANONICAL_COLUMNS.len());
        for column in CANONICAL_COLUMNS {
            assert!(obj.contains_key(column), "missing column {column}");
        }
    }

    #[test]
    fn none_and_empty_object_yield_empty_tables() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&json!({}))).is_empty());
    }

    #[test]
    fn non_array_data_yields_empty_table() {
        assert!(normalize(Some(&json!({ "data": "oops" }))).is_empty());
        assert!(normalize(Some(&json!({ "data": {} }))).is_empty());
    }

    #[test]
    fn empty_data_array_yields_empty_table() {
        assert!(normalize(Some(&json!({ "data": [] }))).is_empty());
    }

    #[test]
    fn invalid_calendar_date_drops_the_row() {
        let payload = json!({
            "data": [["1", "U", "E", "P", "S", "O", "T", "H", "A", "31/02/2023", "..."]]
        });
        assert_eq!(normalize(Some(&payload)).len(), 0);
    }

    #[test]
    fn row_count_equals_count_of_parsable_dates() {
        let mut bad = full_row();
        bad[9] = json!("not a date");
        let payload = json!({ "data": [full_row(), bad, full_row()] });
        assert_eq!(normalize(Some(&payload)).len(), 2);
    }

    #[test]
    fn narrow_row_with_date_yields_partial_schema() {
        // Ten cells: enough for the date, none of the audit fields.
        let payload = json!({
            "data": [["1", "Centro", "Clinico", "Dr. A", "Consulta", "Online",
                      "Normal", "09:00", "Sim", "01/06/2023"]]
        });
        let table = normalize(Some(&payload));
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert!(record.data_cadastro.is_none());
        assert!(record.profissional_cadastro.is_none());
        assert!(record.tipo_servico.is_none());
        assert!(record.obs.is_none());
    }

    #[test]
    fn row_below_minimum_width_is_dropped() {
        let payload = json!({ "data": [["1", "Centro", "Clinico"]] });
        assert!(normalize(Some(&payload)).is_empty());
    }

    #[test]
    fn non_array_row_is_dropped_not_fatal() {
        let payload = json!({ "data": [42, full_row()] });
        assert_eq!(normalize(Some(&payload)).len(), 1);
    }

    #[test]
    fn iso_dates_are_accepted() {
        let mut row = full_row();
        row[9] = json!("2023-06-01");
        let payload = json!({ "data": [row] });
        let table = normalize(Some(&payload));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.records()[0].data,
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );
    }

    #[test]
    fn non_string_scalars_are_rendered() {
        let mut row = full_row();
        row[1] = json!(7); // unidade arrives as a bare number on some gadgets
        row[13] = json!(null);
        let payload = json!({ "data": [row] });
        let table = normalize(Some(&payload));
        assert_eq!(table.records()[0].unidade, "7");
        assert_eq!(table.records()[0].obs.as_deref(), Some(""));
    }
}
