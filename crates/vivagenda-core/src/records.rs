//! Canonical row and table types for the normalized appointment schedule.
//!
//! ## Observed shape from the live portal
//!
//! The paginated gadget endpoint returns `{"data": [[...], ...]}` where each
//! row is a fixed-width array of scalars. Cell 0 is a synthetic `DT_RowId`
//! used by the portal's table widget and is dropped during normalization.
//! The remaining cells map positionally onto [`CANONICAL_COLUMNS`].
//!
//! The four trailing audit cells (registration date, registering
//! practitioner, service type, free-text notes) are absent from some gadget
//! configurations; they are modeled as `Option<String>` so a narrower row
//! still yields a usable record instead of failing the whole table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column headers of the normalized table, in output order. The portal's
/// `DT_RowId` identifier is intentionally not part of this set.
///
/// The downstream spreadsheet exporter maps these 1:1 onto sheet headers,
/// so the names and their order are a stable contract.
pub const CANONICAL_COLUMNS: [&str; 13] = [
    "Unidade",
    "Especialidade",
    "Profissional",
    "Serviço",
    "Origem",
    "Tipo",
    "Hora",
    "Agenda direta",
    "Data",
    "Data_Cadastro",
    "Profissional do Cadastro",
    "Tipo de Serviço",
    "Obs",
];

/// Minimum raw row width that still carries the appointment date (cell 9).
/// Rows narrower than this cannot be normalized and are dropped.
pub const MIN_ROW_WIDTH: usize = 10;

/// One normalized appointment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaRecord {
    #[serde(rename = "Unidade")]
    pub unidade: String,
    #[serde(rename = "Especialidade")]
    pub especialidade: String,
    #[serde(rename = "Profissional")]
    pub profissional: String,
    #[serde(rename = "Serviço")]
    pub servico: String,
    #[serde(rename = "Origem")]
    pub origem: String,
    #[serde(rename = "Tipo")]
    pub tipo: String,
    /// Time of day as emitted by the portal (`"HH:MM"`). Kept verbatim;
    /// lexicographic order matches chronological order for this format.
    #[serde(rename = "Hora")]
    pub hora: String,
    #[serde(rename = "Agenda direta")]
    pub agenda_direta: String,
    /// Appointment date, parsed day-first. The one typed invariant of the
    /// table: a record only exists if this parsed.
    #[serde(rename = "Data")]
    pub data: NaiveDate,
    #[serde(rename = "Data_Cadastro")]
    pub data_cadastro: Option<String>,
    #[serde(rename = "Profissional do Cadastro")]
    pub profissional_cadastro: Option<String>,
    #[serde(rename = "Tipo de Serviço")]
    pub tipo_servico: Option<String>,
    #[serde(rename = "Obs")]
    pub obs: Option<String>,
}

/// The normalized appointment table: an ordered collection of
/// [`AgendaRecord`]. May be empty, which signals "no usable data" rather
/// than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgendaTable {
    records: Vec<AgendaRecord>,
}

impl AgendaTable {
    #[must_use]
    pub fn new(records: Vec<AgendaRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AgendaRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn records(&self) -> &[AgendaRecord] {
        &self.records
    }

    pub fn push(&mut self, record: AgendaRecord) {
        self.records.push(record);
    }

    /// Sorts records by appointment date, then time of day. Insertion order
    /// carries no meaning; consumers that display the table re-sort it this
    /// way.
    pub fn sort_by_schedule(&mut self) {
        self.records
            .sort_by(|a, b| a.data.cmp(&b.data).then_with(|| a.hora.cmp(&b.hora)));
    }

    /// Inclusive date span of the table, or `None` when empty.
    #[must_use]
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.data).min()?;
        let max = self.records.iter().map(|r| r.data).max()?;
        Some((min, max))
    }
}

impl<'a> IntoIterator for &'a AgendaTable {
    type Item = &'a AgendaRecord;
    type IntoIter = std::slice::Iter<'a, AgendaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for AgendaTable {
    type Item = AgendaRecord;
    type IntoIter = std::vec::IntoIter<AgendaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(data: NaiveDate, hora: &str) -> AgendaRecord {
        AgendaRecord {
            unidade: "Centro".to_string(),
            especialidade: "Clínico".to_string(),
            profissional: "Dr. A".to_string(),
            servico: "Consulta".to_string(),
            origem: "Online".to_string(),
            tipo: "Normal".to_string(),
            hora: hora.to_string(),
            agenda_direta: "Sim".to_string(),
            data,
            data_cadastro: None,
            profissional_cadastro: None,
            tipo_servico: None,
            obs: None,
        }
    }

    #[test]
    fn sort_by_schedule_orders_by_date_then_time() {
        let d1 = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        let mut table = AgendaTable::new(vec![
            record(d2, "08:00"),
            record(d1, "14:00"),
            record(d1, "09:00"),
        ]);
        table.sort_by_schedule();
        let order: Vec<_> = table.iter().map(|r| (r.data, r.hora.clone())).collect();
        assert_eq!(
            order,
            vec![
                (d1, "09:00".to_string()),
                (d1, "14:00".to_string()),
                (d2, "08:00".to_string()),
            ]
        );
    }

    #[test]
    fn date_span_covers_min_and_max() {
        let d1 = NaiveDate::from_ymd_opt(2023, 5, 15).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();
        let table = AgendaTable::new(vec![record(d2, "08:00"), record(d1, "08:00")]);
        assert_eq!(table.date_span(), Some((d1, d2)));
        assert_eq!(AgendaTable::default().date_span(), None);
    }

    #[test]
    fn serializes_with_canonical_headers() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let json = serde_json::to_value(record(d, "09:00")).unwrap();
        let obj = json.as_object().unwrap();
        for column in CANONICAL_COLUMNS {
            assert!(obj.contains_key(column), "missing column {column}");
        }
        assert!(!obj.contains_key("DT_RowId"));
        assert_eq!(obj.len(), CANONICAL_COLUMNS.len());
    }

    #[test]
    fn table_round_trips_through_json() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let table = AgendaTable::new(vec![record(d, "09:00")]);
        let json = serde_json::to_string(&table).unwrap();
        let back: AgendaTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
