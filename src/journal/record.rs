//! One journal row and its CSV mapping.

use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::Serialize;

use super::{HEADER, VISUAL_COLUMN};
use crate::control::ValvePosition;
use crate::error::JournalError;

/// Wall-clock format of the `Fecha y Hora` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One durable decision record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalRecord {
    /// Local wall-clock time, second precision.
    pub timestamp: NaiveDateTime,
    /// Last reading at decision time; `None` for a manual command issued
    /// before the first frame arrived.
    pub moisture_raw: Option<u32>,
    /// Valve position after the decision.
    pub valve: ValvePosition,
    /// Origin and outcome, e.g. `auto: reading normal`.
    pub observations: String,
    /// Label written back by the classifier, if any.
    pub visual_state: Option<String>,
}

impl JournalRecord {
    pub(super) fn to_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.moisture_raw.map_or_else(String::new, |m| m.to_string()),
            self.valve.as_str().to_string(),
            self.observations.clone(),
        ];
        if let Some(label) = &self.visual_state {
            fields.push(label.clone());
        }
        fields
    }

    pub(super) fn from_row(row: &StringRecord, columns: &Columns) -> Result<Self, JournalError> {
        let line = row.position().map_or(0, csv::Position::line);
        let malformed = |reason: String| JournalError::Malformed { line, reason };
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        let timestamp = NaiveDateTime::parse_from_str(field(columns.timestamp), TIMESTAMP_FORMAT)
            .map_err(|e| malformed(format!("timestamp: {e}")))?;
        let moisture_raw = match field(columns.moisture) {
            "" => None,
            raw => Some(
                raw.parse::<u32>()
                    .map_err(|e| malformed(format!("moisture: {e}")))?,
            ),
        };
        let valve = field(columns.valve)
            .parse::<ValvePosition>()
            .map_err(|e| malformed(format!("valve: {e}")))?;
        let observations = row.get(columns.observations).unwrap_or("").to_string();
        let visual_state = columns
            .visual
            .and_then(|idx| row.get(idx))
            .filter(|label| !label.is_empty())
            .map(String::from);

        Ok(Self {
            timestamp,
            moisture_raw,
            valve,
            observations,
            visual_state,
        })
    }
}

/// Column positions resolved from the header row.
///
/// Known names win; a header that does not carry them falls back to the
/// fixed positional layout.
pub(super) struct Columns {
    timestamp: usize,
    moisture: usize,
    valve: usize,
    observations: usize,
    visual: Option<usize>,
}

impl Columns {
    pub(super) fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .unwrap_or(fallback)
        };
        Self {
            timestamp: find(HEADER[0], 0),
            moisture: find(HEADER[1], 1),
            valve: find(HEADER[2], 2),
            observations: find(HEADER[3], 3),
            visual: headers.iter().position(|h| h.trim() == VISUAL_COLUMN),
        }
    }
}
