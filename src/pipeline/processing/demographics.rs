//! Demographics normalizer for the survey export.
//!
//! The export carries three header records: record 1 holds the question text
//! used as the real header, records 0 and 2 are survey-tool decoration.

use tracing::{debug, info};

use crate::constants::{
    self, DEMOGRAPHICS_COLUMNS, DEMOGRAPHICS_DECORATION_ROWS, DEMOGRAPHICS_HEADER_ROW, UNKNOWN_PARTICIPANT,
};
use crate::error::{Result, SchemaError};
use crate::observability::metrics;
use crate::table::{Cell, Table};
use crate::types::DemographicsRecord;

const HEADER_RECORDS: usize = 3;

/// A participant id names a real participant when present and not the `Unknown` sentinel.
pub fn is_known_participant(id: Option<&str>) -> bool {
    match id.map(str::trim) {
        None | Some("") => false,
        Some(id) => id != UNKNOWN_PARTICIPANT,
    }
}

/// Drop respondents without a usable participant id. Applying it twice changes nothing.
pub fn filter_known_participants(records: Vec<DemographicsRecord>) -> Vec<DemographicsRecord> {
    records
        .into_iter()
        .filter(|r| is_known_participant(Some(&r.participant)))
        .collect()
}

/// Clean a header-less read of the survey export into one record per respondent.
pub fn normalize_demographics(raw: &Table) -> Result<Vec<DemographicsRecord>> {
    if raw.len() < HEADER_RECORDS {
        return Err(SchemaError::TruncatedHeader {
            table: raw.name.clone(),
            found: raw.len(),
            expected: HEADER_RECORDS,
        }
        .into());
    }
    debug!(
        source = %raw.name,
        decoration = ?DEMOGRAPHICS_DECORATION_ROWS,
        "Promoting record {} to header",
        DEMOGRAPHICS_HEADER_ROW
    );

    // Promote the question-text record and resolve the whitelist against it
    let header = Table::new(
        raw.name.clone(),
        raw.rows[DEMOGRAPHICS_HEADER_ROW]
            .iter()
            .map(|c| c.clone().unwrap_or_default())
            .collect(),
    );
    let questions: Vec<&str> = DEMOGRAPHICS_COLUMNS.iter().map(|(question, _)| *question).collect();
    let columns = header.require_columns(&questions)?;

    let data = raw
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != DEMOGRAPHICS_HEADER_ROW && !DEMOGRAPHICS_DECORATION_ROWS.contains(i))
        .map(|(_, row)| row.as_slice());

    let pick = |row: &[Cell], i: usize| row.get(columns[i]).cloned().flatten();
    let records: Vec<DemographicsRecord> = data
        .map(|row| DemographicsRecord {
            participant: pick(row, 0).map(|p| p.trim().to_string()).unwrap_or_default(),
            completion_date: pick(row, 1),
            answers: (2..DEMOGRAPHICS_COLUMNS.len()).map(|i| pick(row, i)).collect(),
        })
        .collect();

    let total = records.len();
    let kept = filter_known_participants(records);
    metrics::demographics::records_filtered(kept.len(), total - kept.len());
    info!(
        source = %raw.name,
        respondents = total,
        kept = kept.len(),
        "Demographics normalized"
    );

    Ok(kept)
}

/// Canonical-column view of the cleaned records, for inspection output.
pub fn demographics_table(name: &str, records: &[DemographicsRecord]) -> Table {
    let mut table = Table::new(
        name,
        DEMOGRAPHICS_COLUMNS.iter().map(|(_, canonical)| canonical.to_string()).collect(),
    );
    for record in records {
        let mut row: Vec<Cell> = vec![Some(record.participant.clone()), record.completion_date.clone()];
        row.extend(record.answers.iter().cloned());
        table.push_row(row);
    }
    debug_assert_eq!(table.headers.len(), 2 + constants::DEMOGRAPHIC_ANSWER_COUNT);
    table
}
