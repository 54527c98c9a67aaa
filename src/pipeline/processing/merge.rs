//! Corpus merger: concatenates cleaned sessions and left-joins the demographics.
//!
//! Sessions stay linked to their trials until the final flatten, so filtering
//! and joining work on whole sessions. Per-participant fields are then
//! restated only on anchor rows of the concatenated table.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::constants::{self, MERGE_ANCHOR_INTERVAL, PER_ROW_COLUMNS};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::demographics::is_known_participant;
use crate::pipeline::processing::session_date::session_timestamp;
use crate::table::{to_cell, Cell, Table};
use crate::types::{CleanedTrialTable, DemographicsRecord, MergedTable};

/// Coerce a participant id to an integer. Integral decimals such as `12.0` are accepted,
/// exponent and fractional forms are not.
pub fn parse_participant_id(value: &str, origin: &str) -> Result<i64> {
    let trimmed = value.trim();
    let integral = match trimmed.split_once('.') {
        Some((whole, zeros)) if !zeros.is_empty() && zeros.bytes().all(|b| b == b'0') => whole,
        _ => trimmed,
    };
    integral.parse::<i64>().map_err(|_| PipelineError::TypeConversion {
        value: value.to_string(),
        origin: origin.to_string(),
    })
}

/// Most recent session first. Sessions with the same timestamp keep their input order.
pub fn order_sessions(tables: Vec<CleanedTrialTable>) -> Result<Vec<CleanedTrialTable>> {
    let mut keyed = tables
        .into_iter()
        .map(|t| session_timestamp(&t).map(|ts| (ts, t)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
    Ok(keyed.into_iter().map(|(_, t)| t).collect())
}

/// Drop sessions whose participant id is missing or `Unknown`.
pub fn filter_known_sessions(tables: Vec<CleanedTrialTable>) -> Vec<CleanedTrialTable> {
    let before = tables.len();
    let kept: Vec<_> = tables
        .into_iter()
        .filter(|t| {
            let known = is_known_participant(Some(&t.session.participant));
            if !known {
                warn!(source = %t.source_name, "Dropping session without a participant id");
            }
            known
        })
        .collect();
    metrics::merge::sessions_dropped(before - kept.len());
    kept
}

/// Anchor rows restate per-participant fields: index 0 and every multiple of the cadence.
pub fn is_anchor_row(index: usize) -> bool {
    index % MERGE_ANCHOR_INTERVAL == 0
}

/// Header of the merged output.
pub fn merged_headers() -> Vec<String> {
    constants::CLEANED_COLUMNS
        .iter()
        .map(|&c| if c == constants::DATE { constants::MERGED_DATE } else { c })
        .chain(constants::demographic_answer_names())
        .map(String::from)
        .collect()
}

/// Null every column outside `PER_ROW_COLUMNS` on non-anchor rows.
pub fn redact_repeated_fields(table: &mut Table) {
    let repeated: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !PER_ROW_COLUMNS.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();

    for (index, row) in table.rows.iter_mut().enumerate() {
        if is_anchor_row(index) {
            continue;
        }
        for &column in &repeated {
            row[column] = None;
        }
    }
}

/// Concatenate, filter, join, and redact.
#[instrument(skip_all, fields(sessions = tables.len(), respondents = demographics.len()))]
pub fn merge_corpus(tables: Vec<CleanedTrialTable>, demographics: &[DemographicsRecord]) -> Result<MergedTable> {
    let sessions = order_sessions(filter_known_sessions(tables))?;

    // Align join keys on both sides before joining
    let session_ids = sessions
        .iter()
        .map(|s| parse_participant_id(&s.session.participant, &s.source_name))
        .collect::<Result<Vec<i64>>>()?;

    let mut by_participant: HashMap<i64, Vec<&DemographicsRecord>> = HashMap::new();
    for record in demographics {
        let id = parse_participant_id(&record.participant, "demographics")?;
        by_participant.entry(id).or_default().push(record);
    }

    let no_answers: Vec<Cell> = vec![None; constants::DEMOGRAPHIC_ANSWER_COUNT];
    let mut table = Table::new("merged", merged_headers());

    for (session, &id) in sessions.iter().zip(&session_ids) {
        let matches = by_participant.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        if matches.is_empty() {
            warn!(participant = id, source = %session.source_name, "No demographics for participant");
            metrics::merge::unmatched_session();
        } else if matches.len() > 1 {
            warn!(participant = id, copies = matches.len(), "Duplicate demographics; trial rows repeat per copy");
        }

        let mut metadata: Vec<Cell> = vec![Some(id.to_string())];
        metadata.extend(session.session.values()[1..].iter().map(|v| to_cell(v)));

        let answer_sets: Vec<&[Cell]> = if matches.is_empty() {
            vec![no_answers.as_slice()]
        } else {
            matches.iter().map(|r| r.answers.as_slice()).collect()
        };

        for trial in &session.trials {
            for answers in &answer_sets {
                let mut row = metadata.clone();
                row.extend(trial.values().iter().map(|v| to_cell(v)));
                row.extend(answers.iter().cloned());
                table.push_row(row);
            }
        }
        debug!(participant = id, trials = session.trials.len(), "Joined session");
    }

    redact_repeated_fields(&mut table);
    info!(rows = table.len(), sessions = session_ids.len(), "Corpus merged");

    Ok(MergedTable {
        table,
        participants: session_ids,
    })
}
