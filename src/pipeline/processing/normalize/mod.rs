//! Record normalizer: reduces one raw per-participant export to a fixed-shape session.

pub mod correctness;

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{self, BLOCK_SIZE, MAX_CLEANED_ROWS, RAW_TRIAL_COLUMNS, TRIALS_PER_SESSION};
use crate::error::{Result, SchemaError};
use crate::observability::metrics;
use crate::table::Table;
use crate::types::{CleanedTrialTable, CueType, SessionMetadata, Trial};

use correctness::{cued_stimulus, is_correct};

/// Column positions of the raw export, resolved once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTrialSchema {
    /// Positions of `RAW_TRIAL_COLUMNS`, in that order
    pub columns: [usize; 11],
    pub cue_type: usize,
}

impl RawTrialSchema {
    /// Check every required column up front so drift surfaces as a single error.
    pub fn resolve(table: &Table) -> std::result::Result<Self, SchemaError> {
        let mut required: Vec<&str> = RAW_TRIAL_COLUMNS.to_vec();
        required.push(constants::RAW_CUE_TYPE);
        let indices = table.require_columns(&required)?;

        let mut columns = [0usize; 11];
        columns.copy_from_slice(&indices[..11]);
        Ok(Self {
            columns,
            cue_type: indices[11],
        })
    }
}

/// What the normalizer did to one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub source_name: String,
    pub raw_rows: usize,
    /// Rows discarded for holding a null in a kept column
    pub dropped_rows: usize,
    /// Complete rows cut by the row limit
    pub truncated_rows: usize,
    /// Unknown cued stimulus names, one entry per affected trial
    pub unknown_stimuli: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSession {
    pub table: CleanedTrialTable,
    pub report: NormalizeReport,
}

/// Trait for turning a raw participant export into a cleaned session
pub trait Normalizer {
    fn normalize(&self, raw: &Table) -> Result<NormalizedSession>;
}

/// Normalizer for the two-block animal/vehicle cueing design
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }
}

/// First two non-null cue types in row order, one per block.
pub fn block_cues(raw: &Table, cue_column: usize) -> std::result::Result<(CueType, CueType), SchemaError> {
    let mut cues = (0..raw.len()).filter_map(|row| raw.cell(row, cue_column));
    match (cues.next(), cues.next()) {
        (Some(first), Some(second)) => Ok((CueType::parse(first), CueType::parse(second))),
        (first, _) => Err(SchemaError::MissingCueTypes {
            table: raw.name.clone(),
            found: usize::from(first.is_some()),
        }),
    }
}

/// Cue type of a row by its position in the cleaned table.
pub fn cue_for_row(index: usize, block1: &CueType, block2: &CueType) -> CueType {
    if index < BLOCK_SIZE {
        block1.clone()
    } else if index < TRIALS_PER_SESSION {
        block2.clone()
    } else {
        CueType::Unassigned
    }
}

/// Leading character of the clicked response label (`a` or `v` for well-formed exports).
fn leading_char(label: &str) -> String {
    label.chars().next().map(String::from).unwrap_or_default()
}

impl Normalizer for RecordNormalizer {
    fn normalize(&self, raw: &Table) -> Result<NormalizedSession> {
        let schema = RawTrialSchema::resolve(raw)?;
        let (block1_cue, block2_cue) = block_cues(raw, schema.cue_type)?;
        debug!(
            source = %raw.name,
            block1 = %block1_cue,
            block2 = %block2_cue,
            "Resolved block cue types"
        );

        // Project onto the kept columns, keeping only fully populated rows
        let clicked = 7;
        let complete: Vec<[String; 11]> = raw
            .rows
            .iter()
            .filter_map(|row| {
                let mut values: [String; 11] = Default::default();
                for (slot, &column) in schema.columns.iter().enumerate() {
                    let value = row[column].as_deref()?;
                    values[slot] = if slot == clicked {
                        leading_char(value)
                    } else {
                        value.to_string()
                    };
                }
                Some(values)
            })
            .collect();

        let mut report = NormalizeReport {
            source_name: raw.name.clone(),
            raw_rows: raw.len(),
            dropped_rows: raw.len() - complete.len(),
            truncated_rows: complete.len().saturating_sub(MAX_CLEANED_ROWS),
            unknown_stimuli: Vec::new(),
        };

        let Some(first) = complete.first() else {
            return Err(SchemaError::EmptySession {
                table: raw.name.clone(),
            }
            .into());
        };

        let session = SessionMetadata {
            participant: first[0].clone(),
            date: first[1].clone(),
            exp_name: first[2].clone(),
            psychopy_version: first[3].clone(),
            os: first[4].clone(),
            frame_rate: first[5].clone(),
        };

        let mut trials = Vec::with_capacity(complete.len().min(MAX_CLEANED_ROWS));
        for (index, values) in complete.into_iter().take(MAX_CLEANED_ROWS).enumerate() {
            let [_, _, _, _, _, _, reaction_time, category_clicked, image_name, audio_name, congruence_type] =
                values;
            let cue_type = cue_for_row(index, &block1_cue, &block2_cue);

            if let Some(stimulus) = cued_stimulus(&cue_type, &image_name, &audio_name) {
                if constants::stimulus_category(stimulus).is_none() {
                    warn!(
                        source = %raw.name,
                        row = index,
                        stimulus = %stimulus,
                        "Unknown stimulus; expected category defaults to empty"
                    );
                    metrics::normalize::unknown_stimulus(stimulus);
                    report.unknown_stimuli.push(stimulus.to_string());
                }
            }

            let correct_result = is_correct(&cue_type, &image_name, &audio_name, &category_clicked);
            trials.push(Trial {
                reaction_time,
                category_clicked,
                image_name,
                audio_name,
                congruence_type,
                cue_type,
                correct_result,
            });
        }

        metrics::normalize::file_processed(trials.len(), report.dropped_rows, report.truncated_rows);

        Ok(NormalizedSession {
            table: CleanedTrialTable {
                source_name: raw.name.clone(),
                session,
                trials,
            },
            report,
        })
    }
}
