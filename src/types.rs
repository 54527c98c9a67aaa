use std::fmt;

use crate::constants::{self, AUDITORY_CUE, VISUAL_CUE};
use crate::error::{Result, SchemaError};
use crate::table::{to_cell, Cell, Table};

/// Cue modality a trial block was run under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CueType {
    Visual,
    Auditory,
    /// No block covers this row
    Unassigned,
    /// A cue label the correctness rule does not recognise
    Other(String),
}

impl CueType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            VISUAL_CUE => CueType::Visual,
            AUDITORY_CUE => CueType::Auditory,
            "" => CueType::Unassigned,
            other => CueType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CueType::Visual => VISUAL_CUE,
            CueType::Auditory => AUDITORY_CUE,
            CueType::Unassigned => "",
            CueType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for CueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-trial correctness label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectResult {
    Correct,
    Incorrect,
    /// Cue type missing or unrecognised
    Null,
}

impl CorrectResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectResult::Correct => "1",
            CorrectResult::Incorrect => "0",
            CorrectResult::Null => "null",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(CorrectResult::Correct),
            "0" => Some(CorrectResult::Incorrect),
            "null" => Some(CorrectResult::Null),
            _ => None,
        }
    }
}

impl fmt::Display for CorrectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-constant fields recorded by the experiment software, one set per participant file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub participant: String,
    pub date: String,
    pub exp_name: String,
    pub psychopy_version: String,
    pub os: String,
    pub frame_rate: String,
}

impl SessionMetadata {
    /// Values in `SESSION_COLUMNS` order.
    pub fn values(&self) -> [&str; 6] {
        [
            &self.participant,
            &self.date,
            &self.exp_name,
            &self.psychopy_version,
            &self.os,
            &self.frame_rate,
        ]
    }
}

/// One response row of a participant session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    pub reaction_time: String,
    pub category_clicked: String,
    pub image_name: String,
    pub audio_name: String,
    pub congruence_type: String,
    pub cue_type: CueType,
    pub correct_result: CorrectResult,
}

impl Trial {
    /// Values in `PER_ROW_COLUMNS` order.
    pub fn values(&self) -> [&str; 7] {
        [
            &self.reaction_time,
            &self.category_clicked,
            &self.image_name,
            &self.audio_name,
            &self.congruence_type,
            self.cue_type.as_str(),
            self.correct_result.as_str(),
        ]
    }
}

/// A normalized participant file: the session it belongs to and its ordered trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedTrialTable {
    /// File name the table was read from and is written back under
    pub source_name: String,
    pub session: SessionMetadata,
    pub trials: Vec<Trial>,
}

impl CleanedTrialTable {
    /// Flatten to the per-file layout: session fields on row 0 only, nulls elsewhere.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            self.source_name.clone(),
            constants::CLEANED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        );

        for (index, trial) in self.trials.iter().enumerate() {
            let mut row: Vec<Cell> = Vec::with_capacity(constants::CLEANED_COLUMNS.len());
            if index == 0 {
                row.extend(self.session.values().iter().map(|v| Some(v.to_string())));
            } else {
                row.extend(std::iter::repeat(None).take(constants::SESSION_COLUMNS.len()));
            }
            row.extend(trial.values().iter().map(|v| to_cell(v)));
            table.push_row(row);
        }
        table
    }

    /// Parse a previously written cleaned file. Session fields are read from row 0.
    pub fn from_table(table: &Table) -> Result<Self> {
        let columns = table.require_columns(&constants::CLEANED_COLUMNS)?;
        let column = |row: usize, i: usize| table.cell(row, columns[i]).unwrap_or("").to_string();

        if table.is_empty() {
            return Err(SchemaError::EmptySession {
                table: table.name.clone(),
            }
            .into());
        }

        let session = SessionMetadata {
            participant: column(0, 0),
            date: column(0, 1),
            exp_name: column(0, 2),
            psychopy_version: column(0, 3),
            os: column(0, 4),
            frame_rate: column(0, 5),
        };

        let mut trials = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let raw_result = column(row, 12);
            let correct_result =
                CorrectResult::parse(&raw_result).ok_or_else(|| SchemaError::UnexpectedValue {
                    table: table.name.clone(),
                    column: constants::CORRECT_RESULT.to_string(),
                    value: raw_result.clone(),
                })?;
            trials.push(Trial {
                reaction_time: column(row, 6),
                category_clicked: column(row, 7),
                image_name: column(row, 8),
                audio_name: column(row, 9),
                congruence_type: column(row, 10),
                cue_type: CueType::parse(&column(row, 11)),
                correct_result,
            });
        }

        Ok(Self {
            source_name: table.name.clone(),
            session,
            trials,
        })
    }
}

/// One survey respondent, keyed by participant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemographicsRecord {
    pub participant: String,
    pub completion_date: Option<String>,
    /// Answers in `constants::demographic_answer_names()` order
    pub answers: Vec<Option<String>>,
}

impl DemographicsRecord {
    pub fn answer(&self, name: &str) -> Option<&str> {
        constants::demographic_answer_names()
            .position(|n| n == name)
            .and_then(|i| self.answers.get(i))
            .and_then(|a| a.as_deref())
    }
}

/// Terminal artifact of the merge: the flattened, redacted trial table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    pub table: Table,
    /// Sessions in the order their rows appear
    pub participants: Vec<i64>,
}
