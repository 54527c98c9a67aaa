//! Session timestamps embedded in PsychoPy date fields and file names.
//!
//! PsychoPy writes session dates as `2024-11-06_14h05.33.120` and uses the same
//! token in its output file names.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::types::CleanedTrialTable;

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})(?:_(\d{2})h(\d{2})\.(\d{2}))?").expect("valid date pattern")
});

static FILE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})_(\d{2})h(\d{2})\.(\d{2})\.(\d{3})").expect("valid timestamp pattern")
});

fn to_timestamp(date: &str, clock: Option<(&str, &str, &str)>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = match clock {
        Some((h, m, s)) => NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, s.parse().ok()?)?,
        None => NaiveTime::MIN,
    };
    Some(NaiveDateTime::new(date, time))
}

/// First `YYYY-MM-DD` token in `text`, with the PsychoPy clock when it follows. Midnight otherwise.
pub fn parse_session_timestamp(text: &str) -> Option<NaiveDateTime> {
    DATE_TOKEN.captures_iter(text).find_map(|caps| {
        let clock = match (caps.get(2), caps.get(3), caps.get(4)) {
            (Some(h), Some(m), Some(s)) => Some((h.as_str(), m.as_str(), s.as_str())),
            _ => None,
        };
        to_timestamp(&caps[1], clock)
    })
}

/// Full PsychoPy file-name timestamp (`YYYY-MM-DD_HHhMM.SS.mmm`); milliseconds are ignored.
pub fn parse_file_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let caps = FILE_TIMESTAMP.captures(file_name)?;
    to_timestamp(&caps[1], Some((&caps[2], &caps[3], &caps[4])))
}

/// Display form used by the `dates` listing, e.g. `11-06-2024_02:05PM`.
pub fn display_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%m-%d-%Y_%I:%M%p").to_string()
}

/// Session timestamp of a cleaned table: the recorded session date, falling back to the file name.
pub fn session_timestamp(table: &CleanedTrialTable) -> Result<NaiveDateTime> {
    parse_session_timestamp(&table.session.date)
        .or_else(|| parse_session_timestamp(&table.source_name))
        .ok_or_else(|| PipelineError::InvalidSessionDate {
            source_name: table.source_name.clone(),
        })
}
