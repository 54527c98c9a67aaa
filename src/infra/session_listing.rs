use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::pipeline::session_date::{display_timestamp, parse_file_timestamp};

/// One timestamped session file in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFile {
    pub name: String,
    pub timestamp: NaiveDateTime,
}

impl SessionFile {
    pub fn display(&self) -> String {
        format!("{}: {}", self.name, display_timestamp(&self.timestamp))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionListing {
    /// Most recent first
    pub sessions: Vec<SessionFile>,
    /// CSV files whose name carries no PsychoPy timestamp
    pub invalid: Vec<String>,
}

/// Split CSV file names into timestamped sessions (most recent first) and the rest.
pub fn sort_session_names<I, S>(names: I) -> SessionListing
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut listing = SessionListing::default();
    for name in names.into_iter().map(Into::into) {
        if !name.ends_with(".csv") {
            continue;
        }
        match parse_file_timestamp(&name) {
            Some(timestamp) => listing.sessions.push(SessionFile { name, timestamp }),
            None => listing.invalid.push(name),
        }
    }
    listing.sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    listing.invalid.sort();
    listing
}

/// List the session files of `dir`.
pub fn sorted_session_files(dir: &Path) -> Result<SessionListing> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(sort_session_names(names))
}
