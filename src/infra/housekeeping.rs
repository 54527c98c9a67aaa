//! Filesystem housekeeping around a run: clearing old preprocessed output and
//! quarantining raw files that cannot be normalized.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::constants::UNWANTED_SUFFIXES;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
    pub dir_missing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuarantineReport {
    pub removed: Vec<String>,
    pub failed: usize,
    pub remaining: usize,
}

fn remove_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted: {}", path.display());
            metrics::housekeeping::file_removed();
            true
        }
        Err(e) => {
            error!("Error deleting {}: {}", path.display(), e);
            metrics::housekeeping::removal_failed();
            false
        }
    }
}

fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Delete every regular file in `dir`. A missing directory is reported, not an error.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn clear_preprocessed_files(dir: &Path) -> Result<ClearReport> {
    if !dir.is_dir() {
        warn!("The folder {} does not exist", dir.display());
        return Ok(ClearReport {
            dir_missing: true,
            ..Default::default()
        });
    }

    let mut report = ClearReport::default();
    for path in regular_files(dir)? {
        if remove_file(&path) {
            report.removed += 1;
        } else {
            report.failed += 1;
        }
    }
    info!(removed = report.removed, failed = report.failed, "Cleared preprocessed files");
    Ok(report)
}

/// File names listed in the ignore file, one per line. A missing file lists nothing.
pub fn read_ignore_list(path: &Path) -> Result<HashSet<String>> {
    if !path.is_file() {
        debug!("No ignore list at {}", path.display());
        return Ok(HashSet::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

fn is_unwanted(name: &str, size: u64, ignored: &HashSet<String>, min_size: u64) -> bool {
    ignored.contains(name) || UNWANTED_SUFFIXES.iter().any(|s| name.ends_with(s)) || size <= min_size
}

/// Remove raw files that are ignored, are PsychoPy side files, or are too small to hold a session.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn remove_unwanted_files(dir: &Path, ignore_path: &Path, min_size: u64) -> Result<QuarantineReport> {
    if !dir.is_dir() {
        return Err(PipelineError::directory_not_found("input", dir));
    }
    let ignored = read_ignore_list(ignore_path)?;
    let mut report = QuarantineReport::default();

    for path in regular_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = fs::metadata(&path)?.len();
        if !is_unwanted(&name, size, &ignored, min_size) {
            continue;
        }
        if remove_file(&path) {
            report.removed.push(name);
        } else {
            report.failed += 1;
        }
    }

    report.remaining = regular_files(dir)?.len();
    info!(
        removed = report.removed.len(),
        remaining = report.remaining,
        "Cleanup complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_sized(dir: &Path, name: &str, size: usize) {
        fs::write(dir.join(name), vec![b'x'; size]).unwrap();
    }

    #[test]
    fn test_clear_removes_files_only() {
        let dir = tempdir().unwrap();
        write_sized(dir.path(), "a.csv", 10);
        write_sized(dir.path(), "b.csv", 10);
        fs::create_dir(dir.path().join("keep")).unwrap();

        let report = clear_preprocessed_files(dir.path()).unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(report.failed, 0);
        assert!(dir.path().join("keep").is_dir());
    }

    #[test]
    fn test_clear_missing_dir_is_not_fatal() {
        let dir = tempdir().unwrap();
        let report = clear_preprocessed_files(&dir.path().join("absent")).unwrap();
        assert!(report.dir_missing);
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_quarantine_rules() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        fs::create_dir(&raw).unwrap();
        let big = 21 * 1024;
        write_sized(&raw, "1_avcue.csv", big);
        write_sized(&raw, "2_avcue.csv", big);
        write_sized(&raw, "3_avcue.csv", 512);
        write_sized(&raw, "1_avcue.log", big);
        write_sized(&raw, "1_avcue.psydat", big);
        write_sized(&raw, "1_avcue.log.gz", big);

        let ignore = dir.path().join("ignore_files.txt");
        fs::write(&ignore, "2_avcue.csv\n\n").unwrap();

        let report = remove_unwanted_files(&raw, &ignore, 20 * 1024).unwrap();
        let mut removed = report.removed.clone();
        removed.sort();
        assert_eq!(
            removed,
            vec!["1_avcue.log", "1_avcue.log.gz", "1_avcue.psydat", "2_avcue.csv", "3_avcue.csv"]
        );
        assert_eq!(report.remaining, 1);
        assert!(raw.join("1_avcue.csv").exists());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let ignored = HashSet::new();
        assert!(is_unwanted("a.csv", 20 * 1024, &ignored, 20 * 1024));
        assert!(!is_unwanted("a.csv", 20 * 1024 + 1, &ignored, 20 * 1024));
    }

    #[test]
    fn test_quarantine_requires_input_dir() {
        let dir = tempdir().unwrap();
        let err = remove_unwanted_files(&dir.path().join("raw"), &dir.path().join("ignore.txt"), 0).unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_missing_ignore_list_is_empty() {
        let dir = tempdir().unwrap();
        assert!(read_ignore_list(&dir.path().join("none.txt")).unwrap().is_empty());
    }
}
