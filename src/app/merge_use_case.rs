use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::app::ports::{ConfirmPort, TableStorePort};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::merge::merge_corpus;
use crate::types::{CleanedTrialTable, DemographicsRecord};

/// Where the cleaned sessions for a merge come from
pub enum SessionSource {
    /// Read every cleaned `*.csv` from this directory
    Directory(PathBuf),
    /// Sessions already normalized in this run
    InMemory(Vec<CleanedTrialTable>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MergeOutcome {
    Written { path: PathBuf, rows: usize, sessions: usize },
    /// The output file existed and overwriting it was refused
    Declined { path: PathBuf },
}

/// Use case for merging cleaned sessions with demographics into the output file
pub struct MergeUseCase {
    store: Arc<dyn TableStorePort>,
    confirm: Box<dyn ConfirmPort>,
}

impl MergeUseCase {
    pub fn new(store: Arc<dyn TableStorePort>, confirm: Box<dyn ConfirmPort>) -> Self {
        Self { store, confirm }
    }

    fn load_sessions(&self, dir: &Path) -> Result<Vec<CleanedTrialTable>> {
        if !self.store.dir_exists(dir) {
            return Err(PipelineError::directory_not_found("input", dir));
        }
        self.store
            .list_csv(dir)?
            .iter()
            .map(|path| CleanedTrialTable::from_table(&self.store.read_table(path)?))
            .collect()
    }

    pub fn run(
        &self,
        sessions: SessionSource,
        demographics: &[DemographicsRecord],
        output_path: &Path,
    ) -> Result<MergeOutcome> {
        let output_dir = match output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let tables = match sessions {
            SessionSource::Directory(dir) => self.load_sessions(&dir)?,
            SessionSource::InMemory(tables) => tables,
        };
        if !self.store.dir_exists(output_dir) {
            return Err(PipelineError::directory_not_found("output", output_dir));
        }

        if self.store.file_exists(output_path) {
            let prompt = format!("The file {} already exists. Overwrite?", output_path.display());
            if !self.confirm.confirm(&prompt)? {
                warn!("Operation cancelled. File not overwritten: {}", output_path.display());
                return Ok(MergeOutcome::Declined {
                    path: output_path.to_path_buf(),
                });
            }
        }

        let merged = merge_corpus(tables, demographics)?;
        self.store.write_table(output_path, &merged.table)?;
        metrics::merge::rows_written(merged.table.len());
        info!("Merged CSV saved as {}", output_path.display());

        Ok(MergeOutcome::Written {
            path: output_path.to_path_buf(),
            rows: merged.table.len(),
            sessions: merged.participants.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::confirm::AssumeYes;
    use crate::infra::memory_store::MemoryTableStore;
    use crate::types::{CorrectResult, CueType, SessionMetadata, Trial};

    struct Refuse;

    impl ConfirmPort for Refuse {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn session(participant: &str, date: &str) -> CleanedTrialTable {
        CleanedTrialTable {
            source_name: format!("{participant}.csv"),
            session: SessionMetadata {
                participant: participant.into(),
                date: date.into(),
                exp_name: "avcue".into(),
                psychopy_version: "2024.1.4".into(),
                os: "Win32".into(),
                frame_rate: "60.0".into(),
            },
            trials: vec![
                Trial {
                    reaction_time: "0.7".into(),
                    category_clicked: "a".into(),
                    image_name: "cat".into(),
                    audio_name: "car".into(),
                    congruence_type: "incongruent".into(),
                    cue_type: CueType::Visual,
                    correct_result: CorrectResult::Correct,
                };
                3
            ],
        }
    }

    #[test]
    fn test_merge_from_preprocessed_dir() {
        let store = Arc::new(MemoryTableStore::new());
        store.add_dir("out");
        store.write_table(Path::new("clean/1.csv"), &session("1", "2024-01-01").to_table()).unwrap();
        store.write_table(Path::new("clean/2.csv"), &session("2", "2024-01-05").to_table()).unwrap();

        let use_case = MergeUseCase::new(store.clone(), Box::new(AssumeYes));
        let outcome = use_case
            .run(SessionSource::Directory("clean".into()), &[], Path::new("out/data.csv"))
            .unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Written {
                path: "out/data.csv".into(),
                rows: 6,
                sessions: 2
            }
        );

        let written = store.written(Path::new("out/data.csv")).unwrap();
        assert_eq!(written.cell(0, 0), Some("2"));
        assert_eq!(written.cell(3, 0), None);
    }

    #[test]
    fn test_missing_directories() {
        let store = Arc::new(MemoryTableStore::new());
        let use_case = MergeUseCase::new(store.clone(), Box::new(AssumeYes));

        let err = use_case
            .run(SessionSource::Directory("clean".into()), &[], Path::new("out/data.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound { role: "input", .. }));

        let err = use_case
            .run(SessionSource::InMemory(vec![]), &[], Path::new("out/data.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound { role: "output", .. }));
    }

    #[test]
    fn test_declined_overwrite_leaves_file() {
        let store = Arc::new(MemoryTableStore::new());
        store.add_file("out/data.csv", "old\n");
        let use_case = MergeUseCase::new(store.clone(), Box::new(Refuse));

        let outcome = use_case
            .run(
                SessionSource::InMemory(vec![session("1", "2024-01-01")]),
                &[],
                Path::new("out/data.csv"),
            )
            .unwrap();
        assert!(matches!(outcome, MergeOutcome::Declined { .. }));
        assert_eq!(store.contents(Path::new("out/data.csv")).as_deref(), Some("old\n"));
    }
}
