use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::app::ports::TableStorePort;
use crate::config::FailurePolicy;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::normalize::{NormalizeReport, Normalizer, RecordNormalizer};
use crate::types::CleanedTrialTable;

/// A participant file left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub source_name: String,
    pub error: String,
}

/// Result of a preprocessing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessReport {
    pub files_found: usize,
    pub processed: Vec<NormalizeReport>,
    pub failed: Vec<FileFailure>,
}

impl PreprocessReport {
    pub fn unknown_stimulus_count(&self) -> usize {
        self.processed.iter().map(|r| r.unknown_stimuli.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    pub tables: Vec<CleanedTrialTable>,
    pub report: PreprocessReport,
}

/// Use case for normalizing every raw participant file in a directory
pub struct PreprocessUseCase {
    normalizer: Box<dyn Normalizer>,
    store: Arc<dyn TableStorePort>,
    policy: FailurePolicy,
}

impl PreprocessUseCase {
    pub fn new(normalizer: Box<dyn Normalizer>, store: Arc<dyn TableStorePort>, policy: FailurePolicy) -> Self {
        Self {
            normalizer,
            store,
            policy,
        }
    }

    /// Create a use case with the default record normalizer
    pub fn with_default_normalizer(store: Arc<dyn TableStorePort>, policy: FailurePolicy) -> Self {
        Self::new(Box::new(RecordNormalizer::new()), store, policy)
    }

    fn process_file(&self, path: &Path, preprocessed_dir: &Path) -> Result<(CleanedTrialTable, NormalizeReport)> {
        let raw = self.store.read_table(path)?;
        let normalized = self.normalizer.normalize(&raw)?;

        let output_path = preprocessed_dir.join(&normalized.table.source_name);
        self.store.write_table(&output_path, &normalized.table.to_table())?;
        info!("Processed CSV saved as {}", output_path.display());

        Ok((normalized.table, normalized.report))
    }

    /// Normalize all `*.csv` files in `input_dir`, writing each under the same name into `preprocessed_dir`.
    pub fn run(&self, input_dir: &Path, preprocessed_dir: &Path) -> Result<PreprocessOutcome> {
        if !self.store.dir_exists(input_dir) {
            return Err(PipelineError::directory_not_found("input", input_dir));
        }
        self.store.create_dir_all(preprocessed_dir)?;

        let files = self.store.list_csv(input_dir)?;
        info!(files = files.len(), policy = ?self.policy, "Preprocessing participant files");

        let mut tables = Vec::with_capacity(files.len());
        let mut report = PreprocessReport {
            files_found: files.len(),
            ..Default::default()
        };

        for path in &files {
            let source_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let span = info_span!("preprocess_file", file = %source_name);
            let _enter = span.enter();
            info!("Processing file: {}", path.display());

            match self.process_file(path, preprocessed_dir) {
                Ok((table, file_report)) => {
                    if !file_report.unknown_stimuli.is_empty() {
                        warn!(
                            count = file_report.unknown_stimuli.len(),
                            "Trials scored against unknown stimuli"
                        );
                    }
                    tables.push(table);
                    report.processed.push(file_report);
                }
                Err(e) => {
                    metrics::normalize::file_failed();
                    match self.policy {
                        FailurePolicy::Abort => {
                            error!("Normalization failed, aborting run: {}", e);
                            return Err(e);
                        }
                        FailurePolicy::Skip => {
                            error!("Normalization failed, skipping file: {}", e);
                            report.failed.push(FileFailure {
                                source_name,
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "Preprocessing finished"
        );
        Ok(PreprocessOutcome { tables, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::MemoryTableStore;
    use crate::table::Table;
    use std::path::PathBuf;

    const RAW: &str = "participant,date,expName,psychopyVersion,OS,frameRate,mouse_2.time,mouse_2.clicked_name,imageName,audioName,congruenceType,cueType
,,,,,,,,,,,visual
,,,,,,,,,,,auditory
4,2024-01-05_10h00.00.000,avcue,2024.1.4,Win32,60.0,0.8,animal,cat,car,congruent,
4,2024-01-05_10h00.00.000,avcue,2024.1.4,Win32,60.0,0.9,vehicle,dog,bike,congruent,
";

    fn store_with(files: &[(&str, &str)]) -> Arc<MemoryTableStore> {
        let store = MemoryTableStore::new();
        store.add_dir("raw");
        for (name, content) in files {
            store.add_file(PathBuf::from("raw").join(name), content);
        }
        Arc::new(store)
    }

    #[test]
    fn test_cleaned_files_written_under_same_name() {
        let store = store_with(&[("4_avcue_2024-01-05.csv", RAW)]);
        let use_case = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort);

        let outcome = use_case.run(Path::new("raw"), Path::new("clean")).unwrap();
        assert_eq!(outcome.tables.len(), 1);
        assert_eq!(outcome.report.files_found, 1);

        let written = store.written(Path::new("clean/4_avcue_2024-01-05.csv")).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written.cell(0, 0), Some("4"));
        assert_eq!(written.cell(1, 0), None);
    }

    #[test]
    fn test_missing_input_dir() {
        let store = Arc::new(MemoryTableStore::new());
        let use_case = PreprocessUseCase::with_default_normalizer(store, FailurePolicy::Abort);
        let err = use_case.run(Path::new("raw"), Path::new("clean")).unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryNotFound { role: "input", .. }));
    }

    #[test]
    fn test_abort_policy_stops_on_first_bad_file() {
        let store = store_with(&[("a_bad.csv", "participant\n1\n"), ("b_good.csv", RAW)]);
        let use_case = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort);

        let err = use_case.run(Path::new("raw"), Path::new("clean")).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
        assert!(store.written(Path::new("clean/b_good.csv")).is_none());
    }

    #[test]
    fn test_skip_policy_reports_and_continues() {
        let store = store_with(&[("a_bad.csv", "participant\n1\n"), ("b_good.csv", RAW)]);
        let use_case = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Skip);

        let outcome = use_case.run(Path::new("raw"), Path::new("clean")).unwrap();
        assert_eq!(outcome.tables.len(), 1);
        assert_eq!(outcome.report.failed.len(), 1);
        assert_eq!(outcome.report.failed[0].source_name, "a_bad.csv");
        assert!(store.written(Path::new("clean/b_good.csv")).is_some());
    }

    struct FailingNormalizer;

    impl Normalizer for FailingNormalizer {
        fn normalize(&self, raw: &Table) -> Result<crate::pipeline::normalize::NormalizedSession> {
            Err(PipelineError::Config(format!("refusing {}", raw.name)))
        }
    }

    #[test]
    fn test_custom_normalizer_is_used() {
        let store = store_with(&[("x.csv", RAW)]);
        let use_case = PreprocessUseCase::new(Box::new(FailingNormalizer), store, FailurePolicy::Skip);
        let outcome = use_case.run(Path::new("raw"), Path::new("clean")).unwrap();
        assert_eq!(outcome.report.failed[0].error, "Configuration error: refusing x.csv");
    }
}
