//! Stage metrics for the cleaning pipeline.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`install_recorder`].

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Record normalizer
    NormalizeFilesProcessed,
    NormalizeFilesFailed,
    NormalizeRowsDropped,
    NormalizeRowsTruncated,
    NormalizeUnknownStimuli,
    NormalizeTrialsPerSession,

    // Demographics normalizer
    DemographicsRecordsKept,
    DemographicsRecordsDropped,

    // Corpus merger
    MergeSessionsDropped,
    MergeRowsWritten,
    MergeUnmatchedSessions,

    // Housekeeping
    HousekeepingFilesRemoved,
    HousekeepingRemovalErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeFilesProcessed => "trialprep_normalize_files_processed_total",
            MetricName::NormalizeFilesFailed => "trialprep_normalize_files_failed_total",
            MetricName::NormalizeRowsDropped => "trialprep_normalize_rows_dropped_total",
            MetricName::NormalizeRowsTruncated => "trialprep_normalize_rows_truncated_total",
            MetricName::NormalizeUnknownStimuli => "trialprep_normalize_unknown_stimuli_total",
            MetricName::NormalizeTrialsPerSession => "trialprep_normalize_trials_per_session",

            MetricName::DemographicsRecordsKept => "trialprep_demographics_records_kept_total",
            MetricName::DemographicsRecordsDropped => "trialprep_demographics_records_dropped_total",

            MetricName::MergeSessionsDropped => "trialprep_merge_sessions_dropped_total",
            MetricName::MergeRowsWritten => "trialprep_merge_rows_written_total",
            MetricName::MergeUnmatchedSessions => "trialprep_merge_unmatched_sessions_total",

            MetricName::HousekeepingFilesRemoved => "trialprep_housekeeping_files_removed_total",
            MetricName::HousekeepingRemovalErrors => "trialprep_housekeeping_removal_errors_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install a Prometheus recorder so a snapshot can be rendered at the end of a run.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))
}

pub mod normalize {
    use super::MetricName;

    pub fn file_processed(trials: usize, dropped_rows: usize, truncated_rows: usize) {
        ::metrics::counter!(MetricName::NormalizeFilesProcessed.as_str()).increment(1);
        ::metrics::counter!(MetricName::NormalizeRowsDropped.as_str()).increment(dropped_rows as u64);
        ::metrics::counter!(MetricName::NormalizeRowsTruncated.as_str())
            .increment(truncated_rows as u64);
        ::metrics::histogram!(MetricName::NormalizeTrialsPerSession.as_str()).record(trials as f64);
    }

    pub fn file_failed() {
        ::metrics::counter!(MetricName::NormalizeFilesFailed.as_str()).increment(1);
    }

    pub fn unknown_stimulus(stimulus: &str) {
        ::metrics::counter!(MetricName::NormalizeUnknownStimuli.as_str(), "stimulus" => stimulus.to_string())
            .increment(1);
    }
}

pub mod demographics {
    use super::MetricName;

    pub fn records_filtered(kept: usize, dropped: usize) {
        ::metrics::counter!(MetricName::DemographicsRecordsKept.as_str()).increment(kept as u64);
        ::metrics::counter!(MetricName::DemographicsRecordsDropped.as_str()).increment(dropped as u64);
    }
}

pub mod merge {
    use super::MetricName;

    pub fn sessions_dropped(count: usize) {
        ::metrics::counter!(MetricName::MergeSessionsDropped.as_str()).increment(count as u64);
    }

    pub fn unmatched_session() {
        ::metrics::counter!(MetricName::MergeUnmatchedSessions.as_str()).increment(1);
    }

    pub fn rows_written(rows: usize) {
        ::metrics::counter!(MetricName::MergeRowsWritten.as_str()).increment(rows as u64);
    }
}

pub mod housekeeping {
    use super::MetricName;

    pub fn file_removed() {
        ::metrics::counter!(MetricName::HousekeepingFilesRemoved.as_str()).increment(1);
    }

    pub fn removal_failed() {
        ::metrics::counter!(MetricName::HousekeepingRemovalErrors.as_str()).increment(1);
    }
}
