use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use trialprep::app::demographics_use_case::DemographicsUseCase;
use trialprep::app::merge_use_case::{MergeOutcome, MergeUseCase, SessionSource};
use trialprep::app::ports::TableStorePort;
use trialprep::app::preprocess_use_case::PreprocessUseCase;
use trialprep::config::FailurePolicy;
use trialprep::constants::{self, DEMOGRAPHICS_COLUMNS, PER_ROW_COLUMNS, SESSION_COLUMNS};
use trialprep::infra::confirm::AssumeYes;
use trialprep::infra::fs_store::FsTableStore;
use trialprep::infra::housekeeping;
use trialprep::table::Table;

const RAW_HEADER: &str = "trials.thisN,participant,date,expName,psychopyVersion,OS,frameRate,mouse_2.time,mouse_2.clicked_name,imageName,audioName,congruenceType,cueType";

/// A PsychoPy export: two instruction rows naming the block cues, then `trials` complete rows.
fn raw_export(participant: u32, date: &str, trials: usize) -> String {
    let mut lines = vec![
        RAW_HEADER.to_string(),
        ",,,,,,,,,,,,visual".to_string(),
        ",,,,,,,,,,,,auditory".to_string(),
    ];
    for i in 0..trials {
        let (image, audio, clicked) = if i % 2 == 0 {
            ("cat", "train", "animal_button")
        } else {
            ("boat", "dog", "animal_button")
        };
        lines.push(format!(
            "{i},{participant},{date},avcue,2024.1.4,Win32,60.0,0.{i:03},{clicked},{image},{audio},incongruent,"
        ));
    }
    lines.join("\n") + "\n"
}

fn survey_export(participants: &[&str]) -> String {
    let width = DEMOGRAPHICS_COLUMNS.len();
    let mut lines = vec![
        (0..width).map(|i| format!("QID{i}")).collect::<Vec<_>>().join(","),
        DEMOGRAPHICS_COLUMNS
            .iter()
            .map(|(question, _)| format!("\"{question}\""))
            .collect::<Vec<_>>()
            .join(","),
        vec!["\"{\"\"ImportId\"\":\"\"x\"\"}\""; width].join(","),
    ];
    for participant in participants {
        let mut row = vec![participant.to_string(), "2024-11-06 21:43:00".to_string()];
        row.extend((2..width).map(|i| format!("answer{i}")));
        lines.push(row.join(","));
    }
    lines.join("\n") + "\n"
}

struct Workspace {
    _root: tempfile::TempDir,
    input: PathBuf,
    preprocessed: PathBuf,
    output: PathBuf,
    survey: PathBuf,
}

fn workspace() -> Result<Workspace> {
    let root = tempdir()?;
    let input = root.path().join("input_files");
    let preprocessed = root.path().join("preprocessed_files");
    let output = root.path().join("output_files");
    fs::create_dir(&input)?;
    fs::create_dir(&output)?;

    fs::write(
        input.join("1_avcue_2024-01-01_10h00.00.000.csv"),
        raw_export(1, "2024-01-01_10h00.00.000", 125),
    )?;
    fs::write(
        input.join("2_avcue_2024-01-05_09h30.00.000.csv"),
        raw_export(2, "2024-01-05_09h30.00.000", 121),
    )?;

    let survey = root.path().join("survey.csv");
    fs::write(&survey, survey_export(&["1", "Unknown", "2", ""]))?;

    Ok(Workspace {
        input,
        preprocessed,
        output,
        survey,
        _root: root,
    })
}

fn is_populated(table: &Table, row: usize, column: &str) -> bool {
    let index = table.column_index(column).expect("column present");
    table.cell(row, index).is_some()
}

#[test]
fn test_cleaned_files_have_fixed_shape() -> Result<()> {
    let ws = workspace()?;
    let store: Arc<dyn TableStorePort> = Arc::new(FsTableStore::new());

    let outcome = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort)
        .run(&ws.input, &ws.preprocessed)?;
    assert_eq!(outcome.tables.len(), 2);
    assert_eq!(outcome.report.processed[0].truncated_rows, 4);
    assert_eq!(outcome.report.unknown_stimulus_count(), 0);

    let cleaned = store.read_table(&ws.preprocessed.join("1_avcue_2024-01-01_10h00.00.000.csv"))?;
    assert_eq!(cleaned.len(), constants::MAX_CLEANED_ROWS);
    assert_eq!(cleaned.headers, constants::CLEANED_COLUMNS);

    for column in SESSION_COLUMNS {
        assert!(is_populated(&cleaned, 0, column));
        assert!((1..cleaned.len()).all(|r| !is_populated(&cleaned, r, column)));
    }

    let cue = cleaned.column(constants::CUE_TYPE).expect("CueType column");
    assert!(cue[..60].iter().all(|c| *c == Some("visual")));
    assert!(cue[60..120].iter().all(|c| *c == Some("auditory")));

    // visual block scores against the image, auditory against the audio
    let result = cleaned.column(constants::CORRECT_RESULT).expect("CorrectResult column");
    assert_eq!(result[0], Some("1"));
    assert_eq!(result[1], Some("0"));
    assert_eq!(result[60], Some("0"));
    assert_eq!(result[61], Some("1"));
    Ok(())
}

#[test]
fn test_end_to_end_merge() -> Result<()> {
    let ws = workspace()?;
    let store: Arc<dyn TableStorePort> = Arc::new(FsTableStore::new());

    let preprocessed = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort)
        .run(&ws.input, &ws.preprocessed)?;
    let demographics = DemographicsUseCase::new(store.clone()).run(&ws.survey, None)?;
    assert_eq!(demographics.len(), 2);

    let output_path = ws.output.join("data_results.csv");
    let outcome = MergeUseCase::new(store.clone(), Box::new(AssumeYes)).run(
        SessionSource::InMemory(preprocessed.tables),
        &demographics,
        &output_path,
    )?;
    assert!(matches!(outcome, MergeOutcome::Written { rows: 242, sessions: 2, .. }));

    let merged = store.read_table(&output_path)?;
    assert_eq!(merged.len(), 242);
    assert_eq!(merged.headers[1], "Date");

    // the 2024-01-05 session comes first
    assert_eq!(merged.cell(0, 0), Some("2"));
    assert_eq!(merged.cell(120, 0), Some("2"));
    let audio = merged.column_index(constants::AUDIO_NAME).expect("audioName");
    assert_eq!(merged.cell(121, audio), Some("train"));

    let demographic = constants::demographic_answer_names().next().expect("answer column");
    let anchors: Vec<usize> = (0..merged.len())
        .filter(|&r| is_populated(&merged, r, constants::PARTICIPANT))
        .collect();
    // every 120th concatenated row restates the session, wherever it lands
    assert_eq!(anchors, vec![0, 120, 240]);
    assert_eq!(merged.cell(240, 0), Some("1"));
    for r in 0..merged.len() {
        assert_eq!(is_populated(&merged, r, demographic), anchors.contains(&r));
        for column in PER_ROW_COLUMNS.iter().filter(|&&c| c != constants::CUE_TYPE) {
            assert!(is_populated(&merged, r, column), "row {r} {column}");
        }
    }

    // the 121st trial of each session falls outside both cue blocks
    let unassigned: Vec<usize> = (0..merged.len())
        .filter(|&r| !is_populated(&merged, r, constants::CUE_TYPE))
        .collect();
    assert_eq!(unassigned, vec![120, 241]);
    Ok(())
}

#[test]
fn test_merge_reads_preprocessed_directory() -> Result<()> {
    let ws = workspace()?;
    let store: Arc<dyn TableStorePort> = Arc::new(FsTableStore::new());

    PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort)
        .run(&ws.input, &ws.preprocessed)?;
    let demographics = DemographicsUseCase::new(store.clone()).run(&ws.survey, None)?;

    let output_path = ws.output.join("data_results.csv");
    fs::write(&output_path, "stale\n")?;
    let outcome = MergeUseCase::new(store.clone(), Box::new(AssumeYes)).run(
        SessionSource::Directory(ws.preprocessed.clone()),
        &demographics,
        &output_path,
    )?;
    assert!(matches!(outcome, MergeOutcome::Written { rows: 242, .. }));
    assert_eq!(store.read_table(&output_path)?.cell(0, 0), Some("2"));

    let cleared = housekeeping::clear_preprocessed_files(&ws.preprocessed)?;
    assert_eq!(cleared.removed, 2);
    assert!(store.list_csv(&ws.preprocessed)?.is_empty());
    Ok(())
}

#[test]
fn test_skip_policy_leaves_bad_file_out() -> Result<()> {
    let ws = workspace()?;
    fs::write(ws.input.join("0_broken.csv"), "participant,date\n3,2024-01-02\n")?;
    let store: Arc<dyn TableStorePort> = Arc::new(FsTableStore::new());

    let abort = PreprocessUseCase::with_default_normalizer(store.clone(), FailurePolicy::Abort)
        .run(&ws.input, &ws.preprocessed);
    assert!(abort.is_err());

    let outcome = PreprocessUseCase::with_default_normalizer(store, FailurePolicy::Skip)
        .run(&ws.input, &ws.preprocessed)?;
    assert_eq!(outcome.tables.len(), 2);
    assert_eq!(outcome.report.failed.len(), 1);
    assert!(!ws.preprocessed.join("0_broken.csv").exists());
    Ok(())
}
