//! Fixed column names and lookup tables for the animal/vehicle cueing experiment.
//! Schema drift in either export requires a change here.

// Raw per-participant export columns
pub const PARTICIPANT: &str = "participant";
pub const DATE: &str = "date";
pub const EXP_NAME: &str = "expName";
pub const PSYCHOPY_VERSION: &str = "psychopyVersion";
pub const OS: &str = "OS";
pub const FRAME_RATE: &str = "frameRate";
pub const RAW_REACTION_TIME: &str = "mouse_2.time";
pub const RAW_CATEGORY_CLICKED: &str = "mouse_2.clicked_name";
pub const IMAGE_NAME: &str = "imageName";
pub const AUDIO_NAME: &str = "audioName";
pub const CONGRUENCE_TYPE: &str = "congruenceType";
pub const RAW_CUE_TYPE: &str = "cueType";

// Canonical names introduced by the record normalizer
pub const REACTION_TIME: &str = "ReactionTime";
pub const CATEGORY_CLICKED: &str = "CategoryClicked";
pub const CUE_TYPE: &str = "CueType";
pub const CORRECT_RESULT: &str = "CorrectResult";

// Session date column name in the merged output
pub const MERGED_DATE: &str = "Date";

/// The 11 raw columns kept by the record normalizer, in output order.
pub const RAW_TRIAL_COLUMNS: [&str; 11] = [
    PARTICIPANT,
    DATE,
    EXP_NAME,
    PSYCHOPY_VERSION,
    OS,
    FRAME_RATE,
    RAW_REACTION_TIME,
    RAW_CATEGORY_CLICKED,
    IMAGE_NAME,
    AUDIO_NAME,
    CONGRUENCE_TYPE,
];

/// Session-constant columns, stated once per participant.
pub const SESSION_COLUMNS: [&str; 6] = [PARTICIPANT, DATE, EXP_NAME, PSYCHOPY_VERSION, OS, FRAME_RATE];

/// Columns of a cleaned per-participant file, in order.
pub const CLEANED_COLUMNS: [&str; 13] = [
    PARTICIPANT,
    DATE,
    EXP_NAME,
    PSYCHOPY_VERSION,
    OS,
    FRAME_RATE,
    REACTION_TIME,
    CATEGORY_CLICKED,
    IMAGE_NAME,
    AUDIO_NAME,
    CONGRUENCE_TYPE,
    CUE_TYPE,
    CORRECT_RESULT,
];

/// Columns the merger leaves populated on every row.
pub const PER_ROW_COLUMNS: [&str; 7] = [
    REACTION_TIME,
    CATEGORY_CLICKED,
    IMAGE_NAME,
    AUDIO_NAME,
    CONGRUENCE_TYPE,
    CUE_TYPE,
    CORRECT_RESULT,
];

// Experimental design
pub const BLOCK_SIZE: usize = 60;
pub const TRIALS_PER_SESSION: usize = 2 * BLOCK_SIZE;
/// One metadata-anchor row plus the trial rows.
pub const MAX_CLEANED_ROWS: usize = TRIALS_PER_SESSION + 1;
/// Row cadence at which the merged table restates per-participant fields.
pub const MERGE_ANCHOR_INTERVAL: usize = 120;

pub const VISUAL_CUE: &str = "visual";
pub const AUDITORY_CUE: &str = "auditory";

pub const ANIMAL: &str = "a";
pub const VEHICLE: &str = "v";

/// Stimulus name to category letter (`a` animal, `v` vehicle).
pub const STIMULUS_CATEGORIES: [(&str, &str); 10] = [
    ("cat", ANIMAL),
    ("frog", ANIMAL),
    ("dog", ANIMAL),
    ("monkey", ANIMAL),
    ("elephant", ANIMAL),
    ("car", VEHICLE),
    ("boat", VEHICLE),
    ("train", VEHICLE),
    ("bike", VEHICLE),
    ("motorcycle", VEHICLE),
];

/// Look up the category letter of a stimulus name.
pub fn stimulus_category(name: &str) -> Option<&'static str> {
    STIMULUS_CATEGORIES
        .iter()
        .find(|(stimulus, _)| *stimulus == name)
        .map(|(_, category)| *category)
}

/// Participant value the survey and the experiment use for "no id entered".
pub const UNKNOWN_PARTICIPANT: &str = "Unknown";

/// Records at these positions of the survey export are decoration.
pub const DEMOGRAPHICS_DECORATION_ROWS: [usize; 2] = [0, 2];
/// Record holding the real question-text header.
pub const DEMOGRAPHICS_HEADER_ROW: usize = 1;

// Canonical demographics names
pub const DEMO_PARTICIPANT: &str = "participant";
pub const DEMO_COMPLETION_DATE: &str = "date";

/// Survey question text and the canonical name each is renamed to.
/// The first two entries are the join key and the completion date; the rest are answers.
pub const DEMOGRAPHICS_COLUMNS: [(&str, &str); 17] = [
    ("Participant ID:", DEMO_PARTICIPANT),
    ("End Date", DEMO_COMPLETION_DATE),
    ("What is your child's gender?", "Gender"),
    ("What is your child's race? (Select all that apply)", "Race"),
    ("Is your child Hispanic or Latino?", "Ethnicity"),
    ("What language(s) does your child speak at home?", "HomeLanguage"),
    ("Is English your child's primary language?", "PrimaryLanguageEnglish"),
    ("Does your child have normal or corrected-to-normal vision?", "Vision"),
    ("Does your child have any known hearing difficulties?", "Hearing"),
    ("Is your child colorblind?", "ColorVision"),
    ("What is your child's date of birth?", "BirthDate"),
    ("What device did your child use to complete the experiment?", "Device"),
    ("How did your child respond during the experiment?", "InputMethod"),
    ("Did your child use headphones or speakers?", "AudioOutput"),
    ("Did you experience any technical issues during the experiment?", "TechnicalIssues"),
    ("If yes, please describe the technical issues.", "TechnicalIssuesDescription"),
    ("Did your child need help from an adult to complete the experiment?", "AdultAssistance"),
];

/// Number of survey answers carried per participant (everything but id and completion date).
pub const DEMOGRAPHIC_ANSWER_COUNT: usize = DEMOGRAPHICS_COLUMNS.len() - 2;

/// Canonical names of the survey answers, in output order.
pub fn demographic_answer_names() -> impl Iterator<Item = &'static str> {
    DEMOGRAPHICS_COLUMNS.iter().skip(2).map(|(_, name)| *name)
}

// Raw files the quarantine step removes
pub const UNWANTED_SUFFIXES: [&str; 3] = [".log.gz", ".log", ".psydat"];
pub const DEFAULT_MIN_FILE_SIZE_BYTES: u64 = 20 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stimulus_lookup() {
        assert_eq!(stimulus_category("cat"), Some("a"));
        assert_eq!(stimulus_category("motorcycle"), Some("v"));
        assert_eq!(stimulus_category("zebra"), None);
    }

    #[test]
    fn test_demographic_answers_exclude_key_and_date() {
        let names: Vec<_> = demographic_answer_names().collect();
        assert_eq!(names.len(), DEMOGRAPHIC_ANSWER_COUNT);
        assert_eq!(names.len(), 15);
        assert!(!names.contains(&DEMO_PARTICIPANT));
        assert!(!names.contains(&DEMO_COMPLETION_DATE));
    }
}
