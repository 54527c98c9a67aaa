//! Per-trial correctness rule.

use crate::constants::stimulus_category;
use crate::types::{CorrectResult, CueType};

/// The stimulus the participant was cued to attend to, or `None` when the cue is not usable.
pub fn cued_stimulus<'a>(cue_type: &CueType, image_name: &'a str, audio_name: &'a str) -> Option<&'a str> {
    match cue_type {
        CueType::Visual => Some(image_name),
        CueType::Auditory => Some(audio_name),
        CueType::Unassigned | CueType::Other(_) => None,
    }
}

/// Score one trial.
///
/// An unknown stimulus expects the empty category, so an empty click on an
/// unknown stimulus scores as correct. Callers warn about unknown stimuli.
pub fn is_correct(
    cue_type: &CueType,
    image_name: &str,
    audio_name: &str,
    category_clicked: &str,
) -> CorrectResult {
    let Some(stimulus) = cued_stimulus(cue_type, image_name, audio_name) else {
        return CorrectResult::Null;
    };
    let expected = stimulus_category(stimulus).unwrap_or("");
    if category_clicked == expected {
        CorrectResult::Correct
    } else {
        CorrectResult::Incorrect
    }
}
