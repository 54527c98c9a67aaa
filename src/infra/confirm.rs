use std::io::{self, BufRead, Write};

use crate::app::ports::ConfirmPort;
use crate::error::Result;

/// Whether a typed answer approves the prompt: only `y` (any case, surrounding space ignored).
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Prompts on stdout and reads one line from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl ConfirmPort for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{} [y/n] ", prompt)?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Approves every prompt, for `--yes` and unattended runs
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ConfirmPort for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}
