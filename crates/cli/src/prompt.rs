//! Interactive conflict prompt
//!
//! Asks on the terminal what to do with an existing target while the batch
//! policy is `ask`. Without an attended terminal every conflict is skipped.

use async_trait::async_trait;
use console::{Term, style};
use indicatif::ProgressBar;
use tracing::warn;

use gd_core::sync::{Conflict, Direction};
use gd_core::{Action, CancelFlag, ConflictResolver, Decision, Error, Result};

const CHOICES: &str = "[s]kip, [o]verwrite, [c]opy, or as/ao/ac for all remaining";

/// Terminal-backed [`ConflictResolver`]
pub struct TerminalPrompt {
    term: Term,
    bar: Option<ProgressBar>,
    cancel: CancelFlag,
}

impl TerminalPrompt {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            term: Term::stderr(),
            bar: None,
            cancel,
        }
    }

    /// Hide `bar` while a question is on screen
    pub fn with_progress(mut self, bar: Option<&ProgressBar>) -> Self {
        self.bar = bar.cloned();
        self
    }

    fn ask(term: &Term, question: &str) -> Result<Decision> {
        loop {
            term.write_line(question)?;
            term.write_str("> ")?;
            let answer = term.read_line()?;
            if answer.trim().is_empty() {
                continue;
            }
            match answer.parse::<Decision>() {
                Ok(decision) => return Ok(decision),
                Err(e) => term.write_line(&e.to_string())?,
            }
        }
    }
}

/// Question shown for `conflict`
pub fn question(conflict: &Conflict) -> String {
    let (what, place) = match conflict.direction {
        Direction::Upload => ("already exists in the drive folder", "remote"),
        Direction::Download => ("already exists in the local folder", "local"),
    };
    format!(
        "'{}' {what} '{}' ({place}). {CHOICES}",
        conflict.path, conflict.location
    )
}

#[async_trait]
impl ConflictResolver for TerminalPrompt {
    async fn decide(&self, conflict: &Conflict) -> Result<Decision> {
        if !self.term.is_term() {
            warn!(path = %conflict.path, "No terminal to ask on, skipping");
            return Ok(Decision::once(Action::Skip));
        }

        let term = self.term.clone();
        let bar = self.bar.clone();
        let text = format!("{} {}", style("?").yellow(), question(conflict));
        let decision = tokio::task::spawn_blocking(move || match bar {
            Some(bar) => bar.suspend(|| Self::ask(&term, &text)),
            None => Self::ask(&term, &text),
        })
        .await
        .map_err(|e| Error::General(format!("Prompt failed: {e}")))?;

        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }
        decision.map_err(|e| match e {
            Error::Io(_) => Error::Interrupted,
            other => other,
        })
    }
}
