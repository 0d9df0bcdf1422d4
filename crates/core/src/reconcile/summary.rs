//! Run tally and summary message

use cadence_domain::RunSummary;

use super::error::ReconcileError;

/// Result of the push phase
#[derive(Debug, Default)]
pub struct PushOutcome {
    pub pushed: usize,
    pub failed: usize,
    /// Candidate listing failed; nothing was attempted.
    pub listing_error: Option<String>,
}

/// Result of the pull phase
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PullOutcome {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Accumulates phase results into a [`RunSummary`]
#[derive(Debug, Default)]
pub struct RunTally {
    forced: bool,
    push: PushOutcome,
    pull: Option<Result<PullOutcome, ReconcileError>>,
}

impl RunTally {
    pub fn new(forced: bool) -> Self {
        Self { forced, ..Self::default() }
    }

    pub fn record_push(&mut self, outcome: PushOutcome) {
        self.push = outcome;
    }

    pub fn record_pull(&mut self, outcome: Result<PullOutcome, ReconcileError>) {
        self.pull = Some(outcome);
    }

    pub fn into_summary(self) -> RunSummary {
        let pull = match &self.pull {
            Some(Ok(outcome)) => *outcome,
            _ => PullOutcome::default(),
        };
        let message = self.message(&pull);

        RunSummary {
            pushed: self.push.pushed,
            imported: pull.imported,
            updated: pull.updated,
            skipped: pull.skipped,
            failed: self.push.failed + pull.failed,
            message,
        }
    }

    fn message(&self, pull: &PullOutcome) -> String {
        let mut parts = Vec::new();
        let prefix = if self.forced { "Forced sync: " } else { "" };
        parts.push(format!("{prefix}pushed {} appointment(s) to calendar", self.push.pushed));

        if let Some(Ok(_)) = &self.pull {
            parts.push(format!(
                "imported {} and updated {} from calendar",
                pull.imported, pull.updated
            ));
        }
        if pull.skipped > 0 {
            parts.push(format!("skipped {} unsyncable event(s)", pull.skipped));
        }

        let failed = self.push.failed + pull.failed;
        if failed > 0 {
            parts.push(format!("{failed} item(s) failed"));
        }
        if let Some(err) = &self.push.listing_error {
            parts.push(format!("push candidates unavailable: {err}"));
        }
        if let Some(Err(err)) = &self.pull {
            parts.push(err.to_string());
        }

        parts.join("; ")
    }
}
