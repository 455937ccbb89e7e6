/// Outcome of handling one listed post
use crate::config::LedgerPolicy;
use std::fmt;

/// What happened to a single post during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostOutcome {
    /// Already in the ledger snapshot; not extracted
    AlreadySeen,

    /// Extracted, but there was nothing to save
    Empty,

    /// Extracted and saved
    Saved,

    /// Extraction or save failed
    Failed,
}

impl PostOutcome {
    /// Returns true if the post counts toward the run's success tally
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if the post was dispatched to the extractor this run
    pub fn is_attempted(&self) -> bool {
        !matches!(self, Self::AlreadySeen)
    }

    /// Returns true if the post identifier must be appended to the ledger
    pub fn should_ledger(&self, policy: LedgerPolicy) -> bool {
        match policy {
            LedgerPolicy::EveryAttempt => self.is_attempted(),
            LedgerPolicy::SuccessOnly => self.is_success(),
        }
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadySeen => "already_seen",
            Self::Empty => "empty",
            Self::Saved => "saved",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
