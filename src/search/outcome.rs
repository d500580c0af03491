//! Choose what to emit once the search is over.

use serde::{Deserialize, Serialize};

use crate::eval::Candidate;
use crate::search::SearchOutcome;

/// What the recompressor should produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Re-encode the color original at the best candidate's quality.
    EncodeBest(Candidate),
    /// No candidate met the target; re-encode at the fallback's quality.
    EncodeFallback(Candidate),
    /// No candidate met the target and the source is already JPEG; copy it.
    CopySource,
    /// Nothing is written.
    NoMatch,
}

impl Decision {
    /// The candidate whose quality will be re-encoded, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::EncodeBest(c) | Self::EncodeFallback(c) => Some(c),
            Self::CopySource | Self::NoMatch => None,
        }
    }
}

/// Picks between best candidate, fallback, verbatim copy and no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSelector {
    allow_fallback_copy: bool,
}

impl OutcomeSelector {
    /// Create a selector. With `allow_fallback_copy` off, a search without a
    /// best candidate produces no output.
    #[must_use]
    pub fn new(allow_fallback_copy: bool) -> Self {
        Self {
            allow_fallback_copy,
        }
    }

    /// Decide from a finished search. `source_is_jpeg` comes from sniffing
    /// the source file's content.
    #[must_use]
    pub fn select(&self, outcome: &SearchOutcome, source_is_jpeg: bool) -> Decision {
        let decision = match outcome.best {
            Some(best) if best.size < outcome.original_size => Decision::EncodeBest(best),
            _ if !self.allow_fallback_copy => Decision::NoMatch,
            // Copying avoids another generation of JPEG loss.
            _ if source_is_jpeg => Decision::CopySource,
            _ => match outcome.fallback {
                Some(fallback) => Decision::EncodeFallback(fallback),
                None => Decision::NoMatch,
            },
        };
        tracing::info!(?decision, "selected outcome");
        decision
    }
}
