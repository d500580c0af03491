//! The quality search controller.
//!
//! Size and similarity are not monotonic in encoder quality, so this is not a
//! plain binary search on the index. Each attempt still halves the bracket,
//! but the direction comes from a 2×2 table over (size vs. original,
//! index vs. target):
//!
//! | | index < target | index ≥ target |
//! |---|---|---|
//! | size ≥ original | stop the search | lower `max` |
//! | size < original | raise `min` | lower `max` (stop on exact match) |
//!
//! The stop in the top-left cell is a heuristic: it assumes similarity is
//! roughly non-decreasing in quality over the explored range. Images where
//! that does not hold may stop early with a usable quality left unexplored.
//! The result is locally consistent with the explored path, not a global
//! optimum.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::{Candidate, Evaluate};
use crate::search::SearchConfig;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// `min == max`: no quality left to try.
    BracketCollapsed,
    /// The attempt limit was reached.
    AttemptsExhausted,
    /// A candidate did not shrink the file and already missed the target.
    NoImprovementPossible,
    /// A smaller candidate hit the target exactly.
    ExactMatch,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BracketCollapsed => write!(f, "bracket collapsed"),
            Self::AttemptsExhausted => write!(f, "attempts exhausted"),
            Self::NoImprovementPossible => write!(f, "no improvement possible"),
            Self::ExactMatch => write!(f, "exact match"),
        }
    }
}

/// One evaluated attempt and the bracket it left behind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// The evaluated candidate.
    pub candidate: Candidate,
    /// Lower bound after this attempt.
    pub min_quality: u8,
    /// Upper bound after this attempt.
    pub max_quality: u8,
}

/// Mutable state of one search. Invariant: `min_quality <= max_quality <= 100`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Lower bound of the bracket.
    pub min_quality: u8,
    /// Upper bound of the bracket.
    pub max_quality: u8,
    /// Attempts made so far.
    pub attempt: u32,
    /// Smallest candidate that beat the original size and met the target.
    pub best: Option<Candidate>,
    /// Closest-to-original candidate, kept regardless of the target.
    pub fallback: Option<Candidate>,
}

impl SearchState {
    /// Start a search over `[min_quality, max_quality]`.
    #[must_use]
    pub fn new(min_quality: u8, max_quality: u8) -> Self {
        Self {
            min_quality,
            max_quality,
            attempt: 0,
            best: None,
            fallback: None,
        }
    }

    /// Whether there is no quality left to try.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.min_quality == self.max_quality
    }

    /// Integer midpoint of the bracket.
    #[must_use]
    pub fn midpoint(&self) -> u8 {
        self.min_quality + (self.max_quality - self.min_quality) / 2
    }

    /// Apply the decision table to the bracket. Returns a termination when
    /// the candidate ends the search.
    pub fn narrow(
        &mut self,
        candidate: &Candidate,
        original_size: u64,
        target: f64,
    ) -> Option<Termination> {
        let q = candidate.quality;
        let lower_max = q.saturating_sub(1).max(self.min_quality);

        if candidate.size >= original_size {
            if candidate.index < target {
                return Some(Termination::NoImprovementPossible);
            }
            self.max_quality = lower_max;
        } else if candidate.index < target {
            self.min_quality = (q + 1).min(self.max_quality);
        } else if candidate.index > target {
            self.max_quality = lower_max;
        } else {
            return Some(Termination::ExactMatch);
        }
        None
    }

    /// Update the best and fallback candidates.
    pub fn record(&mut self, candidate: Candidate, original_size: u64, target: f64) {
        let beats_best = self.best.map_or(true, |best| candidate.size < best.size);
        if candidate.size < original_size && candidate.index >= target && beats_best {
            self.best = Some(candidate);
        }

        // Prefer the largest size not exceeding the original; above the
        // original, prefer the smallest.
        let replace_fallback = match self.fallback {
            None => true,
            Some(fallback) if candidate.size <= original_size => {
                fallback.size > original_size || candidate.size > fallback.size
            }
            Some(fallback) => fallback.size > original_size && candidate.size < fallback.size,
        };
        if replace_fallback {
            self.fallback = Some(candidate);
        }
    }
}

/// Result of a finished search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Size of the source file in bytes.
    pub original_size: u64,
    /// Best candidate, if any beat the original size at the target.
    pub best: Option<Candidate>,
    /// Fallback candidate, if any attempt ran.
    pub fallback: Option<Candidate>,
    /// Every attempt in order.
    pub attempts: Vec<Attempt>,
    /// Why the search stopped.
    pub termination: Termination,
}

/// Searches a quality bracket for the smallest encoding meeting a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySearch {
    min_quality: u8,
    max_quality: u8,
    target: f64,
    max_attempts: u32,
}

impl QualitySearch {
    /// Create a search from a configuration.
    ///
    /// Only the bracket shape is checked here (`min <= max <= 100`); a
    /// collapsed bracket is accepted and simply ends the search at once.
    /// Range checks on user input belong to [`SearchConfig::validate`].
    pub fn new(config: &SearchConfig) -> Result<Self> {
        if config.max_quality > 100 || config.min_quality > config.max_quality {
            return Err(Error::InvalidConfiguration(format!(
                "quality bracket [{}, {}] is not within 0..=100",
                config.min_quality, config.max_quality
            )));
        }
        Ok(Self {
            min_quality: config.min_quality,
            max_quality: config.max_quality,
            target: config.target,
            max_attempts: config.max_attempts,
        })
    }

    /// Run the search against an image whose source file is
    /// `original_size` bytes.
    ///
    /// An evaluation error aborts the whole search.
    pub fn run<E: Evaluate + ?Sized>(
        &self,
        evaluator: &mut E,
        original_size: u64,
    ) -> Result<SearchOutcome> {
        let mut state = SearchState::new(self.min_quality, self.max_quality);
        let mut attempts = Vec::new();
        let mut termination = Termination::AttemptsExhausted;

        while state.attempt < self.max_attempts {
            if state.is_collapsed() {
                termination = Termination::BracketCollapsed;
                break;
            }
            state.attempt += 1;

            let quality = state.midpoint();
            let candidate = evaluator.evaluate(quality)?;
            let stop = state.narrow(&candidate, original_size, self.target);
            state.record(candidate, original_size, self.target);

            tracing::info!(
                attempt = state.attempt,
                quality,
                index = candidate.index,
                size = candidate.size,
                min_quality = state.min_quality,
                max_quality = state.max_quality,
                "search attempt"
            );

            attempts.push(Attempt {
                attempt: state.attempt,
                candidate,
                min_quality: state.min_quality,
                max_quality: state.max_quality,
            });

            if let Some(reason) = stop {
                termination = reason;
                break;
            }
        }

        tracing::info!(
            %termination,
            attempts = attempts.len(),
            best = ?state.best.map(|c| c.quality),
            fallback = ?state.fallback.map(|c| c.quality),
            "search finished"
        );

        Ok(SearchOutcome {
            original_size,
            best: state.best,
            fallback: state.fallback,
            attempts,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Looks up each quality in a table; qualities not in the table get a
    /// size and index that grow with quality.
    struct Scripted {
        table: HashMap<u8, (u64, f64)>,
        calls: Vec<u8>,
    }

    impl Scripted {
        fn new(entries: &[(u8, u64, f64)]) -> Self {
            Self {
                table: entries.iter().map(|&(q, s, i)| (q, (s, i))).collect(),
                calls: Vec::new(),
            }
        }

        fn monotonic() -> Self {
            Self::new(&[])
        }
    }

    impl Evaluate for Scripted {
        fn evaluate(&mut self, quality: u8) -> Result<Candidate> {
            self.calls.push(quality);
            let (size, index) = self.table.get(&quality).copied().unwrap_or_else(|| {
                let q = f64::from(quality);
                (100 + u64::from(quality) * 10, 1.0 - (100.0 - q) / 1000.0)
            });
            Ok(Candidate::new(quality, size, index))
        }
    }

    fn config(min: u8, max: u8, target: f64, attempts: u32) -> SearchConfig {
        SearchConfig {
            min_quality: min,
            max_quality: max,
            target,
            max_attempts: attempts,
            allow_fallback_copy: true,
        }
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(SearchState::new(40, 95).midpoint(), 67);
        assert_eq!(SearchState::new(0, 1).midpoint(), 0);
        assert_eq!(SearchState::new(99, 100).midpoint(), 99);
        assert_eq!(SearchState::new(50, 50).midpoint(), 50);
    }

    #[test]
    fn test_decision_table() {
        let original = 1000;
        let target = 0.99;

        // Not smaller, below target: stop.
        let mut state = SearchState::new(40, 95);
        let stop = state.narrow(&Candidate::new(67, 1200, 0.98), original, target);
        assert_eq!(stop, Some(Termination::NoImprovementPossible));
        assert_eq!((state.min_quality, state.max_quality), (40, 95));

        // Not smaller, meets target: lower max.
        let mut state = SearchState::new(40, 95);
        assert_eq!(state.narrow(&Candidate::new(67, 1000, 0.995), original, target), None);
        assert_eq!((state.min_quality, state.max_quality), (40, 66));

        // Smaller, below target: raise min.
        let mut state = SearchState::new(40, 95);
        assert_eq!(state.narrow(&Candidate::new(67, 800, 0.98), original, target), None);
        assert_eq!((state.min_quality, state.max_quality), (68, 95));

        // Smaller, above target: lower max.
        let mut state = SearchState::new(40, 95);
        assert_eq!(state.narrow(&Candidate::new(67, 800, 0.995), original, target), None);
        assert_eq!((state.min_quality, state.max_quality), (40, 66));

        // Smaller, exactly on target: stop.
        let mut state = SearchState::new(40, 95);
        let stop = state.narrow(&Candidate::new(67, 800, 0.99), original, target);
        assert_eq!(stop, Some(Termination::ExactMatch));
    }

    #[test]
    fn test_narrowing_clamps_to_bracket() {
        let mut state = SearchState::new(0, 1);
        state.narrow(&Candidate::new(0, 10, 1.0), 100, 0.5);
        assert_eq!((state.min_quality, state.max_quality), (0, 0));

        let mut state = SearchState::new(99, 100);
        state.narrow(&Candidate::new(99, 10, 0.1), 100, 0.5);
        assert_eq!((state.min_quality, state.max_quality), (100, 100));
    }

    #[test]
    fn test_best_requires_smaller_size_and_target() {
        let mut state = SearchState::new(0, 100);
        state.record(Candidate::new(90, 1500, 1.0), 1000, 0.99);
        assert!(state.best.is_none());
        state.record(Candidate::new(30, 500, 0.5), 1000, 0.99);
        assert!(state.best.is_none());
        state.record(Candidate::new(70, 900, 0.995), 1000, 0.99);
        assert_eq!(state.best.map(|c| c.quality), Some(70));
        state.record(Candidate::new(60, 950, 0.999), 1000, 0.99);
        assert_eq!(state.best.map(|c| c.quality), Some(70));
        state.record(Candidate::new(50, 700, 0.99), 1000, 0.99);
        assert_eq!(state.best.map(|c| c.quality), Some(50));
    }

    #[test]
    fn test_fallback_prefers_closest_below_original() {
        let mut state = SearchState::new(0, 100);
        state.record(Candidate::new(50, 400, 0.9), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(50));
        state.record(Candidate::new(70, 800, 0.95), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(70));
        state.record(Candidate::new(60, 600, 0.93), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(70));
        state.record(Candidate::new(90, 1100, 0.999), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(70));
        state.record(Candidate::new(75, 1000, 0.96), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(75));
    }

    #[test]
    fn test_fallback_above_original_prefers_smallest() {
        let mut state = SearchState::new(0, 100);
        state.record(Candidate::new(90, 1500, 0.999), 1000, 0.99);
        state.record(Candidate::new(95, 1800, 0.9999), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(90));
        state.record(Candidate::new(85, 1200, 0.998), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(85));
        // Anything at or below the original wins over anything above it.
        state.record(Candidate::new(40, 300, 0.9), 1000, 0.99);
        assert_eq!(state.fallback.map(|c| c.quality), Some(40));
    }

    #[test]
    fn test_collapsed_bracket_evaluates_nothing() {
        let search = QualitySearch::new(&config(60, 60, 0.99, 6)).unwrap();
        let mut evaluator = Scripted::monotonic();
        let outcome = search.run(&mut evaluator, 10_000).unwrap();

        assert!(evaluator.calls.is_empty());
        assert!(outcome.attempts.is_empty());
        assert!(outcome.best.is_none());
        assert!(outcome.fallback.is_none());
        assert_eq!(outcome.termination, Termination::BracketCollapsed);
    }

    #[test]
    fn test_forced_stop_on_first_attempt() {
        // Every quality is larger than the original and misses the target.
        let search = QualitySearch::new(&config(40, 95, 0.9999, 6)).unwrap();
        let mut evaluator = Scripted::new(&[(67, 5000, 0.99)]);
        let outcome = search.run(&mut evaluator, 1000).unwrap();

        assert_eq!(evaluator.calls, vec![67]);
        assert_eq!(outcome.termination, Termination::NoImprovementPossible);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.fallback.map(|c| c.quality), Some(67));
    }

    #[test]
    fn test_low_target_sets_best_on_first_attempt() {
        let search = QualitySearch::new(&config(40, 95, 0.0, 1)).unwrap();
        let mut evaluator = Scripted::monotonic();
        let outcome = search.run(&mut evaluator, 10_000).unwrap();

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.best.map(|c| c.quality), Some(67));
        assert_eq!(outcome.termination, Termination::AttemptsExhausted);
    }

    #[test]
    fn test_converges_on_lowest_passing_quality() {
        // Index 1 - (100-q)/1000 meets 0.9455 from q = 46 upwards.
        let search = QualitySearch::new(&config(0, 100, 0.9455, 20)).unwrap();
        let mut evaluator = Scripted::monotonic();
        let outcome = search.run(&mut evaluator, 100_000).unwrap();

        assert_eq!(evaluator.calls, vec![50, 24, 37, 43, 46, 44]);
        assert_eq!(outcome.best.map(|c| c.quality), Some(46));
        assert_eq!(outcome.termination, Termination::BracketCollapsed);
    }

    #[test]
    fn test_exact_match_stops() {
        let search = QualitySearch::new(&config(40, 95, 0.97, 6)).unwrap();
        let mut evaluator = Scripted::new(&[(67, 500, 0.97)]);
        let outcome = search.run(&mut evaluator, 1000).unwrap();

        assert_eq!(outcome.termination, Termination::ExactMatch);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.best.map(|c| c.quality), Some(67));
    }

    #[test]
    fn test_bracket_never_grows_and_attempts_are_bounded() {
        for &(min, max, target, attempts) in &[
            (40u8, 95u8, 0.97, 6u32),
            (0, 100, 0.999, 3),
            (10, 20, 0.5, 50),
            (0, 100, 0.91, 100),
        ] {
            let search = QualitySearch::new(&config(min, max, target, attempts)).unwrap();
            let mut evaluator = Scripted::monotonic();
            let outcome = search.run(&mut evaluator, 800).unwrap();

            assert!(outcome.attempts.len() <= attempts as usize);
            let mut width = max - min;
            for attempt in &outcome.attempts {
                assert!(attempt.min_quality <= attempt.max_quality);
                assert!(attempt.max_quality <= 100);
                let next = attempt.max_quality - attempt.min_quality;
                assert!(next <= width);
                width = next;
            }
        }
    }

    #[test]
    fn test_best_invariant_holds_on_non_monotonic_sizes() {
        // Sizes jump around; index is fine everywhere above 45.
        let entries: Vec<(u8, u64, f64)> = (0..=100u8)
            .map(|q| {
                let size = 300 + u64::from(q) * 7 + u64::from(q % 7) * 90;
                let index = if q > 45 { 0.999 } else { 0.9 };
                (q, size, index)
            })
            .collect();
        let search = QualitySearch::new(&config(0, 100, 0.995, 10)).unwrap();
        let mut evaluator = Scripted::new(&entries);
        let original = 900;
        let outcome = search.run(&mut evaluator, original).unwrap();

        if let Some(best) = outcome.best {
            assert!(best.size < original);
            assert!(best.index >= 0.995);
            for attempt in &outcome.attempts {
                let c = attempt.candidate;
                if c.size < original && c.index >= 0.995 {
                    assert!(best.size <= c.size);
                }
            }
        }
    }

    #[test]
    fn test_evaluation_error_aborts() {
        struct Failing;
        impl Evaluate for Failing {
            fn evaluate(&mut self, quality: u8) -> Result<Candidate> {
                Err(Error::Decode {
                    codec: "test".to_string(),
                    message: format!("corrupt output at {quality}"),
                })
            }
        }

        let search = QualitySearch::new(&config(40, 95, 0.99, 6)).unwrap();
        assert!(matches!(
            search.run(&mut Failing, 1000),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_bracket() {
        assert!(QualitySearch::new(&config(80, 70, 0.99, 6)).is_err());
        assert!(QualitySearch::new(&config(0, 101, 0.99, 6)).is_err());
    }
}
