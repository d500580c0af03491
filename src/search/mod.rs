//! Adaptive quality search and outcome selection.
//!
//! - [`controller::QualitySearch`]: bisection-shaped search over `[min, max]`
//!   quality with an asymmetric decision table
//! - [`outcome::OutcomeSelector`]: best candidate, fallback, verbatim copy or
//!   no match
//! - [`SearchConfig`]: user-facing search options

pub mod controller;
pub mod outcome;

pub use controller::{Attempt, QualitySearch, SearchOutcome, SearchState, Termination};
pub use outcome::{Decision, OutcomeSelector};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options consumed by the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Lowest quality the search may pick (0-99).
    pub min_quality: u8,
    /// Highest quality the search may pick (1-100).
    pub max_quality: u8,
    /// Similarity index a candidate must reach, in (0, 1].
    pub target: f64,
    /// Maximum number of encode attempts.
    pub max_attempts: u32,
    /// When no candidate beats the source size, copy the source (JPEG) or
    /// emit the fallback candidate (other formats). When false, nothing is
    /// written.
    pub allow_fallback_copy: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_quality: 40,
            max_quality: 95,
            target: 0.99995,
            max_attempts: 6,
            allow_fallback_copy: true,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.max_quality) {
            return Err(invalid("maximum quality has to be between 1 and 100"));
        }
        if self.min_quality > 99 {
            return Err(invalid("minimum quality has to be between 0 and 99"));
        }
        if self.min_quality >= self.max_quality {
            return Err(invalid(format!(
                "minimum quality ({}) has to be below maximum quality ({})",
                self.min_quality, self.max_quality
            )));
        }
        if !(self.target > 0.0 && self.target <= 1.0) {
            return Err(invalid(format!(
                "target has to be in (0, 1], got {}",
                self.target
            )));
        }
        if self.max_attempts == 0 {
            return Err(invalid("attempts has to be more than 0"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfiguration(message.into())
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    min_quality: Option<u8>,
    max_quality: Option<u8>,
    target: Option<f64>,
    max_attempts: Option<u32>,
    allow_fallback_copy: Option<bool>,
}

impl SearchConfigBuilder {
    /// Set the lowest quality.
    #[must_use]
    pub fn min_quality(mut self, quality: u8) -> Self {
        self.min_quality = Some(quality);
        self
    }

    /// Set the highest quality.
    #[must_use]
    pub fn max_quality(mut self, quality: u8) -> Self {
        self.max_quality = Some(quality);
        self
    }

    /// Set the similarity target.
    #[must_use]
    pub fn target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the attempt limit.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Allow or forbid the copy/fallback path.
    #[must_use]
    pub fn allow_fallback_copy(mut self, allow: bool) -> Self {
        self.allow_fallback_copy = Some(allow);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<SearchConfig> {
        let defaults = SearchConfig::default();
        let config = SearchConfig {
            min_quality: self.min_quality.unwrap_or(defaults.min_quality),
            max_quality: self.max_quality.unwrap_or(defaults.max_quality),
            target: self.target.unwrap_or(defaults.target),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            allow_fallback_copy: self
                .allow_fallback_copy
                .unwrap_or(defaults.allow_fallback_copy),
        };
        config.validate()?;
        Ok(config)
    }
}
