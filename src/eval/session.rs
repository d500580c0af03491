//! Recompression session: search, select, materialize.
//!
//! [`RecompressSession`] ties one codec and one similarity metric to a
//! validated [`SearchConfig`]. Each call to [`RecompressSession::run`] loads
//! nothing from disk; the caller passes in a decoded [`SourceImage`] and gets
//! back the bytes to write plus a [`RecompressReport`].

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::eval::evaluator::CandidateEvaluator;
use crate::eval::report::RecompressReport;
use crate::metrics::{GlobalSsim, SimilarityMetric};
use crate::search::{Decision, OutcomeSelector, QualitySearch, SearchConfig};
use crate::source::SourceImage;

/// What to put at the destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Freshly encoded bytes.
    Encoded(Vec<u8>),
    /// Copy the source file unchanged.
    CopySource,
    /// Write nothing.
    NoMatch,
}

/// The result of recompressing one image.
#[derive(Debug, Clone)]
pub struct Recompression {
    /// What to write.
    pub output: Output,
    /// How the decision was reached.
    pub report: RecompressReport,
}

impl Recompression {
    /// Write the output to `dest`. Returns `false` when there was nothing to
    /// write.
    ///
    /// The bytes are staged in a temporary file next to `dest` and renamed
    /// into place, so a failed write never leaves a partial file at `dest`.
    pub fn write_to(&self, dest: &Path) -> Result<bool> {
        if self.output == Output::NoMatch {
            return Ok(false);
        }

        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;

        match &self.output {
            Output::Encoded(bytes) => staged.write_all(bytes)?,
            Output::CopySource => {
                let mut source = File::open(&self.report.source_path)?;
                std::io::copy(&mut source, &mut staged)?;
            }
            Output::NoMatch => {}
        }
        staged.as_file().sync_all()?;
        staged.persist(dest).map_err(|e| e.error)?;

        tracing::debug!(dest = %dest.display(), "wrote output");
        Ok(true)
    }
}

/// Recompresses images with one codec and one metric.
pub struct RecompressSession<C, M = GlobalSsim> {
    config: SearchConfig,
    codec: C,
    metric: M,
}

impl<C: Codec> RecompressSession<C, GlobalSsim> {
    /// Create a session scored with the default global SSIM.
    pub fn with_ssim(config: SearchConfig, codec: C) -> Result<Self> {
        Self::new(config, codec, GlobalSsim::default())
    }
}

impl<C: Codec, M: SimilarityMetric> RecompressSession<C, M> {
    /// Create a session. The configuration is validated here.
    pub fn new(config: SearchConfig, codec: C, metric: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            codec,
            metric,
        })
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for the smallest encoding of `source` meeting the target and
    /// decide what to emit.
    pub fn run(&self, source: &SourceImage) -> Result<Recompression> {
        let pixels = source.image.pixel_count();
        if pixels < 2 {
            return Err(Error::TooFewPixels { pixels });
        }

        tracing::info!(
            source = %source.path.display(),
            original_size = source.file_size,
            codec = self.codec.id(),
            metric = self.metric.name(),
            "recompressing"
        );

        let mut evaluator = CandidateEvaluator::new(&self.codec, &self.metric, &source.image);
        let outcome = QualitySearch::new(&self.config)?.run(&mut evaluator, source.file_size)?;
        let decision =
            OutcomeSelector::new(self.config.allow_fallback_copy).select(&outcome, source.is_jpeg);

        let output = match decision {
            Decision::EncodeBest(c) | Decision::EncodeFallback(c) => {
                Output::Encoded(self.codec.encode(&source.image, c.quality)?)
            }
            Decision::CopySource => Output::CopySource,
            Decision::NoMatch => Output::NoMatch,
        };

        let final_size = match &output {
            Output::Encoded(bytes) => Some(bytes.len() as u64),
            Output::CopySource => Some(source.file_size),
            Output::NoMatch => None,
        };

        let report = RecompressReport {
            source_path: source.path.clone(),
            width: source.image.width() as u32,
            height: source.image.height() as u32,
            original_size: source.file_size,
            codec: self.codec.id().to_string(),
            metric: self.metric.name().to_string(),
            config: self.config.clone(),
            attempts: outcome.attempts,
            termination: outcome.termination,
            decision,
            final_size,
            timestamp: chrono::Utc::now(),
        };

        Ok(Recompression { output, report })
    }
}
