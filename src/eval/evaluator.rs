//! Evaluate one quality level: encode, decode, compare.

use imgref::{ImgRef, ImgVec};
use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::Result;
use crate::metrics::SimilarityMetric;
use crate::pixel::ImageData;

/// The outcome of encoding the source at one quality level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Quality level (0-100).
    pub quality: u8,
    /// Encoded size in bytes.
    pub size: u64,
    /// Similarity index of the decoded result against the source.
    pub index: f64,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(quality: u8, size: u64, index: f64) -> Self {
        Self {
            quality,
            size,
            index,
        }
    }

    /// Size as a percentage of `original_size`.
    #[must_use]
    pub fn percent_of(&self, original_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }
        self.size as f64 / original_size as f64 * 100.0
    }
}

/// Anything that can turn a quality level into a [`Candidate`].
///
/// The search controller is written against this trait so it can be driven
/// by a real codec or by a scripted sequence in tests.
pub trait Evaluate {
    /// Evaluate `quality`. Errors abort the search.
    fn evaluate(&mut self, quality: u8) -> Result<Candidate>;
}

/// Evaluates quality levels by round-tripping the source through a codec.
///
/// The grayscale reference is computed once; each evaluation allocates its
/// own encoded buffer and decoded image and drops them before returning.
pub struct CandidateEvaluator<'a, C: ?Sized, M: ?Sized> {
    codec: &'a C,
    metric: &'a M,
    original: &'a ImageData,
    reference: ImgVec<u8>,
}

impl<'a, C, M> CandidateEvaluator<'a, C, M>
where
    C: Codec + ?Sized,
    M: SimilarityMetric + ?Sized,
{
    /// Create an evaluator for `original`.
    pub fn new(codec: &'a C, metric: &'a M, original: &'a ImageData) -> Self {
        Self {
            codec,
            metric,
            original,
            reference: original.to_gray(),
        }
    }

    /// The grayscale reference image.
    pub fn reference(&self) -> ImgRef<'_, u8> {
        self.reference.as_ref()
    }

    /// Encode the color original at `quality` and score the decoded result.
    pub fn evaluate_quality(&self, quality: u8) -> Result<Candidate> {
        let encoded = self.codec.encode(self.original, quality)?;
        let decoded = self.codec.decode(&encoded)?;
        let decoded_gray = decoded.to_gray();
        let index = self
            .metric
            .compute_index(self.reference.as_ref(), decoded_gray.as_ref());

        tracing::debug!(
            codec = self.codec.id(),
            metric = self.metric.name(),
            quality,
            size = encoded.len(),
            index,
            "evaluated candidate"
        );

        Ok(Candidate::new(quality, encoded.len() as u64, index))
    }
}

impl<C, M> Evaluate for CandidateEvaluator<'_, C, M>
where
    C: Codec + ?Sized,
    M: SimilarityMetric + ?Sized,
{
    fn evaluate(&mut self, quality: u8) -> Result<Candidate> {
        self.evaluate_quality(quality)
    }
}
