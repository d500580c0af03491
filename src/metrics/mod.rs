//! Similarity metrics for comparing a source image with its re-encoded copy.
//!
//! The search controller only depends on the [`SimilarityMetric`] trait. The
//! bundled implementation is [`ssim::GlobalSsim`], a single-pass SSIM over
//! whole-image statistics rather than sliding windows.
//!
//! ## Reading the index
//!
//! | Index | Meaning |
//! |-------|---------|
//! | 1.0 | Identical luminance statistics |
//! | > 0.9999 | Typically indistinguishable after JPEG round trip |
//! | < 0.99 | Visible structural change |
//! | 0.0 | Incomparable images (see [`Similarity::Incomparable`]) |

pub mod ssim;
pub mod stats;

use imgref::ImgRef;
use serde::{Deserialize, Serialize};

pub use ssim::GlobalSsim;
pub use stats::{LumaStats, covariance, mean};

/// Outcome of comparing two images.
#[derive(Debug, Clone, PartialEq)]
pub enum Similarity {
    /// A computed similarity index. Higher is more similar.
    Index(f64),
    /// The images could not be compared (different dimensions, or too few
    /// pixels for sample statistics).
    Incomparable(String),
}

impl Similarity {
    /// The index, with incomparable images scored as completely dissimilar.
    #[must_use]
    pub fn index_or_worst(&self) -> f64 {
        match self {
            Self::Index(index) => *index,
            Self::Incomparable(_) => 0.0,
        }
    }

    /// Whether an index was computed.
    #[must_use]
    pub fn is_comparable(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// A whole-image similarity measure between a reference and a test image.
///
/// Both images are 8-bit grayscale.
pub trait SimilarityMetric {
    /// Short name used in logs and reports (e.g. "ssim").
    fn name(&self) -> &str;

    /// Compare `test` against `reference`.
    fn compare(&self, reference: ImgRef<'_, u8>, test: ImgRef<'_, u8>) -> Similarity;

    /// Compare and collapse to a plain index. Incomparable images score 0.0.
    fn compute_index(&self, reference: ImgRef<'_, u8>, test: ImgRef<'_, u8>) -> f64 {
        let similarity = self.compare(reference, test);
        if let Similarity::Incomparable(reason) = &similarity {
            tracing::warn!(metric = self.name(), %reason, "images are incomparable, scoring 0.0");
        }
        similarity.index_or_worst()
    }
}

/// Constants of the SSIM formula.
///
/// `C1 = (K1 * L)²` and `C2 = (K2 * L)²` stabilise the luminance and contrast
/// terms when means or variances approach zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Luminance stabiliser coefficient.
    pub k1: f64,
    /// Contrast stabiliser coefficient.
    pub k2: f64,
    /// Dynamic range of pixel values (`L`).
    pub dynamic_range: f64,
}

impl SimilarityConfig {
    /// `C1 = (K1 * L)²`.
    #[must_use]
    pub fn c1(&self) -> f64 {
        (self.k1 * self.dynamic_range).powi(2)
    }

    /// `C2 = (K2 * L)²`.
    #[must_use]
    pub fn c2(&self) -> f64 {
        (self.k2 * self.dynamic_range).powi(2)
    }
}

impl Default for SimilarityConfig {
    /// K1 = 0.01, K2 = 0.03 for 8-bit samples.
    fn default() -> Self {
        Self {
            k1: 0.01,
            k2: 0.03,
            dynamic_range: 255.0,
        }
    }
}
