//! Global SSIM: structural similarity from whole-image statistics.
//!
//! ```text
//! index = ((2 μx μy + C1) (2 σxy + C2)) / ((μx² + μy² + C1) (σx² + σy² + C2))
//! ```
//!
//! One mean/variance/covariance triple per image pair, no windowing. This is
//! cheap (three passes over the pixels) but only weakly localised: a small
//! region of heavy artifacts is diluted by the rest of the image.

use imgref::ImgRef;

use super::stats::{LumaStats, covariance};
use super::{Similarity, SimilarityConfig, SimilarityMetric};
use crate::error::Result;

/// SSIM computed over global luminance statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSsim {
    config: SimilarityConfig,
}

impl GlobalSsim {
    /// Create a metric with explicit constants.
    #[must_use]
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// The constants in use.
    #[must_use]
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Compute the index, propagating dimension and pixel-count errors.
    pub fn try_index(&self, reference: ImgRef<'_, u8>, test: ImgRef<'_, u8>) -> Result<f64> {
        let cov = covariance(reference, test)?;
        let x = LumaStats::compute(reference)?;
        let y = LumaStats::compute(test)?;

        let c1 = self.config.c1();
        let c2 = self.config.c2();

        let numerator = (2.0 * x.mean * y.mean + c1) * (2.0 * cov + c2);
        let denominator =
            (x.mean * x.mean + y.mean * y.mean + c1) * (x.variance + y.variance + c2);

        Ok(numerator / denominator)
    }
}

impl SimilarityMetric for GlobalSsim {
    fn name(&self) -> &str {
        "ssim"
    }

    fn compare(&self, reference: ImgRef<'_, u8>, test: ImgRef<'_, u8>) -> Similarity {
        match self.try_index(reference, test) {
            Ok(index) => Similarity::Index(index),
            Err(e) => Similarity::Incomparable(e.to_string()),
        }
    }
}
