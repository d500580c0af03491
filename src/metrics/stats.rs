//! Whole-image luminance statistics.
//!
//! Standard deviation and covariance use the sample convention (Bessel's
//! correction, `N-1` denominator), so every function here needs at least two
//! pixels. The mean is the plain average and divides by `N`, not `N-1`, so
//! indices can differ slightly from tools that use `N-1` throughout.

use imgref::ImgRef;

use crate::error::{Error, Result};
use crate::pixel::Luma;

/// Mean and sample variance of an image's luminance.
///
/// Variance is stored directly; the SSIM denominator needs `stdev²` without a
/// `sqrt` round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaStats {
    /// Mean luminance.
    pub mean: f64,
    /// Sample variance of luminance.
    pub variance: f64,
}

impl LumaStats {
    /// Compute mean and sample variance over all pixels.
    pub fn compute<P: Luma>(img: ImgRef<'_, P>) -> Result<Self> {
        let n = sample_count(img.width(), img.height())?;
        let mean = mean(img);
        let sum_sq: f64 = img
            .pixels()
            .map(|p| {
                let d = p.luma() - mean;
                d * d
            })
            .sum();

        Ok(Self {
            mean,
            variance: sum_sq / (n - 1.0),
        })
    }

    /// Sample standard deviation.
    #[must_use]
    pub fn stdev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Mean luminance over all pixels.
///
/// Returns 0.0 for an empty image.
#[must_use]
pub fn mean<P: Luma>(img: ImgRef<'_, P>) -> f64 {
    let n = img.width() * img.height();
    if n == 0 {
        return 0.0;
    }
    img.pixels().map(Luma::luma).sum::<f64>() / n as f64
}

/// Sample covariance of luminance between two equally sized images.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if width or height differ, and
/// [`Error::TooFewPixels`] if the images have fewer than two pixels.
pub fn covariance<A: Luma, B: Luma>(a: ImgRef<'_, A>, b: ImgRef<'_, B>) -> Result<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(Error::DimensionMismatch {
            expected: (a.width(), a.height()),
            actual: (b.width(), b.height()),
        });
    }
    let n = sample_count(a.width(), a.height())?;

    let mean_a = mean(a);
    let mean_b = mean(b);
    let sum: f64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| (pa.luma() - mean_a) * (pb.luma() - mean_b))
        .sum();

    Ok(sum / (n - 1.0))
}

fn sample_count(width: usize, height: usize) -> Result<f64> {
    let pixels = width * height;
    if pixels < 2 {
        return Err(Error::TooFewPixels { pixels });
    }
    Ok(pixels as f64)
}
