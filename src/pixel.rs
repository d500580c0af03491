//! Pixel sampling and owned image data.
//!
//! Statistics are computed over anything implementing [`Luma`], so the
//! metric code works directly on `imgref` views of gray, RGB or RGBA pixels.

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};

/// A pixel that can be read as a luminance value in `[0, 255]`.
pub trait Luma: Copy {
    /// Luminance of this pixel.
    fn luma(self) -> f64;
}

impl Luma for u8 {
    #[inline]
    fn luma(self) -> f64 {
        f64::from(self)
    }
}

// Color pixels are sampled from the red channel. The metric only ever sees
// images that were converted to gray first, where all channels agree.
impl Luma for RGB8 {
    #[inline]
    fn luma(self) -> f64 {
        f64::from(self.r)
    }
}

impl Luma for RGBA8 {
    #[inline]
    fn luma(self) -> f64 {
        f64::from(self.r)
    }
}

/// Convert one RGB pixel to 8-bit gray with integer BT.601 weights.
#[inline]
#[must_use]
pub fn gray_value(r: u8, g: u8, b: u8) -> u8 {
    let y = 19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + (1 << 15);
    (y >> 16) as u8
}

/// Decoded image data handed between the codec and the metric.
#[derive(Clone)]
pub enum ImageData {
    /// RGB8 image.
    Rgb8(ImgVec<RGB8>),

    /// RGBA8 image. Alpha is carried but ignored by the metric.
    Rgba8(ImgVec<RGBA8>),

    /// 8-bit grayscale image.
    Gray8(ImgVec<u8>),
}

impl ImageData {
    /// Get image width.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Rgb8(img) => img.width(),
            Self::Rgba8(img) => img.width(),
            Self::Gray8(img) => img.width(),
        }
    }

    /// Get image height.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Rgb8(img) => img.height(),
            Self::Rgba8(img) => img.height(),
            Self::Gray8(img) => img.height(),
        }
    }

    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Convert to a luminance-only image of the same dimensions.
    #[must_use]
    pub fn to_gray(&self) -> ImgVec<u8> {
        let pixels: Vec<u8> = match self {
            Self::Rgb8(img) => img.pixels().map(|p| gray_value(p.r, p.g, p.b)).collect(),
            Self::Rgba8(img) => img.pixels().map(|p| gray_value(p.r, p.g, p.b)).collect(),
            Self::Gray8(img) => return img.clone(),
        };
        ImgVec::new(pixels, self.width(), self.height())
    }

    /// Convert to an RGB8 slice representation (row-major, no padding).
    #[must_use]
    pub fn to_rgb8_vec(&self) -> Vec<u8> {
        match self {
            Self::Rgb8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
            Self::Rgba8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
            Self::Gray8(img) => img.pixels().flat_map(|g| [g, g, g]).collect(),
        }
    }
}
