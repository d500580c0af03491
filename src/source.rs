//! The source image: decoded pixels plus what the outcome depends on.

use std::path::{Path, PathBuf};

use crate::pixel::ImageData;

/// A decoded source image with its on-disk size and format.
#[derive(Clone)]
pub struct SourceImage {
    /// Where the image was read from.
    pub path: PathBuf,
    /// Decoded pixels (color preserved).
    pub image: ImageData,
    /// Size of the source file in bytes.
    pub file_size: u64,
    /// Whether the source file is already a JPEG.
    pub is_jpeg: bool,
}

impl SourceImage {
    /// Assemble a source from already decoded parts.
    #[must_use]
    pub fn from_parts(
        path: impl Into<PathBuf>,
        image: ImageData,
        file_size: u64,
        is_jpeg: bool,
    ) -> Self {
        Self {
            path: path.into(),
            image,
            file_size,
            is_jpeg,
        }
    }

    /// File name for display, falling back to the full path.
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Load and decode an image file, detecting its format from content.
    #[cfg(feature = "jpeg")]
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        use crate::error::Error;
        use image::{DynamicImage, ImageFormat, ImageReader};
        use imgref::ImgVec;
        use rgb::{RGB8, RGBA8};

        let load_error = |reason: String| Error::ImageLoad {
            path: path.to_path_buf(),
            reason,
        };

        let file_size = std::fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?
            .with_guessed_format()
            .map_err(|e| load_error(e.to_string()))?;
        let is_jpeg = reader.format() == Some(ImageFormat::Jpeg);
        let decoded = reader.decode().map_err(|e| load_error(e.to_string()))?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        let color = decoded.color();

        let image = if color.has_alpha() {
            let raw = decoded.into_rgba8().into_raw();
            let pixels = raw
                .chunks_exact(4)
                .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
                .collect();
            ImageData::Rgba8(ImgVec::new(pixels, width, height))
        } else if !color.has_color() {
            let gray = match decoded {
                DynamicImage::ImageLuma8(g) => g.into_raw(),
                other => other.into_luma8().into_raw(),
            };
            ImageData::Gray8(ImgVec::new(gray, width, height))
        } else {
            let raw = decoded.into_rgb8().into_raw();
            let pixels = raw
                .chunks_exact(3)
                .map(|c| RGB8::new(c[0], c[1], c[2]))
                .collect();
            ImageData::Rgb8(ImgVec::new(pixels, width, height))
        };

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            file_size,
            is_jpeg,
            "loaded source image"
        );

        Ok(Self {
            path: path.to_path_buf(),
            image,
            file_size,
            is_jpeg,
        })
    }
}
