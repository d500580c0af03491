//! Codec collaborators: encode at a quality level, decode back to pixels.
//!
//! The search never touches codec internals. Anything implementing [`Codec`]
//! can be searched, including a pair of closures via [`CallbackCodec`].
//! With the default `jpeg` feature, [`JpegCodec`] wraps the `image` crate's
//! baseline JPEG encoder and `jpeg-decoder`.

use crate::error::Result;
use crate::pixel::ImageData;

/// A lossy codec driven by an integer quality level.
pub trait Codec {
    /// Codec identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Encode `image` at `quality` (0-100).
    fn encode(&self, image: &ImageData, quality: u8) -> Result<Vec<u8>>;

    /// Decode bytes previously produced by [`Codec::encode`].
    fn decode(&self, data: &[u8]) -> Result<ImageData>;
}

/// Encode callback type.
///
/// Takes image data and quality, returns encoded bytes.
pub type EncodeFn = Box<dyn Fn(&ImageData, u8) -> Result<Vec<u8>> + Send + Sync>;

/// Decode callback type.
///
/// Takes encoded bytes, returns decoded image data.
pub type DecodeFn = Box<dyn Fn(&[u8]) -> Result<ImageData> + Send + Sync>;

/// A codec assembled from encode/decode callbacks.
///
/// # Example
///
/// ```rust,ignore
/// use jpeg_recompress::codec::CallbackCodec;
///
/// let codec = CallbackCodec::new(
///     "my-codec",
///     Box::new(|image, quality| my_encode(image, quality)),
///     Box::new(|bytes| my_decode(bytes)),
/// );
/// ```
pub struct CallbackCodec {
    id: String,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl CallbackCodec {
    /// Create a codec from callbacks.
    #[must_use]
    pub fn new(id: &str, encode: EncodeFn, decode: DecodeFn) -> Self {
        Self {
            id: id.to_string(),
            encode,
            decode,
        }
    }
}

impl Codec for CallbackCodec {
    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self, image: &ImageData, quality: u8) -> Result<Vec<u8>> {
        (self.encode)(image, quality)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        (self.decode)(data)
    }
}

#[cfg(feature = "jpeg")]
pub use jpeg::{JpegCodec, is_jpeg, is_jpeg_bytes};

#[cfg(feature = "jpeg")]
mod jpeg {
    use std::fs::File;
    use std::io::{Cursor, Read};
    use std::path::Path;

    use image::ExtendedColorType;
    use image::codecs::jpeg::JpegEncoder;
    use imgref::ImgVec;
    use rgb::RGB8;

    use super::Codec;
    use crate::error::{Error, Result};
    use crate::pixel::ImageData;

    /// Bytes read from the head of a file when sniffing its format.
    const SNIFF_LEN: u64 = 512;

    /// Baseline JPEG via `image` (encode) and `jpeg-decoder` (decode).
    ///
    /// Quality 0 is encoded as 1, the encoder's lowest setting.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct JpegCodec;

    impl JpegCodec {
        /// Create the codec.
        #[must_use]
        pub fn new() -> Self {
            Self
        }
    }

    impl Codec for JpegCodec {
        fn id(&self) -> &str {
            "jpeg"
        }

        fn encode(&self, image: &ImageData, quality: u8) -> Result<Vec<u8>> {
            let width = image.width() as u32;
            let height = image.height() as u32;
            let (pixels, color) = match image {
                ImageData::Gray8(img) => (img.pixels().collect::<Vec<u8>>(), ExtendedColorType::L8),
                _ => (image.to_rgb8_vec(), ExtendedColorType::Rgb8),
            };

            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .encode(&pixels, width, height, color)
                .map_err(|e| Error::Encode {
                    codec: self.id().to_string(),
                    quality,
                    message: e.to_string(),
                })?;
            Ok(out)
        }

        fn decode(&self, data: &[u8]) -> Result<ImageData> {
            let codec_error = |message: String| Error::Decode {
                codec: "jpeg-decoder".to_string(),
                message,
            };

            let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(data));
            let pixels = decoder.decode().map_err(|e| codec_error(e.to_string()))?;
            let info = decoder
                .info()
                .ok_or_else(|| codec_error("Missing JPEG info after decode".to_string()))?;

            let width = usize::from(info.width);
            let height = usize::from(info.height);

            match info.pixel_format {
                jpeg_decoder::PixelFormat::RGB24 => {
                    let rgb = pixels
                        .chunks_exact(3)
                        .map(|c| RGB8::new(c[0], c[1], c[2]))
                        .collect();
                    Ok(ImageData::Rgb8(ImgVec::new(rgb, width, height)))
                }
                jpeg_decoder::PixelFormat::L8 => {
                    Ok(ImageData::Gray8(ImgVec::new(pixels, width, height)))
                }
                jpeg_decoder::PixelFormat::L16 => {
                    // Keep the high byte (big endian samples).
                    let gray = pixels.chunks_exact(2).map(|c| c[0]).collect();
                    Ok(ImageData::Gray8(ImgVec::new(gray, width, height)))
                }
                jpeg_decoder::PixelFormat::CMYK32 => Err(codec_error(
                    "CMYK JPEGs are not currently supported".to_string(),
                )),
            }
        }
    }

    /// Whether `data` starts like a JPEG file.
    #[must_use]
    pub fn is_jpeg_bytes(data: &[u8]) -> bool {
        matches!(image::guess_format(data), Ok(image::ImageFormat::Jpeg))
    }

    /// Whether the file at `path` is a JPEG, judged by content rather than
    /// extension. Unreadable files are reported as not JPEG.
    #[must_use]
    pub fn is_jpeg(path: &Path) -> bool {
        let mut head = Vec::new();
        match File::open(path) {
            Ok(file) => {
                if file.take(SNIFF_LEN).read_to_end(&mut head).is_err() {
                    return false;
                }
            }
            Err(_) => return false,
        }
        is_jpeg_bytes(&head)
    }
}
