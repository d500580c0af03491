//! # jpeg-recompress
//!
//! Find the smallest JPEG quality whose output still looks like the source.
//!
//! The library searches a quality bracket, scoring each candidate encoding
//! with a global SSIM index against the source, and decides whether to emit
//! the best candidate, a fallback, a verbatim copy of the source, or nothing.
//! Codecs and metrics plug in through traits, so the search can be driven by
//! any encoder.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jpeg_recompress::{JpegCodec, RecompressSession, SearchConfig, SourceImage};
//!
//! let config = SearchConfig::builder()
//!     .min_quality(40)
//!     .max_quality(95)
//!     .target(0.9999)
//!     .build()?;
//!
//! let session = RecompressSession::with_ssim(config, JpegCodec::new())?;
//! let source = SourceImage::load("photo.jpg".as_ref())?;
//! let result = session.run(&source)?;
//! result.write_to("photo.small.jpg".as_ref())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`pixel`]: Pixel layouts and the luma sampler
//! - [`metrics`]: Sample statistics and the global SSIM index
//! - [`codec`]: Codec trait, callback codecs and the JPEG codec
//! - [`source`]: Source image loading
//! - [`search`]: Quality search and outcome selection
//! - [`eval`]: Candidate evaluation, sessions and reports

pub mod codec;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod pixel;
pub mod search;
pub mod source;

// Re-export commonly used types
#[cfg(feature = "jpeg")]
pub use codec::JpegCodec;
pub use codec::{CallbackCodec, Codec};
pub use error::{Error, Result};
pub use eval::{
    Candidate, CandidateEvaluator, Evaluate, Output, RecompressReport, RecompressSession,
    Recompression,
};
pub use metrics::{GlobalSsim, Similarity, SimilarityConfig, SimilarityMetric};
pub use pixel::ImageData;
pub use search::{
    Decision, OutcomeSelector, QualitySearch, SearchConfig, SearchOutcome, Termination,
};
pub use source::SourceImage;
