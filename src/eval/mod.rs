//! Candidate evaluation, recompression sessions and reports.
//!
//! - [`evaluator::CandidateEvaluator`]: encode, decode and score one quality
//! - [`session::RecompressSession`]: search plus outcome selection for one image
//! - [`report::RecompressReport`]: what happened, as JSON or CSV

pub mod evaluator;
pub mod report;
pub mod session;

pub use evaluator::{Candidate, CandidateEvaluator, Evaluate};
pub use report::RecompressReport;
pub use session::{Output, RecompressSession, Recompression};
