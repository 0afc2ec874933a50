//! Features Module - Feature Extraction Engine
//!
//! Derives a numeric vector from a session's windowed events.
//! Rules only ever see the vector, never raw events.

pub mod vector;
pub mod extractor;


// Re-export common types
pub use vector::{Feature, FeatureVector, FEATURE_COUNT};
pub use extractor::FeatureExtractor;
