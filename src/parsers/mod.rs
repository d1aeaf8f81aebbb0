//! Text-in, record-out extractors. No I/O.

mod csharp;
mod guidelines;

pub use csharp::{CSharpExtractor, ExtractedComponent};
pub use guidelines::{parse_guidelines, GuidelineSection, GuidelineSet, Guidelines};
