//! PPTX (Office Open XML) slide source for deck analysis.
//!
//! Reads .pptx files, which are ZIP archives of XML parts, and turns each
//! slide into a text slide in deck order.

pub mod parser;

pub use parser::{PptxParser, PptxSource};
