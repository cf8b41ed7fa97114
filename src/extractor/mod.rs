//! Stack trace extraction.
//!
//! Scans log content line by line and captures a fixed-length run of lines
//! starting at every occurrence of a trigger signature.

mod block;
mod scanner;

pub use block::TraceBlock;
pub use scanner::{ExtractionState, SignatureMatch, TraceBlocks, TraceExtractor};
