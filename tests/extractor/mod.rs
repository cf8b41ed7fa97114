//! Extractor module tests.

mod properties_test;

/// Verify the public extractor types are exported from the library.
#[test]
fn test_all_extractor_types_exported() {
    use log_watcher::extractor::{
        ExtractionState, SignatureMatch, TraceBlock, TraceBlocks, TraceExtractor,
    };
    use std::num::NonZeroUsize;

    let one = NonZeroUsize::new(1).unwrap();
    let extractor = TraceExtractor::new(one);
    let _: TraceBlocks<'_, std::vec::IntoIter<String>> = extractor.blocks(Vec::new(), "x");
    let _ = ExtractionState::new(one);

    fn block_of(found: &SignatureMatch) -> &TraceBlock {
        &found.block
    }
    assert!(extractor.extract_all("", &["x"]).iter().map(block_of).next().is_none());
}
