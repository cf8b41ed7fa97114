//! Line-by-line capture state machine.

use std::num::NonZeroUsize;

use super::block::TraceBlock;

/// Capture state for a single pass of one signature over the input.
///
/// A fresh state is created for every pass and dropped when the pass ends,
/// so two signatures never observe each other's buffers.
#[derive(Debug, Clone)]
pub struct ExtractionState {
    capturing: bool,
    lines_captured: usize,
    buffer: Vec<String>,
    limit: NonZeroUsize,
}

impl ExtractionState {
    /// Create an idle state that emits blocks of exactly `limit` lines.
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            capturing: false,
            lines_captured: 0,
            buffer: Vec::with_capacity(limit.get()),
            limit,
        }
    }

    /// Whether a capture is in progress.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Lines captured so far for the in-progress block.
    #[must_use]
    pub fn lines_captured(&self) -> usize {
        self.lines_captured
    }

    /// Feed one line; returns a block once `limit` lines have been captured.
    ///
    /// A signature match while already capturing does not restart the count.
    pub fn feed(&mut self, line: &str, signature: &str) -> Option<TraceBlock> {
        if line.contains(signature) {
            self.capturing = true;
        }

        if !self.capturing {
            return None;
        }

        self.buffer.push(line.to_owned());
        self.lines_captured += 1;

        if self.lines_captured < self.limit.get() {
            return None;
        }

        self.capturing = false;
        self.lines_captured = 0;
        let lines = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.limit.get()));
        Some(TraceBlock::new(lines))
    }
}

/// Lazy iterator over the trace blocks of one signature.
///
/// A capture still in progress when the input runs out is discarded.
#[derive(Debug)]
pub struct TraceBlocks<'s, I> {
    lines: I,
    signature: &'s str,
    state: ExtractionState,
}

impl<'s, I, L> Iterator for TraceBlocks<'s, I>
where
    I: Iterator<Item = L>,
    L: AsRef<str>,
{
    type Item = TraceBlock;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            if let Some(block) = self.state.feed(line.as_ref(), self.signature) {
                return Some(block);
            }
        }
        if self.state.is_capturing() {
            tracing::trace!(
                signature = self.signature,
                captured = self.state.lines_captured(),
                "Discarding partial trace at end of input"
            );
            self.state = ExtractionState::new(self.state.limit);
        }
        None
    }
}

/// A block together with the signature that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    pub signature: String,
    pub block: TraceBlock,
}

/// Extracts fixed-length trace blocks for a set of trigger signatures.
#[derive(Debug, Clone, Copy)]
pub struct TraceExtractor {
    trace_line_count: NonZeroUsize,
}

impl TraceExtractor {
    /// Create an extractor emitting blocks of `trace_line_count` lines.
    #[must_use]
    pub fn new(trace_line_count: NonZeroUsize) -> Self {
        Self { trace_line_count }
    }

    /// Number of lines in every emitted block.
    #[must_use]
    pub fn trace_line_count(&self) -> usize {
        self.trace_line_count.get()
    }

    /// Scan `lines` for one signature.
    pub fn blocks<'s, I>(&self, lines: I, signature: &'s str) -> TraceBlocks<'s, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        TraceBlocks {
            lines: lines.into_iter(),
            signature,
            state: ExtractionState::new(self.trace_line_count),
        }
    }

    /// Run one independent pass over `content` per signature, in order.
    #[must_use]
    pub fn extract_all<S: AsRef<str>>(&self, content: &str, signatures: &[S]) -> Vec<SignatureMatch> {
        signatures
            .iter()
            .flat_map(|signature| {
                let signature = signature.as_ref();
                self.blocks(content.lines(), signature)
                    .map(move |block| SignatureMatch {
                        signature: signature.to_owned(),
                        block,
                    })
            })
            .collect()
    }
}
