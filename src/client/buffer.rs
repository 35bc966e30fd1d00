//! Ordered accumulation of decoded audio fragments.

/// Accumulates ordered fragments of decoded samples and merges them into one
/// contiguous buffer on demand.
///
/// Fragment order always equals arrival order; nothing is ever reordered.
/// Any reordering of audio fragments produces audible corruption, so the
/// merge is the correctness-critical operation here.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    fragments: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one decoded fragment. Amortized O(1).
    pub fn append(&mut self, fragment: Vec<f32>) {
        self.fragments.push(fragment);
    }

    /// Concatenate all fragments in arrival order and clear the buffer.
    pub fn merge_and_clear(&mut self) -> Vec<f32> {
        let total: usize = self.fragments.iter().map(Vec::len).sum();
        let mut merged = Vec::with_capacity(total);
        for fragment in self.fragments.drain(..) {
            merged.extend(fragment);
        }
        merged
    }

    /// True when no fragments are buffered.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total number of buffered samples across all fragments.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Vec::len).sum()
    }
}
