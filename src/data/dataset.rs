use burn::data::dataset::Dataset;

use crate::data::windower::{normalize, one_hot, Windower};

/// One encoded training pair.
/// history: W values in [0, 1); target: one-hot over the vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedWindow {
    pub history: Vec<f32>,
    pub target:  Vec<f32>,
}

/// Every window of a token stream, encoded on demand.
/// Window i depends only on i, the id stream, and W.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    ids:        Vec<usize>,
    windower:   Windower,
    vocab_size: usize,
}

impl EncodedDataset {
    pub fn new(ids: Vec<usize>, windower: Windower, vocab_size: usize) -> Self {
        Self { ids, windower, vocab_size }
    }

    pub fn window_len(&self) -> usize {
        self.windower.window_len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

impl Dataset<EncodedWindow> for EncodedDataset {
    fn get(&self, index: usize) -> Option<EncodedWindow> {
        let window = self.windower.window(&self.ids, index)?;
        Some(EncodedWindow {
            history: window
                .history
                .iter()
                .map(|&id| normalize(id, self.vocab_size))
                .collect(),
            target: one_hot(window.target, self.vocab_size),
        })
    }

    fn len(&self) -> usize {
        self.windower.window_count(self.ids.len())
    }
}
