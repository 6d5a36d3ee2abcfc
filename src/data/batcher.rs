// ============================================================
// Layer 4: Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to stack encoded windows into
// tensors.
//
//   Input:  Vec of N EncodedWindows (history W, target V)
//   Output: SequenceBatch
//             inputs  [N, W, 1]  one feature per time step
//             targets [N, V]     one-hot rows
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::EncodedWindow;

#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Normalised histories, shape [batch, window, 1]
    pub inputs: Tensor<B, 3>,

    /// One-hot targets, shape [batch, vocab_size]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<EncodedWindow, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<EncodedWindow>) -> SequenceBatch<B> {
        let batch_size = items.len();
        let window_len = items.first().map_or(0, |w| w.history.len());
        let vocab_size = items.first().map_or(0, |w| w.target.len());

        let history_flat: Vec<f32> = items
            .iter()
            .flat_map(|w| w.history.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|w| w.target.iter().copied())
            .collect();

        let inputs = Tensor::<B, 3>::from_data(
            TensorData::new(history_flat, [batch_size, window_len, 1]),
            &self.device,
        );

        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(target_flat, [batch_size, vocab_size]),
            &self.device,
        );

        SequenceBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let items = vec![
            EncodedWindow { history: vec![0.0, 0.25, 0.5], target: vec![0.0, 1.0, 0.0, 0.0] },
            EncodedWindow { history: vec![0.25, 0.5, 0.75], target: vec![1.0, 0.0, 0.0, 0.0] },
        ];
        let batch: SequenceBatch<TestBackend> =
            SequenceBatcher::new(Default::default()).batch(items);

        assert_eq!(batch.inputs.dims(), [2, 3, 1]);
        assert_eq!(batch.targets.dims(), [2, 4]);

        let second_row: Vec<f32> = batch
            .inputs
            .slice([1..2, 0..3, 0..1])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(second_row, vec![0.25, 0.5, 0.75]);
    }
}
