// ============================================================
// Layer 5: Burn Learner
// ============================================================
// The SequenceLearner implementation backed by Burn.
// One call to fit_epoch is one pass over the shuffled dataset:
//
//   for each batch
//       forward pass + categorical cross-entropy
//       backward pass
//       optimiser step
//
// and the returned loss is the mean of the batch losses.
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{bail, Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    record::Recorder,
    tensor::backend::AutodiffBackend,
};
use std::{path::Path, sync::Arc};

use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::EncodedDataset,
};
use crate::domain::traits::SequenceLearner;
use crate::ml::model::{recorder, MusicLstm};

pub struct BurnLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MusicLstm<B>, B>,
{
    model:  MusicLstm<B>,
    optim:  O,
    loader: Arc<dyn DataLoader<SequenceBatch<B>>>,
    lr:     f64,
}

impl<B, O> BurnLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MusicLstm<B>, B>,
{
    pub fn new(
        model:      MusicLstm<B>,
        optim:      O,
        dataset:    EncodedDataset,
        batch_size: usize,
        lr:         f64,
        seed:       u64,
        device:     B::Device,
    ) -> Self {
        let loader = DataLoaderBuilder::new(SequenceBatcher::<B>::new(device))
            .batch_size(batch_size)
            .shuffle(seed)
            .num_workers(1)
            .build(dataset);

        Self { model, optim, loader, lr }
    }
}

impl<B, O> SequenceLearner for BurnLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MusicLstm<B>, B>,
{
    fn fit_epoch(&mut self, epoch: usize) -> Result<f64> {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in self.loader.iter() {
            let loss = self.model.forward_loss(batch.inputs, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;

            // Backward pass + optimiser update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optim.step(self.lr, self.model.clone(), grads);
        }

        if batches == 0 {
            bail!("epoch {epoch} produced no batches");
        }

        tracing::debug!("Epoch {} ran {} batches", epoch, batches);
        Ok(loss_sum / batches as f64)
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        self.model
            .save_weights(path)
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))
    }

    fn save_optimizer(&self, path: &Path) -> Result<()> {
        recorder()
            .record(self.optim.to_record(), path.to_path_buf())
            .with_context(|| format!("Failed to save optimizer state to '{}'", path.display()))
    }
}
