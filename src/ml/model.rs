use anyhow::{bail, Context, Result};
use burn::{
    nn::{
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings, Recorder, RecorderError},
    tensor::activation::log_softmax,
};
use std::path::Path;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
// This struct is the topology stored in every checkpoint's metadata.
#[derive(Config, Debug)]
pub struct MusicLstmConfig {
    /// Width of the output layer, one class per token
    pub vocab_size:  usize,
    #[config(default = 1536)]
    pub hidden_size: usize,
    #[config(default = 3)]
    pub num_layers:  usize,
    #[config(default = 0.3)]
    pub dropout:     f64,
}

impl MusicLstmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MusicLstm<B> {
        let layers = (0..self.num_layers.max(1))
            .map(|i| {
                let d_input = if i == 0 { 1 } else { self.hidden_size };
                LstmConfig::new(d_input, self.hidden_size, true).init(device)
            })
            .collect();
        MusicLstm {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            norm:    LayerNormConfig::new(self.hidden_size).init(device),
            output:  LinearConfig::new(self.hidden_size, self.vocab_size).init(device),
        }
    }

    /// Rebuild this topology and load weights written by `MusicLstm::save_weights`.
    /// Fails when the stored parameters do not have this topology's shapes.
    pub fn load<B: Backend>(&self, path: &Path, device: &B::Device) -> Result<MusicLstm<B>> {
        let record: MusicLstmRecord<B> = recorder()
            .load(path.to_path_buf(), device)
            .with_context(|| format!("Cannot read weights '{}'", path.display()))?;

        // Vec<Lstm> loading zips with the record, so a count mismatch would truncate
        let expected_layers = self.num_layers.max(1);
        if record.layers.len() != expected_layers {
            bail!(
                "weights hold {} LSTM layers, topology expects {}",
                record.layers.len(),
                expected_layers
            );
        }

        let model = self.init(device).load_record(record);
        self.check_shapes(&model)?;
        Ok(model)
    }

    /// Compare every parameter's shape with what this topology builds.
    fn check_shapes<B: Backend>(&self, model: &MusicLstm<B>) -> Result<()> {
        let hidden = self.hidden_size;

        for (i, lstm) in model.layers.iter().enumerate() {
            let d_input = if i == 0 { 1 } else { hidden };
            let gates = [
                ("input",  &lstm.input_gate),
                ("forget", &lstm.forget_gate),
                ("output", &lstm.output_gate),
                ("cell",   &lstm.cell_gate),
            ];
            for (name, gate) in gates {
                expect_dims(
                    &format!("layer {i} {name} gate input weights"),
                    gate.input_transform.weight.dims(),
                    [d_input, hidden],
                )?;
                expect_dims(
                    &format!("layer {i} {name} gate hidden weights"),
                    gate.hidden_transform.weight.dims(),
                    [hidden, hidden],
                )?;
            }
        }

        expect_dims("layer norm", model.norm.gamma.dims(), [hidden])?;
        expect_dims("output weights", model.output.weight.dims(), [hidden, self.vocab_size])
    }
}

fn expect_dims<const D: usize>(what: &str, found: [usize; D], expected: [usize; D]) -> Result<()> {
    if found != expected {
        bail!("{what} have shape {found:?}, topology expects {expected:?}");
    }
    Ok(())
}

/// Full precision: a resumed run starts from exactly the saved parameters.
/// Also used for the optimizer state saved next to the weights.
pub fn recorder() -> BinFileRecorder<FullPrecisionSettings> {
    BinFileRecorder::<FullPrecisionSettings>::new()
}

#[derive(Module, Debug)]
pub struct MusicLstm<B: Backend> {
    pub layers:  Vec<Lstm<B>>,
    pub dropout: Dropout,
    pub norm:    LayerNorm<B>,
    pub output:  Linear<B>,
}

impl<B: Backend> MusicLstm<B> {
    /// inputs: [batch, window, 1] → logits: [batch, vocab_size]
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let last_layer = self.layers.len().saturating_sub(1);

        let mut x = inputs;
        for (i, lstm) in self.layers.iter().enumerate() {
            let (out, _state) = lstm.forward(x, None);
            x = if i < last_layer { self.dropout.forward(out) } else { out };
        }

        // Only the final time step feeds the classifier
        let [batch, seq_len, hidden] = x.dims();
        let last_step = x
            .slice([0..batch, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch, hidden]);

        self.output.forward(self.norm.forward(last_step))
    }

    /// Mean categorical cross-entropy against one-hot targets.
    pub fn forward_loss(&self, inputs: Tensor<B, 3>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        categorical_cross_entropy(self.forward(inputs), targets)
    }

    pub fn save_weights(&self, path: &Path) -> Result<(), RecorderError> {
        self.clone().save_file(path.to_path_buf(), &recorder())
    }
}

/// -mean(sum(targets * log_softmax(logits)))
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (targets * log_softmax(logits, 1))
        .sum_dim(1)
        .mean()
        .neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;

    type TestBackend = burn::backend::NdArray;

    fn tiny() -> MusicLstmConfig {
        MusicLstmConfig::new(5).with_hidden_size(8).with_num_layers(2).with_dropout(0.0)
    }

    fn inputs(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 3> {
        Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![0.0f32, 0.2, 0.4, 0.6, 0.8, 0.2], [2, 3, 1]),
            device,
        )
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: MusicLstm<TestBackend> = tiny().init(&device);
        assert_eq!(model.layers.len(), 2);
        assert_eq!(model.forward(inputs(&device)).dims(), [2, 5]);
    }

    #[test]
    fn test_cross_entropy_of_uniform_logits_is_ln_classes() {
        let device = Default::default();
        let logits  = Tensor::<TestBackend, 2>::zeros([1, 4], &device);
        let targets = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0f32, 0.0, 1.0, 0.0], [1, 4]),
            &device,
        );
        let loss: f32 = categorical_cross_entropy(logits, targets).into_scalar().elem();
        assert!((loss - 4f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_weights_survive_save_and_load() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("weights-improvement-01-1.2345-bigger.bin");
        let device = Default::default();

        let model: MusicLstm<TestBackend> = tiny().init(&device);
        let before: Vec<f32> = model.forward(inputs(&device)).into_data().to_vec().unwrap();
        model.save_weights(&path).unwrap();
        assert!(path.exists());

        let loaded: MusicLstm<TestBackend> = tiny().load(&path, &device).unwrap();
        let after: Vec<f32> = loaded.forward(inputs(&device)).into_data().to_vec().unwrap();
        assert_eq!(before, after);
    }

    fn saved_tiny(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("weights-improvement-01-1.2345-bigger.bin");
        let model: MusicLstm<TestBackend> = tiny().init(&Default::default());
        model.save_weights(&path).unwrap();
        path
    }

    #[test]
    fn test_load_rejects_other_hidden_size() {
        let dir  = tempfile::tempdir().unwrap();
        let path = saved_tiny(dir.path());

        let err = tiny()
            .with_hidden_size(16)
            .load::<TestBackend>(&path, &Default::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("topology expects"), "{err}");
    }

    #[test]
    fn test_load_rejects_other_vocab_size() {
        let dir  = tempfile::tempdir().unwrap();
        let path = saved_tiny(dir.path());

        let err = MusicLstmConfig::new(7)
            .with_hidden_size(8)
            .with_num_layers(2)
            .load::<TestBackend>(&path, &Default::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("output weights"), "{err}");
    }

    #[test]
    fn test_load_rejects_other_layer_count() {
        let dir  = tempfile::tempdir().unwrap();
        let path = saved_tiny(dir.path());

        for layers in [1, 3] {
            let err = tiny()
                .with_num_layers(layers)
                .load::<TestBackend>(&path, &Default::default())
                .err()
                .unwrap();
            assert!(err.to_string().contains("LSTM layers"), "{err}");
        }
    }
}
