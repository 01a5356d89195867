use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;

use crate::ai::estimator::ValueEstimator;
use crate::ai::state_encoding::{encode_boards, FEATURES};
use crate::error::EstimatorError;
use crate::game::{Board, COLS};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

/// Q-value network for Connect Four.
///
/// ```text
/// Input:  [batch, 42]  canonical board, +1 = side to move
/// FC1:    42 -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// Out:    hidden -> 7  (Q-values, one per column)
/// ```
#[derive(Module, Debug)]
pub struct DqnNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct DqnNetworkConfig {
    #[config(default = 128)]
    pub hidden_size: usize,
}

impl DqnNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DqnNetwork<B> {
        DqnNetwork {
            fc1: LinearConfig::new(FEATURES, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            out: LinearConfig::new(self.hidden_size, COLS).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> DqnNetwork<B> {
    /// Forward pass: `[batch, 42]` -> `[batch, 7]` Q-values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.out.forward(x)
    }
}

/// [`DqnNetwork`] trained with Adam on mean-squared error, on the CPU backend.
pub struct NetworkEstimator {
    network: DqnNetwork<TrainBackend>,
    optimizer: OptimizerAdaptor<Adam, DqnNetwork<TrainBackend>, TrainBackend>,
    config: DqnNetworkConfig,
    learning_rate: f64,
    device: <TrainBackend as Backend>::Device,
}

impl NetworkEstimator {
    pub fn new(config: DqnNetworkConfig, learning_rate: f64) -> Self {
        let device = Default::default();
        NetworkEstimator {
            network: config.init(&device),
            optimizer: AdamConfig::new().init(),
            config,
            learning_rate,
            device,
        }
    }

    fn tensor_error(err: impl std::fmt::Debug) -> EstimatorError {
        EstimatorError::Tensor(format!("{err:?}"))
    }
}

impl ValueEstimator<Board> for NetworkEstimator {
    type Parameters = DqnNetwork<TrainBackend>;

    fn action_count(&self) -> usize {
        COLS
    }

    fn predict(&self, states: &[Board]) -> Result<Vec<Vec<f32>>, EstimatorError> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let input = encode_boards::<InferBackend>(states, &self.device);
        let q_values: Vec<f32> = self
            .network
            .valid()
            .forward(input)
            .into_data()
            .to_vec()
            .map_err(Self::tensor_error)?;
        Ok(q_values.chunks(COLS).map(<[f32]>::to_vec).collect())
    }

    fn fit(&mut self, states: &[Board], targets: &[Vec<f32>]) -> Result<f32, EstimatorError> {
        if states.len() != targets.len() {
            return Err(EstimatorError::BatchMismatch {
                states: states.len(),
                targets: targets.len(),
            });
        }
        if let Some(row) = targets.iter().find(|row| row.len() != COLS) {
            return Err(EstimatorError::Shape {
                expected: COLS,
                actual: row.len(),
            });
        }
        if states.is_empty() {
            return Ok(0.0);
        }

        let input = encode_boards::<TrainBackend>(states, &self.device);
        let q_all = self.network.forward(input);

        let flat: Vec<f32> = targets.iter().flatten().copied().collect();
        let target = Tensor::<TrainBackend, 2>::from_data(
            TensorData::new(flat, [states.len(), COLS]),
            &self.device,
        );

        let diff = q_all - target;
        let loss = (diff.clone() * diff).mean();
        let loss_val = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .map_err(Self::tensor_error)?
            .first()
            .copied()
            .unwrap_or_default();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.learning_rate, self.network.clone(), grads);

        Ok(loss_val)
    }

    fn parameters(&self) -> Self::Parameters {
        self.network.clone()
    }

    fn set_parameters(&mut self, parameters: Self::Parameters) {
        self.network = parameters;
    }

    /// Writes through burn's default recorder, which appends its own extension.
    fn save_file(&self, path: &Path) -> Result<(), EstimatorError> {
        self.network
            .valid()
            .save_file(path.to_path_buf(), &DefaultRecorder::default())
            .map_err(|e| EstimatorError::Record {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn load_file(&mut self, path: &Path) -> Result<(), EstimatorError> {
        let network: DqnNetwork<TrainBackend> = self
            .config
            .init(&self.device)
            .load_file(path.to_path_buf(), &DefaultRecorder::default(), &self.device)
            .map_err(|e| EstimatorError::Record {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        self.network = network;
        self.optimizer = AdamConfig::new().init();
        Ok(())
    }
}
