use crate::loss::action_conditioned_loss;
use burn::{
  module::{AutodiffModule, Module},
  nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    conv::{Conv2d, Conv2dConfig},
  },
  optim::{GradientsParams, Optimizer},
  record::{DefaultRecorder, RecorderError},
  tensor::{
    DataError, Distribution, Int, Tensor, TensorData,
    backend::{AutodiffBackend, Backend},
  },
};
use derive_more::From;
use ndarray::{Array, Array1, Array2, Array3, Dimension, ShapeError};
use num_traits::Float;
use q2048_game::{action::ACTIONS, board::SIZE};
use q2048_value::model::{Model, TrainableModel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Hyperparameters of the network and its training.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueNetworkConfig {
  pub filters: usize,
  pub residual_blocks: usize,
  /// Widths of the fully connected layers before the output.
  pub fc_layers: Vec<usize>,
  pub dropout_rate: f64,
  pub batch_norm: bool,
  pub learning_rate: f64,
}

impl Default for ValueNetworkConfig {
  fn default() -> Self {
    Self {
      filters: 32,
      residual_blocks: 4,
      fc_layers: vec![256],
      dropout_rate: 0.2,
      batch_norm: true,
      learning_rate: 0.001,
    }
  }
}

impl ValueNetworkConfig {
  pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
    ValueNetwork::new(self, device)
  }
}

/// What the network is evaluated for. Dropout is active and batch
/// normalization uses batch statistics only in `Train`, whatever the backend.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
  Train,
  Eval,
  Predict,
}

/// 3x3 convolution with optional batch normalization.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
  conv: Conv2d<B>,
  bn: Option<BatchNorm<B>>,
}

impl<B: Backend> ConvBlock<B> {
  pub fn new(input: usize, output: usize, batch_norm: bool, device: &B::Device) -> Self {
    Self {
      conv: Conv2dConfig::new([input, output], [3, 3])
        .with_padding(PaddingConfig2d::Same)
        .init(device),
      bn: batch_norm.then(|| BatchNormConfig::new(output).init(device)),
    }
  }

  pub fn forward(&self, inputs: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
    let x = self.conv.forward(inputs);
    match &self.bn {
      Some(bn) => normalize(bn, x, mode),
      None => x,
    }
  }
}

/// Batch normalization over channels. `Train` normalizes with the statistics
/// of the batch and updates the running ones, other modes use the running
/// statistics.
fn normalize<B: Backend>(bn: &BatchNorm<B>, x: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
  let [_, channels, _, _] = x.dims();
  let (mean, var) = match mode {
    Mode::Train => {
      let mean = x.clone().mean_dim(0).mean_dim(2).mean_dim(3);
      let var = (x.clone() - mean.clone())
        .powf_scalar(2.0)
        .mean_dim(0)
        .mean_dim(2)
        .mean_dim(3);

      let momentum = bn.momentum;
      bn.running_mean.update(
        bn.running_mean
          .value()
          .mul_scalar(1.0 - momentum)
          .add(mean.clone().detach().reshape([channels]).mul_scalar(momentum)),
      );
      bn.running_var.update(
        bn.running_var
          .value()
          .mul_scalar(1.0 - momentum)
          .add(var.clone().detach().reshape([channels]).mul_scalar(momentum)),
      );

      (mean, var)
    }
    Mode::Eval | Mode::Predict => (
      bn.running_mean.value().reshape([1, channels, 1, 1]),
      bn.running_var.value().reshape([1, channels, 1, 1]),
    ),
  };
  let gamma = bn.gamma.val().reshape([1, channels, 1, 1]);
  let beta = bn.beta.val().reshape([1, channels, 1, 1]);
  (x - mean) / var.add_scalar(bn.epsilon).sqrt() * gamma + beta
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
  first: ConvBlock<B>,
  second: ConvBlock<B>,
  activation: Relu,
}

impl<B: Backend> ResidualBlock<B> {
  pub fn forward(&self, inputs: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
    let x = self.first.forward(inputs.clone(), mode);
    let x = self.activation.forward(x);
    let x = self.second.forward(x, mode);
    self.activation.forward(inputs + x)
  }

  pub fn new(filters: usize, batch_norm: bool, device: &B::Device) -> Self {
    Self {
      first: ConvBlock::new(filters, filters, batch_norm, device),
      second: ConvBlock::new(filters, filters, batch_norm, device),
      activation: Relu::new(),
    }
  }
}

#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
  linear: Linear<B>,
  dropout: Dropout,
  activation: Relu,
}

impl<B: Backend> DenseBlock<B> {
  pub fn forward(&self, inputs: Tensor<B, 2>, mode: Mode) -> Tensor<B, 2> {
    let x = self.linear.forward(inputs);
    let x = self.activation.forward(x);
    match mode {
      Mode::Train if self.dropout.prob > 0.0 => {
        let keep = 1.0 - self.dropout.prob;
        let mask = Tensor::random(x.shape(), Distribution::Bernoulli(keep), &x.device());
        (x * mask).div_scalar(keep)
      }
      Mode::Train | Mode::Eval | Mode::Predict => x,
    }
  }

  pub fn new(input: usize, output: usize, dropout_rate: f64, device: &B::Device) -> Self {
    Self {
      linear: LinearConfig::new(input, output).init(device),
      dropout: DropoutConfig::new(dropout_rate.clamp(0.0, 0.99)).init(),
      activation: Relu::new(),
    }
  }
}

/// Residual convolutional network mapping a board to the values of the four
/// actions.
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
  stem: ConvBlock<B>,
  residuals: Vec<ResidualBlock<B>>,
  dense: Vec<DenseBlock<B>>,
  output: Linear<B>,
  activation: Relu,
}

impl<B: Backend> ValueNetwork<B> {
  pub fn new(config: &ValueNetworkConfig, device: &B::Device) -> Self {
    let mut width = SIZE * SIZE * config.filters;
    let mut dense = Vec::with_capacity(config.fc_layers.len());
    for &units in &config.fc_layers {
      dense.push(DenseBlock::new(width, units, config.dropout_rate, device));
      width = units;
    }
    Self {
      stem: ConvBlock::new(1, config.filters, config.batch_norm, device),
      residuals: (0..config.residual_blocks)
        .map(|_| ResidualBlock::new(config.filters, config.batch_norm, device))
        .collect(),
      dense,
      output: LinearConfig::new(width, ACTIONS).init(device),
      activation: Relu::new(),
    }
  }

  /// Raw action values, `batch × 4`, for boards `batch × 4 × 4`.
  pub fn forward(&self, boards: Tensor<B, 3>, mode: Mode) -> Tensor<B, 2> {
    let [batch, height, width] = boards.dims();

    let x = boards.reshape([batch, 1, height, width]);
    let x = self.stem.forward(x, mode);
    let mut x = self.activation.forward(x);
    for residual in &self.residuals {
      x = residual.forward(x, mode);
    }

    let [_, channels, _, _] = x.dims();
    let mut x = x.reshape([batch, channels * height * width]);
    for dense in &self.dense {
      x = dense.forward(x, mode);
    }

    self.output.forward(x)
  }
}

pub struct Predictor<B: Backend> {
  pub model: ValueNetwork<B>,
  pub device: B::Device,
}

pub struct Learner<B: AutodiffBackend, O> {
  pub predictor: Predictor<B>,
  pub optimizer: O,
  pub learning_rate: f64,
}

#[derive(Error, Debug, From)]
pub enum ModelError {
  #[error("shape error")]
  ShapeError(ShapeError),
  #[error("data error")]
  DataError(DataError),
  #[error("recorder error: {0}")]
  RecorderError(RecorderError),
  #[error("invalid action index: {0}")]
  #[from(skip)]
  InvalidAction(usize),
}

fn into_data_vec<A: Clone, D: Dimension>(array: Array<A, D>) -> Vec<A> {
  let (mut vec, offset) = if array.is_standard_layout() {
    array.into_raw_vec_and_offset()
  } else {
    array.as_standard_layout().to_owned().into_raw_vec_and_offset()
  };
  if let Some(offset) = offset {
    vec.drain(0..offset);
  }
  vec
}

impl<B: Backend> Predictor<B> {
  pub fn new(config: &ValueNetworkConfig, device: B::Device) -> Self {
    Self {
      model: config.init(&device),
      device,
    }
  }

  pub fn load<P: Into<PathBuf>>(config: &ValueNetworkConfig, path: P, device: B::Device) -> Result<Self, ModelError> {
    let model = config
      .init(&device)
      .load_file(path, &DefaultRecorder::new(), &device)?;
    Ok(Self { model, device })
  }

  pub fn save<P: Into<PathBuf>>(&self, path: P) -> Result<(), ModelError> {
    self.model.clone().save_file(path, &DefaultRecorder::new())?;
    Ok(())
  }

  fn boards_tensor(&self, boards: Array3<B::FloatElem>) -> Tensor<B, 3> {
    let (batch, height, width) = boards.dim();
    Tensor::from_data(
      TensorData::new(into_data_vec(boards), [batch, height, width]),
      &self.device,
    )
  }

  fn actions_tensor(&self, actions: Array1<usize>) -> Result<Tensor<B, 1, Int>, ModelError> {
    let batch = actions.len();
    let indices = actions
      .iter()
      .map(|&action| {
        if action < ACTIONS {
          Ok(action as i64)
        } else {
          Err(ModelError::InvalidAction(action))
        }
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Tensor::from_data(TensorData::new(indices, [batch]), &self.device))
  }

  fn rewards_tensor(&self, rewards: Array1<B::FloatElem>) -> Tensor<B, 1> {
    let batch = rewards.len();
    Tensor::from_data(TensorData::new(into_data_vec(rewards), [batch]), &self.device)
  }

  /// Loss of a batch in evaluation mode.
  pub fn loss(
    &self,
    boards: Array3<B::FloatElem>,
    actions: Array1<usize>,
    rewards: Array1<B::FloatElem>,
  ) -> Result<B::FloatElem, ModelError> {
    let actions = self.actions_tensor(actions)?;
    let predictions = self.model.forward(self.boards_tensor(boards), Mode::Eval);
    let loss = action_conditioned_loss(predictions, actions, self.rewards_tensor(rewards));
    Ok(loss.into_scalar())
  }
}

impl<B> Model<<B as Backend>::FloatElem> for Predictor<B>
where
  B: Backend,
  <B as Backend>::FloatElem: Float,
{
  type E = ModelError;

  fn predict(
    &mut self,
    boards: Array3<<B as Backend>::FloatElem>,
  ) -> Result<Array2<<B as Backend>::FloatElem>, Self::E> {
    let batch = boards.dim().0;
    let predictions = self.model.forward(self.boards_tensor(boards), Mode::Predict);
    let predictions = Array2::from_shape_vec((batch, ACTIONS), predictions.into_data().into_vec()?)?;
    Ok(predictions)
  }
}

impl<B: AutodiffBackend, O> Learner<B, O> {
  /// Copy of the network without autodiff, used for inference.
  pub fn valid(&self) -> Predictor<B::InnerBackend> {
    Predictor {
      model: self.predictor.model.valid(),
      device: self.predictor.device.clone(),
    }
  }
}

impl<B, O> Model<<B as Backend>::FloatElem> for Learner<B, O>
where
  B: Backend + AutodiffBackend,
  <B as Backend>::FloatElem: Float,
{
  type E = ModelError;

  fn predict(
    &mut self,
    boards: Array3<<B as Backend>::FloatElem>,
  ) -> Result<Array2<<B as Backend>::FloatElem>, Self::E> {
    self.valid().predict(boards)
  }
}

impl<B, O> TrainableModel<<B as Backend>::FloatElem> for Learner<B, O>
where
  B: Backend + AutodiffBackend,
  <B as Backend>::FloatElem: Float,
  O: Optimizer<ValueNetwork<B>, B>,
{
  type TE = ModelError;

  fn train(
    mut self,
    boards: Array3<<B as Backend>::FloatElem>,
    actions: Array1<usize>,
    rewards: Array1<<B as Backend>::FloatElem>,
  ) -> Result<(Self, <B as Backend>::FloatElem), Self::TE> {
    let actions = self.predictor.actions_tensor(actions)?;
    let boards = self.predictor.boards_tensor(boards);
    let rewards = self.predictor.rewards_tensor(rewards);

    let predictions = self.predictor.model.forward(boards, Mode::Train);
    let loss = action_conditioned_loss(predictions, actions, rewards);
    let value = loss.clone().into_scalar();

    log::debug!("Loss: {}", value);

    let grads = GradientsParams::from_grads(loss.backward(), &self.predictor.model);
    self.predictor.model = self.optimizer.step(self.learning_rate, self.predictor.model, grads);

    Ok((self, value))
  }

  fn evaluate(
    &mut self,
    boards: Array3<<B as Backend>::FloatElem>,
    actions: Array1<usize>,
    rewards: Array1<<B as Backend>::FloatElem>,
  ) -> Result<<B as Backend>::FloatElem, Self::TE> {
    self.valid().loss(boards, actions, rewards)
  }
}
