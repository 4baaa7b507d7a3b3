//! # 2d Layer Stacks
//!
//! [`Layer2d`] is a polymorphic rank-4 layer wrapper: convolution,
//! max-pooling, or activation.
//!
//! [`Stage2d`] is an ordered sequence of [`Layer2d`]s, fixed at
//! construction and applied in order.
//!
//! [`Stage2dConfig`] implements [`Config`], and provides
//! [`Stage2dConfig::init`] to initialize a [`Stage2d`].

use crate::layers::activation::{Activation, ActivationConfig};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`Layer2d`] Configuration.
#[derive(Config, Debug)]
#[non_exhaustive]
pub enum Layer2dConfig {
    /// [`Conv2d`] layer.
    Conv(Conv2dConfig),

    /// [`MaxPool2d`] layer.
    MaxPool(MaxPool2dConfig),

    /// [`Activation`] layer.
    Act(ActivationConfig),
}

impl From<Conv2dConfig> for Layer2dConfig {
    fn from(config: Conv2dConfig) -> Self {
        Self::Conv(config)
    }
}

impl From<MaxPool2dConfig> for Layer2dConfig {
    fn from(config: MaxPool2dConfig) -> Self {
        Self::MaxPool(config)
    }
}

impl From<ActivationConfig> for Layer2dConfig {
    fn from(config: ActivationConfig) -> Self {
        Self::Act(config)
    }
}

impl Layer2dConfig {
    /// Initialize a [`Layer2d`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Layer2d<B> {
        match self {
            Layer2dConfig::Conv(config) => Layer2d::Conv(config.init(device)),
            Layer2dConfig::MaxPool(config) => Layer2d::MaxPool(config.init()),
            Layer2dConfig::Act(config) => Layer2d::Act(config.init()),
        }
    }
}

/// 2d Layer Wrapper.
///
/// Maps ``[batch, channels, height, width]`` to
/// ``[batch, channels', height', width']`` tensors.
#[derive(Module, Debug)]
#[non_exhaustive]
pub enum Layer2d<B: Backend> {
    /// [`Conv2d`] layer.
    Conv(Conv2d<B>),

    /// [`MaxPool2d`] layer.
    MaxPool(MaxPool2d),

    /// [`Activation`] layer.
    Act(Activation),
}

impl<B: Backend> Layer2d<B> {
    /// Forward pass.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        match self {
            Layer2d::Conv(layer) => layer.forward(input),
            Layer2d::MaxPool(layer) => layer.forward(input),
            Layer2d::Act(layer) => layer.forward(input),
        }
    }
}

/// [`Stage2d`] Meta API.
pub trait Stage2dMeta {
    /// The number of layers.
    fn len(&self) -> usize;

    /// Check if the stage is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`Stage2d`] Configuration.
#[derive(Config, Debug)]
pub struct Stage2dConfig {
    /// The component layers, applied in order.
    pub layers: Vec<Layer2dConfig>,
}

impl From<Vec<Layer2dConfig>> for Stage2dConfig {
    fn from(layers: Vec<Layer2dConfig>) -> Self {
        Self { layers }
    }
}

impl Stage2dMeta for Stage2dConfig {
    fn len(&self) -> usize {
        self.layers.len()
    }
}

impl Stage2dConfig {
    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("layers is empty".to_string());
        }
        Ok(())
    }

    /// Panic if `try_validate` returns an error.
    pub fn expect_valid(&self) {
        match self.try_validate() {
            Ok(_) => (),
            Err(err) => panic!("{}", err),
        }
    }

    /// Initialize a new [`Stage2d`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> Stage2d<B> {
        self.expect_valid();

        Stage2d {
            layers: self
                .layers
                .iter()
                .map(|layer| layer.init(device))
                .collect(),
        }
    }
}

/// An ordered sequence of [`Layer2d`]s.
///
/// The sequence is fixed at construction; the forward pass folds the
/// input through the layers in order.
#[derive(Module, Debug)]
pub struct Stage2d<B: Backend> {
    /// Internal layers.
    pub layers: Vec<Layer2d<B>>,
}

impl<B: Backend> Stage2dMeta for Stage2d<B> {
    fn len(&self) -> usize {
        self.layers.len()
    }
}

impl<B: Backend> Stage2d<B> {
    /// Apply the stage.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        self.layers.iter().fold(input, |x, layer| layer.forward(x))
    }
}
