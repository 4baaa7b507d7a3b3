//! # Bottleneck Residual Block
//!
//! A three-conv residual block: a 1x1 reduction into a pinched channel
//! count, a padded 3x3 transform, and a 1x1 expansion back to the
//! block width. The activated branch is added to the unmodified input;
//! no activation follows the addition.
//!
//! [`BottleneckBlockMeta`] defines a common meta API for
//! [`BottleneckBlock`] and [`BottleneckBlockConfig`].

use crate::layers::activation::{Activation, ActivationConfig};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::PaddingConfig2d;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`BottleneckBlock`] Meta trait.
pub trait BottleneckBlockMeta {
    /// The block channel width.
    fn planes(&self) -> usize;

    /// The pinched channel width of the 3x3 transform.
    fn pinch_planes(&self) -> usize;
}

/// [`BottleneckBlock`] Configuration.
///
/// Implements [`BottleneckBlockMeta`].
#[derive(Config, Debug)]
pub struct BottleneckBlockConfig {
    /// The block channel width.
    pub planes: usize,

    /// The pinched channel width of the 3x3 transform.
    pub pinch_planes: usize,

    /// The activation applied to the branch before the addition.
    #[config(default = "ActivationConfig::Relu")]
    pub activation: ActivationConfig,
}

impl BottleneckBlockMeta for BottleneckBlockConfig {
    fn planes(&self) -> usize {
        self.planes
    }

    fn pinch_planes(&self) -> usize {
        self.pinch_planes
    }
}

impl BottleneckBlockConfig {
    /// Initialize a [`BottleneckBlock`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> BottleneckBlock<B> {
        BottleneckBlock {
            reduce: Conv2dConfig::new([self.planes, self.pinch_planes], [1, 1]).init(device),
            transform: Conv2dConfig::new([self.pinch_planes, self.pinch_planes], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            expand: Conv2dConfig::new([self.pinch_planes, self.planes], [1, 1]).init(device),
            act: self.activation.init(),
        }
    }
}

/// Bottleneck residual block.
///
/// Implements [`BottleneckBlockMeta`].
#[derive(Module, Debug)]
pub struct BottleneckBlock<B: Backend> {
    /// The 1x1 channel reduction.
    pub reduce: Conv2d<B>,

    /// The padded 3x3 transform at pinched width.
    pub transform: Conv2d<B>,

    /// The 1x1 channel expansion.
    pub expand: Conv2d<B>,

    /// The branch activation.
    pub act: Activation,
}

impl<B: Backend> BottleneckBlockMeta for BottleneckBlock<B> {
    fn planes(&self) -> usize {
        // Conv weights are stored as [out, in, k_h, k_w].
        self.reduce.weight.shape().dims[1]
    }

    fn pinch_planes(&self) -> usize {
        self.reduce.weight.shape().dims[0]
    }
}

impl<B: Backend> BottleneckBlock<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, planes, height, width]`` feature tensor.
    ///
    /// # Returns
    ///
    /// A feature tensor of the same shape.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, height, width] = unpack_shape_contract!(
            ["batch", "planes", "height", "width"],
            &input,
            &["batch", "height", "width"],
            &[("planes", self.planes())],
        );

        let residual = input.clone();

        let x = self.reduce.forward(input);
        let x = self.transform.forward(x);
        let x = self.expand.forward(x);

        // The branch is activated once, before the addition; the sum
        // itself is not activated.
        let x = self.act.forward(x) + residual;

        assert_shape_contract_periodically!(
            ["batch", "planes", "height", "width"],
            &x,
            &[
                ("batch", batch),
                ("planes", self.planes()),
                ("height", height),
                ("width", width),
            ],
        );

        x
    }
}
