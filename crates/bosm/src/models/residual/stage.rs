//! # Projected Bottleneck Stage
//!
//! A stage is a 1x1 channel projection followed by a run of
//! [`BottleneckBlock`]s at the projected width. The projection is the
//! only place the channel count changes; every block preserves both
//! channels and resolution, so a stage never downsamples.
//!
//! [`ProjectedStageMeta`] defines a common meta API for
//! [`ProjectedStage`] and [`ProjectedStageConfig`].

use crate::layers::activation::ActivationConfig;
use crate::models::residual::bottleneck::{BottleneckBlock, BottleneckBlockConfig};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`ProjectedStage`] Meta trait.
pub trait ProjectedStageMeta {
    /// The input channel width.
    fn in_planes(&self) -> usize;

    /// The projected channel width.
    fn planes(&self) -> usize;

    /// The number of bottleneck blocks.
    fn depth(&self) -> usize;
}

/// [`ProjectedStage`] Configuration.
///
/// Implements [`ProjectedStageMeta`].
#[derive(Config, Debug)]
pub struct ProjectedStageConfig {
    /// The input channel width.
    pub in_planes: usize,

    /// The projected channel width.
    pub planes: usize,

    /// The pinched channel width of the blocks.
    pub pinch_planes: usize,

    /// The number of bottleneck blocks.
    pub depth: usize,

    /// The activation used by the blocks.
    #[config(default = "ActivationConfig::Relu")]
    pub activation: ActivationConfig,
}

impl ProjectedStageMeta for ProjectedStageConfig {
    fn in_planes(&self) -> usize {
        self.in_planes
    }

    fn planes(&self) -> usize {
        self.planes
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

impl ProjectedStageConfig {
    /// Check the legality of the config.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.depth == 0 {
            return Err(format!("depth is zero:\n{self:#?}"));
        }
        if self.in_planes == 0 || self.planes == 0 || self.pinch_planes == 0 {
            return Err(format!("zero channel width:\n{self:#?}"));
        }
        Ok(())
    }

    /// Panic if the config is invalid.
    pub fn expect_valid(&self) {
        if let Err(err) = self.try_validate() {
            panic!("{}", err);
        }
    }

    /// Initialize a [`ProjectedStage`].
    ///
    /// # Panics
    ///
    /// If the config is invalid.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ProjectedStage<B> {
        self.expect_valid();

        ProjectedStage {
            projection: Conv2dConfig::new([self.in_planes, self.planes], [1, 1]).init(device),
            blocks: (0..self.depth)
                .map(|_| {
                    BottleneckBlockConfig::new(self.planes, self.pinch_planes)
                        .with_activation(self.activation.clone())
                        .init(device)
                })
                .collect(),
        }
    }
}

/// Projected bottleneck stage.
///
/// Implements [`ProjectedStageMeta`].
#[derive(Module, Debug)]
pub struct ProjectedStage<B: Backend> {
    /// The 1x1 channel projection.
    pub projection: Conv2d<B>,

    /// The bottleneck blocks at the projected width.
    pub blocks: Vec<BottleneckBlock<B>>,
}

impl<B: Backend> ProjectedStageMeta for ProjectedStage<B> {
    fn in_planes(&self) -> usize {
        self.projection.weight.shape().dims[1]
    }

    fn planes(&self) -> usize {
        self.projection.weight.shape().dims[0]
    }

    fn depth(&self) -> usize {
        self.blocks.len()
    }
}

impl<B: Backend> ProjectedStage<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, in_planes, height, width]`` feature tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, planes, height, width]`` feature tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, height, width] = unpack_shape_contract!(
            ["batch", "in_planes", "height", "width"],
            &input,
            &["batch", "height", "width"],
            &[("in_planes", self.in_planes())],
        );

        let x = self.projection.forward(input);

        let x = self
            .blocks
            .iter()
            .fold(x, |x, block| block.forward(x));

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

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;

    #[test]
    fn test_stage_config() {
        let config = ProjectedStageConfig::new(64, 256, 64, 3);
        assert_eq!(config.in_planes(), 64);
        assert_eq!(config.planes(), 256);
        assert_eq!(config.depth(), 3);
        assert!(config.try_validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "depth is zero")]
    fn test_zero_depth_panics() {
        let device = Default::default();
        let _: ProjectedStage<NdArray> = ProjectedStageConfig::new(64, 256, 64, 0).init(&device);
    }

    #[test]
    #[should_panic(expected = "zero channel width")]
    fn test_zero_width_panics() {
        let device = Default::default();
        let _: ProjectedStage<NdArray> = ProjectedStageConfig::new(64, 0, 64, 3).init(&device);
    }

    #[test]
    fn test_stage_forward() {
        type B = NdArray;
        let device = Default::default();

        let stage: ProjectedStage<B> = ProjectedStageConfig::new(4, 16, 4, 2).init(&device);
        assert_eq!(stage.in_planes(), 4);
        assert_eq!(stage.planes(), 16);
        assert_eq!(stage.depth(), 2);

        let input = Tensor::ones([2, 4, 5, 5], &device);
        let output = stage.forward(input.clone());

        // Channels are projected; the resolution is untouched.
        assert_shape_contract!(
            ["batch", "planes", "height", "width"],
            &output,
            &[("batch", 2), ("planes", 16), ("height", 5), ("width", 5)],
        );

        // The fold over blocks matches a manual loop.
        let mut x = stage.projection.forward(input);
        for block in &stage.blocks {
            x = block.forward(x);
        }
        output.to_data().assert_eq(&x.to_data(), true);
    }
}
