//! # Residual Classifier Network Model
//!
//! [`ResidualClassifierNetworkMeta`] defines a common meta API for
//! [`ResidualClassifierNetwork`] and [`ResidualClassifierNetworkConfig`].
//!
//! [`ResidualClassifierNetworkConfig`] implements [`Config`], and
//! provides [`ResidualClassifierNetworkConfig::init`] to initialize a
//! [`ResidualClassifierNetwork`].
//!
//! [`ResidualClassifierNetwork`] implements [`Module`], and provides
//! [`ResidualClassifierNetwork::forward`].

use crate::inspect::{ParamEntry, collect_parameters};
use crate::layers::activation::ActivationConfig;
use crate::layers::head::{FlattenHead, FlattenHeadConfig, FlattenHeadMeta};
use crate::layers::stack::{Stage2d, Stage2dConfig};
use crate::models::residual::shape::{
    FEATURE_CHANNELS, flat_feature_size, maybe_feature_resolution,
};
use crate::models::residual::stage::{ProjectedStage, ProjectedStageConfig};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::MaxPool2dConfig;
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`ResidualClassifierNetwork`] Meta trait.
pub trait ResidualClassifierNetworkMeta {
    /// The flattened feature size feeding the classifier head.
    fn flat_features(&self) -> usize;

    /// The number of output classes.
    fn output_size(&self) -> usize;
}

/// [`ResidualClassifierNetwork`] Configuration.
///
/// Implements [`ResidualClassifierNetworkMeta`].
#[derive(Config, Debug)]
pub struct ResidualClassifierNetworkConfig {
    /// The ``[channels, height, width]`` input image shape.
    ///
    /// The stem is fixed at 3 input channels.
    pub input_shape: [usize; 3],

    /// The number of output classes.
    pub output_size: usize,
}

impl ResidualClassifierNetworkMeta for ResidualClassifierNetworkConfig {
    fn flat_features(&self) -> usize {
        let [_, height, width] = self.input_shape;
        flat_feature_size([height, width])
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

impl ResidualClassifierNetworkConfig {
    /// Check that the configured flat feature size matches the stages.
    ///
    /// The classifier head is sized by the closed-form
    /// [`flat_feature_size`] formula; the stem floors at each layer.
    /// This diagnostic reports the drift that would otherwise surface
    /// as a panic at the first forward pass.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        let [in_channels, height, width] = self.input_shape;
        if in_channels != 3 {
            return Err(format!(
                "the stem is fixed at 3 input channels, got {in_channels}\n{self:#?}"
            ));
        }
        match maybe_feature_resolution([height, width]) {
            None => Err(format!(
                "no legal feature resolution for a {height}x{width} input\n{self:#?}"
            )),
            Some([feature_height, feature_width]) => {
                let actual = feature_height * feature_width * FEATURE_CHANNELS;
                let configured = self.flat_features();
                if actual != configured {
                    Err(format!(
                        "configured flat feature size ({configured}) != stage output \
                         ({feature_height}x{feature_width}x{FEATURE_CHANNELS} = {actual})\n{self:#?}"
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Initialize a [`ResidualClassifierNetwork`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ResidualClassifierNetwork<B> {
        let [_, height, width] = self.input_shape;

        // 7x7 conv, stride 2, into 64; 3x3 max pool, stride 2.
        let stem = Stage2dConfig::from(vec![
            Conv2dConfig::new([3, 64], [7, 7]).with_stride([2, 2]).into(),
            ActivationConfig::Relu.into(),
            MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).into(),
            ActivationConfig::Relu.into(),
        ]);

        ResidualClassifierNetwork {
            stem: stem.init(device),
            stage1: ProjectedStageConfig::new(64, 256, 64, 3).init(device),
            stage2: ProjectedStageConfig::new(256, 512, 128, 8).init(device),
            stage3: ProjectedStageConfig::new(512, 1024, 256, 36).init(device),
            stage4: ProjectedStageConfig::new(1024, 2048, 512, 3).init(device),
            head: FlattenHeadConfig::new(flat_feature_size([height, width]), self.output_size)
                .init(device),
        }
    }
}

/// Bottleneck-residual image classifier.
///
/// The stem takes 3-channel images; the stages widen
/// 64 -> 256 -> 512 -> 1024 -> 2048 at depths `{3, 8, 36, 3}`, and the
/// head emits unactivated class scores.
///
/// Implements [`ResidualClassifierNetworkMeta`].
#[derive(Module, Debug)]
pub struct ResidualClassifierNetwork<B: Backend> {
    /// The strided convolution stem.
    pub stem: Stage2d<B>,

    /// The 64 -> 256 stage, 3 blocks deep.
    pub stage1: ProjectedStage<B>,

    /// The 256 -> 512 stage, 8 blocks deep.
    pub stage2: ProjectedStage<B>,

    /// The 512 -> 1024 stage, 36 blocks deep.
    pub stage3: ProjectedStage<B>,

    /// The 1024 -> 2048 stage, 3 blocks deep.
    pub stage4: ProjectedStage<B>,

    /// The flattening classifier head.
    pub head: FlattenHead<B>,
}

impl<B: Backend> ResidualClassifierNetworkMeta for ResidualClassifierNetwork<B> {
    fn flat_features(&self) -> usize {
        self.head.in_features()
    }

    fn output_size(&self) -> usize {
        self.head.out_features()
    }
}

impl<B: Backend> ResidualClassifierNetwork<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, 3, height, width]`` image tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, output_size]`` class score tensor.
    ///
    /// # Panics
    ///
    /// If the input is not 3-channel, its resolution does not fit the
    /// stem, or the feature map does not flatten to the configured
    /// feature size.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", 3)],
        );

        let x = self.stem.forward(input);
        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x);
        let x = self.stage3.forward(x);
        let x = self.stage4.forward(x);
        let x = self.head.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "output_size"],
            &x,
            &[("batch", batch), ("output_size", self.output_size())],
        );

        x
    }

    /// The total number of learnable parameter elements.
    pub fn parameter_count(&self) -> usize {
        self.num_params()
    }

    /// Collect the learnable parameters, in module traversal order.
    ///
    /// The order is deterministic and stable across calls on an
    /// unmutated module.
    pub fn parameters(&self) -> Vec<ParamEntry<B>> {
        collect_parameters(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    fn conv_params(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
    ) -> usize {
        out_channels * in_channels * kernel_size * kernel_size + out_channels
    }

    fn linear_params(
        in_features: usize,
        out_features: usize,
    ) -> usize {
        in_features * out_features + out_features
    }

    fn block_params(
        planes: usize,
        pinch_planes: usize,
    ) -> usize {
        conv_params(planes, pinch_planes, 1)
            + conv_params(pinch_planes, pinch_planes, 3)
            + conv_params(pinch_planes, planes, 1)
    }

    fn stage_params(
        in_planes: usize,
        planes: usize,
        pinch_planes: usize,
        depth: usize,
    ) -> usize {
        conv_params(in_planes, planes, 1) + depth * block_params(planes, pinch_planes)
    }

    #[test]
    fn test_network_config() {
        let config = ResidualClassifierNetworkConfig::new([3, 224, 224], 1000);
        assert_eq!(config.flat_features(), 54 * 54 * 2048);
        assert_eq!(config.output_size(), 1000);
        assert!(config.try_validate().is_ok());

        assert!(
            ResidualClassifierNetworkConfig::new([3, 20, 20], 4)
                .try_validate()
                .is_ok()
        );

        // Flooring drift off the 4-aligned grid.
        assert!(
            ResidualClassifierNetworkConfig::new([3, 30, 30], 4)
                .try_validate()
                .is_err()
        );

        // Too small for the stem kernels.
        assert!(
            ResidualClassifierNetworkConfig::new([3, 6, 6], 4)
                .try_validate()
                .is_err()
        );

        // The stem only accepts 3-channel images.
        assert!(
            ResidualClassifierNetworkConfig::new([1, 20, 20], 4)
                .try_validate()
                .is_err()
        );
    }

    #[test]
    fn test_network_forward() {
        type B = NdArray;
        let device = Default::default();

        let config = ResidualClassifierNetworkConfig::new([3, 20, 20], 4);
        let network: ResidualClassifierNetwork<B> = config.init(&device);

        assert_eq!(network.flat_features(), 18432);
        assert_eq!(network.output_size(), 4);

        let batch_size = 2;
        let input = Tensor::random([batch_size, 3, 20, 20], Distribution::Default, &device);
        let output = network.forward(input);

        assert_shape_contract!(
            ["batch", "output_size"],
            &output,
            &[("batch", batch_size), ("output_size", 4)],
        );

        // Unactivated class scores.
        for value in output.to_data().to_vec::<f32>().unwrap() {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_parameter_inventory() {
        type B = NdArray;
        let device = Default::default();

        let network: ResidualClassifierNetwork<B> =
            ResidualClassifierNetworkConfig::new([3, 20, 20], 4).init(&device);

        let expected = conv_params(3, 64, 7)
            + stage_params(64, 256, 64, 3)
            + stage_params(256, 512, 128, 8)
            + stage_params(512, 1024, 256, 36)
            + stage_params(1024, 2048, 512, 3)
            + linear_params(18432, 4);
        assert_eq!(network.parameter_count(), expected);

        let params = network.parameters();
        let total: usize = params.iter().map(|entry| entry.num_elements()).sum();
        assert_eq!(total, expected);
    }

    #[test]
    #[should_panic]
    fn test_drifted_input_panics_at_forward() {
        type B = NdArray;
        let device = Default::default();

        // Construction succeeds; the head expects the formula's 61952
        // features, while the stem produces 5x5x2048 = 51200.
        let network: ResidualClassifierNetwork<B> =
            ResidualClassifierNetworkConfig::new([3, 30, 30], 4).init(&device);

        let input = Tensor::ones([1, 3, 30, 30], &device);
        let _ = network.forward(input);
    }

    #[test]
    #[should_panic]
    fn test_stem_requires_three_channels() {
        type B = NdArray;
        let device = Default::default();

        // The configured channel count does not loosen the stem.
        let network: ResidualClassifierNetwork<B> =
            ResidualClassifierNetworkConfig::new([1, 20, 20], 4).init(&device);

        let input = Tensor::ones([1, 1, 20, 20], &device);
        let _ = network.forward(input);
    }
}
