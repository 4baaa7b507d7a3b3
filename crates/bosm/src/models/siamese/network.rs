//! # Siamese Feature Network Model
//!
//! [`SiameseFeatureNetworkMeta`] defines a common meta API for
//! [`SiameseFeatureNetwork`] and [`SiameseFeatureNetworkConfig`].
//!
//! [`SiameseFeatureNetworkConfig`] implements [`Config`], and provides
//! [`SiameseFeatureNetworkConfig::init`] to initialize a
//! [`SiameseFeatureNetwork`].
//!
//! [`SiameseFeatureNetwork`] implements [`Module`], and provides
//! [`SiameseFeatureNetwork::forward`].

use crate::inspect::{ParamEntry, collect_parameters};
use crate::layers::activation::ActivationConfig;
use crate::layers::head::{FlattenHead, FlattenHeadConfig, FlattenHeadMeta};
use crate::layers::stack::{Stage2d, Stage2dConfig};
use crate::models::siamese::shape::{FEATURE_CHANNELS, flat_feature_size, maybe_feature_resolution};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::MaxPool2dConfig;
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`SiameseFeatureNetwork`] Meta trait.
pub trait SiameseFeatureNetworkMeta {
    /// The number of input image channels.
    fn in_channels(&self) -> usize;

    /// The flattened feature size feeding the projection head.
    fn flat_features(&self) -> usize;

    /// The output embedding size.
    fn output_size(&self) -> usize;
}

/// [`SiameseFeatureNetwork`] Configuration.
///
/// Implements [`SiameseFeatureNetworkMeta`].
#[derive(Config, Debug)]
pub struct SiameseFeatureNetworkConfig {
    /// The ``[channels, height, width]`` input image shape.
    pub input_shape: [usize; 3],

    /// The output embedding size.
    pub output_size: usize,
}

impl SiameseFeatureNetworkMeta for SiameseFeatureNetworkConfig {
    fn in_channels(&self) -> usize {
        self.input_shape[0]
    }

    fn flat_features(&self) -> usize {
        let [_, height, width] = self.input_shape;
        flat_feature_size([height, width])
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

impl SiameseFeatureNetworkConfig {
    /// Check that the configured flat feature size matches the stages.
    ///
    /// The projection head is sized by the closed-form
    /// [`flat_feature_size`] formula; the stages floor at every layer.
    /// This diagnostic reports the drift that would otherwise surface
    /// as a panic at the first forward pass.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        let [_, height, width] = self.input_shape;
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

    /// Initialize a [`SiameseFeatureNetwork`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> SiameseFeatureNetwork<B> {
        let [in_channels, height, width] = self.input_shape;

        // 10x10 conv, 64.
        let initial = Stage2dConfig::from(vec![
            Conv2dConfig::new([in_channels, 64], [10, 10]).into(),
            ActivationConfig::Relu.into(),
        ]);

        // Three pool/conv rounds, deepening 64 -> 128 -> 128 -> 256.
        let features = Stage2dConfig::from(vec![
            MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).into(),
            Conv2dConfig::new([64, 128], [7, 7]).into(),
            ActivationConfig::Relu.into(),
            MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).into(),
            Conv2dConfig::new([128, 128], [4, 4]).into(),
            ActivationConfig::Relu.into(),
            MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).into(),
            Conv2dConfig::new([128, 256], [4, 4]).into(),
            ActivationConfig::Relu.into(),
        ]);

        // Sigmoid embedding head, sized by the closed-form formula.
        let head = FlattenHeadConfig::new(flat_feature_size([height, width]), self.output_size)
            .with_activation(Some(ActivationConfig::Sigmoid));

        SiameseFeatureNetwork {
            in_channels,
            initial: initial.init(device),
            features: features.init(device),
            head: head.init(device),
        }
    }
}

/// Siamese feature embedding network.
///
/// Implements [`SiameseFeatureNetworkMeta`].
#[derive(Module, Debug)]
pub struct SiameseFeatureNetwork<B: Backend> {
    /// The number of input image channels.
    pub in_channels: usize,

    /// The initial convolution stage.
    pub initial: Stage2d<B>,

    /// The deepening feature extraction stage.
    pub features: Stage2d<B>,

    /// The flattening projection head.
    pub head: FlattenHead<B>,
}

impl<B: Backend> SiameseFeatureNetworkMeta for SiameseFeatureNetwork<B> {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn flat_features(&self) -> usize {
        self.head.in_features()
    }

    fn output_size(&self) -> usize {
        self.head.out_features()
    }
}

impl<B: Backend> SiameseFeatureNetwork<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, in_channels, height, width]`` image tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, output_size]`` embedding tensor, sigmoid-activated.
    ///
    /// # Panics
    ///
    /// If the input resolution does not fit the convolution chain, or the
    /// feature map does not flatten to the configured feature size.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())],
        );

        let x = self.initial.forward(input);
        let x = self.features.forward(x);
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
