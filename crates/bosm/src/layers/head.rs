//! # Flattening Projection Head
//!
//! [`FlattenHead`] flattens a rank-4 feature map to a feature vector per
//! batch element, applies a [`Linear`] projection, and optionally an
//! [`Activation`].
//!
//! [`FlattenHeadMeta`] defines a common meta API for [`FlattenHead`]
//! and [`FlattenHeadConfig`].
//!
//! The flatten boundary is where a mis-configured feature size surfaces:
//! the incoming feature map must flatten to exactly `in_features` values
//! per batch element, or the forward pass panics.

use crate::layers::activation::{Activation, ActivationConfig};
use bimm_contracts::{assert_shape_contract, assert_shape_contract_periodically};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`FlattenHead`] Meta trait.
pub trait FlattenHeadMeta {
    /// The flattened input feature size.
    fn in_features(&self) -> usize;

    /// The output feature size.
    fn out_features(&self) -> usize;
}

/// [`FlattenHead`] Configuration.
///
/// Implements [`FlattenHeadMeta`].
#[derive(Config, Debug)]
pub struct FlattenHeadConfig {
    /// The flattened input feature size.
    pub in_features: usize,

    /// The output feature size.
    pub out_features: usize,

    /// Optional output [`Activation`] config.
    #[config(default = "None")]
    pub activation: Option<ActivationConfig>,
}

impl FlattenHeadMeta for FlattenHeadConfig {
    fn in_features(&self) -> usize {
        self.in_features
    }

    fn out_features(&self) -> usize {
        self.out_features
    }
}

impl FlattenHeadConfig {
    /// Initialize a [`FlattenHead`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> FlattenHead<B> {
        FlattenHead {
            fc: LinearConfig::new(self.in_features, self.out_features).init(device),
            act: self.activation.as_ref().map(|config| config.init()),
        }
    }
}

/// Flattening projection head.
///
/// Maps ``[batch, channels, height, width]`` to ``[batch, out_features]``
/// tensors; requires ``channels * height * width == in_features``.
///
/// Implements [`FlattenHeadMeta`].
#[derive(Module, Debug)]
pub struct FlattenHead<B: Backend> {
    /// The projection layer.
    pub fc: Linear<B>,

    /// Optional output activation.
    pub act: Option<Activation>,
}

impl<B: Backend> FlattenHeadMeta for FlattenHead<B> {
    fn in_features(&self) -> usize {
        self.fc.weight.shape().dims[0]
    }

    fn out_features(&self) -> usize {
        self.fc.weight.shape().dims[1]
    }
}

impl<B: Backend> FlattenHead<B> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, channels, height, width]`` tensor,
    ///   with ``channels * height * width == in_features``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_features]`` tensor.
    ///
    /// # Panics
    ///
    /// If the input does not flatten to `in_features` values per batch element.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let x: Tensor<B, 2> = input.flatten(1, 3);

        assert_shape_contract!(
            ["batch", "in_features"],
            &x,
            &[("in_features", self.in_features())],
        );

        let x = self.fc.forward(x);

        let x = match &self.act {
            Some(act) => act.forward(x),
            None => x,
        };

        assert_shape_contract_periodically!(
            ["batch", "out_features"],
            &x,
            &[("out_features", self.out_features())],
        );

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_head_config() {
        let config = FlattenHeadConfig::new(64, 10);
        assert_eq!(config.in_features(), 64);
        assert_eq!(config.out_features(), 10);
        assert!(config.activation.is_none());

        let config = config.with_activation(Some(ActivationConfig::Sigmoid));
        assert!(matches!(
            config.activation,
            Some(ActivationConfig::Sigmoid)
        ));
    }

    #[test]
    fn test_head_forward() {
        type B = NdArray;
        let device = Default::default();

        let batch_size = 2;

        let head: FlattenHead<B> = FlattenHeadConfig::new(4 * 2 * 2, 10).init(&device);
        assert_eq!(head.in_features(), 16);
        assert_eq!(head.out_features(), 10);

        let input = Tensor::ones([batch_size, 4, 2, 2], &device);
        let output = head.forward(input);

        assert_shape_contract!(
            ["batch", "out_features"],
            &output,
            &[("batch", batch_size), ("out_features", 10)],
        );
    }

    #[test]
    fn test_head_forward_sigmoid_range() {
        type B = NdArray;
        let device = Default::default();

        let head: FlattenHead<B> = FlattenHeadConfig::new(16, 4)
            .with_activation(Some(ActivationConfig::Sigmoid))
            .init(&device);

        let input = Tensor::ones([3, 4, 2, 2], &device);
        let output = head.forward(input);

        for value in output.to_data().to_vec::<f32>().unwrap() {
            assert!(value > 0.0 && value < 1.0);
        }
    }

    #[test]
    #[should_panic]
    fn test_head_feature_mismatch_panic() {
        type B = NdArray;
        let device = Default::default();

        // Configured for 32 flat features; actual map flattens to 16.
        let head: FlattenHead<B> = FlattenHeadConfig::new(32, 10).init(&device);

        let input = Tensor::ones([2, 4, 2, 2], &device);
        let _ = head.forward(input);
    }
}
