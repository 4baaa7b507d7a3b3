//! # Activation Layer Wrapper
use burn::nn::{Relu, Sigmoid};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`Activation`] Configuration.
#[derive(Config, Debug)]
#[non_exhaustive]
pub enum ActivationConfig {
    /// [`Relu`] activation layer.
    Relu,

    /// [`Sigmoid`] activation layer.
    Sigmoid,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::Relu
    }
}

impl ActivationConfig {
    /// Initialize a wrapped activation layer.
    pub fn init(&self) -> Activation {
        match self {
            ActivationConfig::Relu => Activation::Relu(Relu),
            ActivationConfig::Sigmoid => Activation::Sigmoid(Sigmoid),
        }
    }
}

/// Activation Layer Wrapper.
///
/// Wraps the stateless `burn::nn` activations used by the model families.
#[derive(Module, Clone, Debug)]
#[non_exhaustive]
pub enum Activation {
    /// [`Relu`] activation layer.
    Relu(Relu),

    /// [`Sigmoid`] activation layer.
    Sigmoid(Sigmoid),
}

impl Activation {
    /// Forward pass.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        match self {
            Activation::Relu(layer) => layer.forward(input),
            Activation::Sigmoid(layer) => layer.forward(input),
        }
    }

    /// Build an [`ActivationConfig`] for this module.
    pub fn to_config(&self) -> ActivationConfig {
        match self {
            Activation::Relu(_) => ActivationConfig::Relu,
            Activation::Sigmoid(_) => ActivationConfig::Sigmoid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn make_input<B: Backend>(device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data([[-1.0, -0.5, 0.0], [1.0, 0.5, 0.0]], device)
    }

    fn check_config_output<B: Backend, const D: usize>(
        config: ActivationConfig,
        input: Tensor<B, D>,
        expected: Tensor<B, D>,
    ) {
        let act = config.init();
        let output = act.forward(input);
        output.to_data().assert_eq(&expected.to_data(), true);
    }

    #[test]
    fn test_default() {
        assert!(matches!(
            ActivationConfig::default(),
            ActivationConfig::Relu
        ));
    }

    #[test]
    fn test_relu() {
        let device = Default::default();
        let input = make_input::<TestBackend>(&device);

        let expected = Relu::default().forward(input.clone());

        check_config_output(ActivationConfig::Relu, input, expected)
    }

    #[test]
    fn test_sigmoid() {
        let device = Default::default();
        let input = make_input::<TestBackend>(&device);

        let expected = Sigmoid::default().forward(input.clone());

        check_config_output(ActivationConfig::Sigmoid, input, expected)
    }

    #[test]
    fn test_to_config_roundtrip() {
        for config in [ActivationConfig::Relu, ActivationConfig::Sigmoid] {
            let act = config.init();
            assert!(matches!(
                (config, act.to_config()),
                (ActivationConfig::Relu, ActivationConfig::Relu)
                    | (ActivationConfig::Sigmoid, ActivationConfig::Sigmoid)
            ));
        }
    }
}
