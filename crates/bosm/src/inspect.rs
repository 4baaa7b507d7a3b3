//! # Module Parameter Inventory
//!
//! [`collect_parameters`] walks a [`Module`] tree and records every learnable
//! (float) parameter tensor as a [`ParamEntry`].
//!
//! Traversal follows the module derive's field order, so the inventory is
//! deterministic and stable across calls on an unmutated module.

use burn::module::{ModuleVisitor, ParamId};
use burn::prelude::{Backend, Module, Tensor};

/// A single recorded learnable parameter.
#[derive(Debug, Clone)]
pub struct ParamEntry<B: Backend> {
    /// The parameter id.
    pub id: ParamId,

    /// The shape of the source tensor.
    pub shape: Vec<usize>,

    /// The parameter values, flattened to rank 1.
    pub values: Tensor<B, 1>,
}

impl<B: Backend> ParamEntry<B> {
    /// The number of elements in the parameter.
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }
}

struct ParamCollector<B: Backend> {
    entries: Vec<ParamEntry<B>>,
}

impl<B: Backend> ModuleVisitor<B> for ParamCollector<B> {
    fn visit_float<const D: usize>(
        &mut self,
        id: ParamId,
        tensor: &Tensor<B, D>,
    ) {
        let shape = tensor.shape().dims;
        let num_elements = tensor.shape().num_elements();
        self.entries.push(ParamEntry {
            id,
            shape,
            values: tensor.clone().reshape([num_elements]),
        });
    }
}

/// Collect the learnable parameters of a module.
///
/// # Arguments
///
/// - `module`: the module to inventory.
///
/// # Returns
///
/// A `Vec<ParamEntry<B>>`, in module traversal order.
pub fn collect_parameters<B: Backend, M: Module<B>>(module: &M) -> Vec<ParamEntry<B>> {
    let mut collector = ParamCollector {
        entries: Vec::new(),
    };
    module.visit(&mut collector);
    collector.entries
}
