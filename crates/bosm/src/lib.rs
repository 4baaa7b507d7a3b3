#![warn(missing_docs)]
//!# bosm - Burn One-Shot Models
//!
//! ## Notable Components
//!
//! * [`inspect`] - module parameter inventory.
//! * [`layers`] - reusable neural network modules.
//!   * [`layers::activation`] - activation layer abstraction wrapper.
//!   * [`layers::head`] - flatten + linear projection head.
//!   * [`layers::stack`] - ordered sequences of 2d layers.
//! * [`models`] - complete model families.
//!   * [`models::residual`] - deep residual (bottleneck) classifier.
//!   * [`models::siamese`] - siamese feature embedding network.
//! * [`shape`] - sliding-window shape arithmetic.

/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod inspect;
pub mod layers;
pub mod models;
pub mod shape;
