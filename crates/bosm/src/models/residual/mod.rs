//! # Residual Classifier Model Family
//!
//! A deep bottleneck-residual image classifier in the ResNet-152
//! layer plan: a strided stem, four projected bottleneck stages of
//! depth `{3, 8, 36, 3}`, and a flattening linear head.

pub mod bottleneck;
pub mod network;
pub mod shape;
pub mod stage;
