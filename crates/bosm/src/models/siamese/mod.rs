//! # Siamese Feature Network
//!
//! A convolutional feature embedding tower in the Koch et al. style:
//! a wide initial convolution, a deepening pool/conv ladder, and a
//! sigmoid-activated projection head.

pub mod network;
pub mod shape;
