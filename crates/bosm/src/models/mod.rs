//! Complete model families.
pub mod residual;
pub mod siamese;
