//! # Siamese Network Shape Arithmetic
//!
//! The network's flattened feature size is configured from a closed-form
//! float formula over the input resolution ([`flat_feature_size`]), while
//! the layers themselves floor at every stage
//! ([`maybe_feature_resolution`]).
//!
//! The two agree exactly when every intermediate division is exact; on
//! other inputs the formula drifts from the actual feature map, and the
//! mismatch surfaces as a panic at the first forward pass.

use crate::shape::maybe_window_output_resolution;

/// The feature channels produced by the final convolution.
pub const FEATURE_CHANNELS: usize = 256;

/// The closed-form feature map side length, in float arithmetic.
///
/// Composes the reductions of the convolution/pooling chain without
/// intermediate flooring:
///
/// ```text
/// side = ((((side - 9) / 2 - 6) / 2 - 3) / 2) - 3
/// ```
///
/// # Arguments
///
/// - `input_size`: one spatial input dimension.
///
/// # Returns
///
/// The un-floored feature map side; negative when the chain collapses.
pub fn feature_map_side(input_size: usize) -> f64 {
    let side = input_size as f64;
    ((((side - 9.0) / 2.0 - 6.0) / 2.0 - 3.0) / 2.0) - 3.0
}

/// The configured flattened feature size for an input resolution.
///
/// ```text
/// flat = trunc( side(height) * side(width) * 256 )
/// ```
///
/// Truncation applies once, to the final product; a product that is
/// negative (or otherwise unrepresentable) clamps to zero.
///
/// # Arguments
///
/// - `input_resolution`: the ``[height, width]`` input resolution.
///
/// # Returns
///
/// The flattened feature size the projection head is built for.
pub fn flat_feature_size(input_resolution: [usize; 2]) -> usize {
    let [height, width] = input_resolution;
    (feature_map_side(height) * feature_map_side(width) * FEATURE_CHANNELS as f64) as usize
}

/// The stage-accurate feature map resolution for an input resolution.
///
/// Traces the convolution/pooling chain with per-stage flooring, the way
/// the layers actually compute it.
///
/// # Arguments
///
/// - `input_resolution`: the ``[height, width]`` input resolution.
///
/// # Returns
///
/// An `Option<[usize; 2]>` feature map resolution; or `None` when any
/// stage collapses to nothing.
pub fn maybe_feature_resolution(input_resolution: [usize; 2]) -> Option<[usize; 2]> {
    // Conv 10x10.
    let resolution = maybe_window_output_resolution(input_resolution, 10, 1, 0)?;
    // MaxPool 2, Conv 7x7.
    let resolution = maybe_window_output_resolution(resolution, 2, 2, 0)?;
    let resolution = maybe_window_output_resolution(resolution, 7, 1, 0)?;
    // MaxPool 2, Conv 4x4.
    let resolution = maybe_window_output_resolution(resolution, 2, 2, 0)?;
    let resolution = maybe_window_output_resolution(resolution, 4, 1, 0)?;
    // MaxPool 2, Conv 4x4.
    let resolution = maybe_window_output_resolution(resolution, 2, 2, 0)?;
    maybe_window_output_resolution(resolution, 4, 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_resolutions_agree() {
        // The canonical 105x105 input: every division is exact.
        assert_eq!(feature_map_side(105), 6.0);
        assert_eq!(flat_feature_size([105, 105]), 9216);
        assert_eq!(maybe_feature_resolution([105, 105]), Some([6, 6]));

        // The smallest square input with a legal feature map.
        assert_eq!(feature_map_side(65), 1.0);
        assert_eq!(flat_feature_size([65, 65]), 256);
        assert_eq!(maybe_feature_resolution([65, 65]), Some([1, 1]));

        // Non-square.
        assert_eq!(flat_feature_size([105, 65]), 6 * 256);
        assert_eq!(maybe_feature_resolution([105, 65]), Some([6, 1]));
    }

    #[test]
    fn test_inexact_resolution_drifts() {
        // 69 floors twice on the way down; the formula keeps the halves.
        assert_eq!(feature_map_side(69), 1.5);
        assert_eq!(flat_feature_size([69, 69]), 576);
        assert_eq!(maybe_feature_resolution([69, 69]), Some([1, 1]));

        // The configured head would expect 576 features and receive 256.
        let [height, width] = maybe_feature_resolution([69, 69]).unwrap();
        assert_ne!(
            height * width * FEATURE_CHANNELS,
            flat_feature_size([69, 69])
        );
    }

    #[test]
    fn test_collapsed_resolution() {
        // 32 collapses in the final convolution; the formula's two
        // negative sides multiply to a positive size anyway.
        assert_eq!(feature_map_side(32), -3.125);
        assert_eq!(flat_feature_size([32, 32]), 2500);
        assert_eq!(maybe_feature_resolution([32, 32]), None);

        // One negative side clamps the product to zero.
        assert_eq!(flat_feature_size([105, 32]), 0);
    }
}
