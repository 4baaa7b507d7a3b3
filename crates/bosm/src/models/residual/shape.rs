//! # Residual Classifier Shape Bookkeeping
//!
//! The classifier sizes its linear head with a closed-form formula,
//! while the stem layers floor their output size at each step. The two
//! agree when both input sides are multiples of 4 (and large enough for
//! the stem kernels); elsewhere the formula drifts, and the mismatch
//! surfaces as a shape contract panic at the first forward pass.
//!
//! [`maybe_feature_resolution`] traces the stem layer by layer, and is
//! the ground truth for what the stages actually produce.

use crate::shape::maybe_window_output_resolution;

/// The channel depth of the final stage's feature maps.
pub const FEATURE_CHANNELS: usize = 2048;

/// Closed-form feature map side length for one input side.
///
/// Models the stem (7x7 stride-2 conv, then 3x3 stride-2 pool) as a
/// plain /4 downsample with a fixed border correction. Exact for sides
/// that are multiples of 4; fractional (and eventually negative) for
/// everything else.
///
/// # Arguments
///
/// - `input_size`: the input side length.
///
/// # Returns
///
/// The formula side length, unfloored.
pub fn feature_map_side(input_size: usize) -> f64 {
    input_size as f64 / 4.0 - 2.0
}

/// Closed-form flattened feature size for an input resolution.
///
/// This is the head sizing rule: the product of the two
/// [`feature_map_side`] values and [`FEATURE_CHANNELS`], truncated
/// once at the end. A negative product truncates to 0.
///
/// # Arguments
///
/// - `input_resolution`: the ``[height, width]`` input resolution.
///
/// # Returns
///
/// The flattened feature size.
pub fn flat_feature_size(input_resolution: [usize; 2]) -> usize {
    let [height, width] = input_resolution;
    let side_h = feature_map_side(height);
    let side_w = feature_map_side(width);
    (side_h * side_w * FEATURE_CHANNELS as f64) as usize
}

/// Trace the stem's actual output resolution, step by step.
///
/// The bottleneck stages preserve resolution, so this is also the
/// resolution entering the head.
///
/// # Arguments
///
/// - `input_resolution`: the ``[height, width]`` input resolution.
///
/// # Returns
///
/// `Some([height, width])` of the feature maps; `None` if any stem
/// layer has no legal output size.
pub fn maybe_feature_resolution(input_resolution: [usize; 2]) -> Option<[usize; 2]> {
    // 7x7 conv, stride 2.
    let resolution = maybe_window_output_resolution(input_resolution, 7, 2, 0)?;
    // 3x3 max pool, stride 2.
    maybe_window_output_resolution(resolution, 3, 2, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_matches_trace_on_multiples_of_4() {
        // The canonical 224x224 classifier input.
        assert_eq!(feature_map_side(224), 54.0);
        assert_eq!(flat_feature_size([224, 224]), 54 * 54 * 2048);
        assert_eq!(maybe_feature_resolution([224, 224]), Some([54, 54]));

        // Small inputs, still aligned.
        assert_eq!(feature_map_side(20), 3.0);
        assert_eq!(flat_feature_size([20, 20]), 18432);
        assert_eq!(maybe_feature_resolution([20, 20]), Some([3, 3]));

        assert_eq!(feature_map_side(12), 1.0);
        assert_eq!(flat_feature_size([12, 12]), 2048);
        assert_eq!(maybe_feature_resolution([12, 12]), Some([1, 1]));

        // Non-square.
        assert_eq!(flat_feature_size([20, 12]), 3 * 2048);
        assert_eq!(maybe_feature_resolution([20, 12]), Some([3, 1]));
    }

    #[test]
    fn test_formula_drifts_off_alignment() {
        // 30 is not a multiple of 4: the formula keeps the fractional
        // side while the stem floors twice.
        assert_eq!(feature_map_side(30), 5.5);
        assert_eq!(flat_feature_size([30, 30]), 61_952);
        assert_eq!(maybe_feature_resolution([30, 30]), Some([5, 5]));
        assert_ne!(flat_feature_size([30, 30]), 5 * 5 * 2048);
    }

    #[test]
    fn test_collapsed_inputs() {
        // Too small for the stem kernels.
        assert_eq!(maybe_feature_resolution([6, 6]), None);
        assert_eq!(maybe_feature_resolution([4, 224]), None);

        // The formula squares two negative sides into a positive size.
        assert_eq!(feature_map_side(6), -0.5);
        assert_eq!(flat_feature_size([6, 6]), 512);

        // A single negative side truncates to 0.
        assert_eq!(flat_feature_size([20, 6]), 0);
    }
}
