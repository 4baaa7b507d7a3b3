//! # Sliding-Window Shape Utilities
//!
//! Utilities for computing the output size of sliding-window operations;
//! shared by unit-dilation convolution and max-pooling layers.

/// Predict the output size of a sliding-window operation.
///
/// ```text
/// out_size = floor( ((in_size + 2*padding - kernel_size) / stride) + 1 )
/// ```
///
/// # Reference
///
/// - [conv_arithmetic diagram](https://github.com/vdumoulin/conv_arithmetic/blob/master/README.md)
///   visual explanations of these window parameters.
/// - [pytorch conv2d](https://docs.pytorch.org/docs/stable/generated/torch.nn.Conv2d.html)
/// - [pytorch maxpool2d](https://docs.pytorch.org/docs/stable/generated/torch.nn.MaxPool2d.html)
///
/// # Arguments
///
/// - `input_size`: The input dimension size, must be > 0.
/// - `kernel_size`: The window size, must be > 0.
/// - `stride`: The stride of the window, must be > 0.
/// - `padding`: The padding, added evenly to all sides of the input.
///
/// # Returns
///
/// An `Option<usize>` representing the output size; or `None` for <= 0.
pub fn maybe_window_output_size(
    input_size: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
) -> Option<usize> {
    assert!(input_size > 0);
    assert!(kernel_size > 0);
    assert!(stride > 0);

    let effective_size = input_size + 2 * padding;
    let pos = effective_size + stride;

    if pos < kernel_size {
        return None;
    }
    let x = (pos - kernel_size) / stride;
    if x < 1 { None } else { Some(x) }
}

/// Predict the output size of a sliding-window operation.
///
/// This is the ``panic``-ing variant of [`maybe_window_output_size`].
///
/// ```text
/// out_size = floor( ((in_size + 2*padding - kernel_size) / stride) + 1 )
/// ```
///
/// # Arguments
///
/// - `input_size`: The input dimension size, must be > 0.
/// - `kernel_size`: The window size, must be > 0.
/// - `stride`: The stride of the window, must be > 0.
/// - `padding`: The padding, added evenly to all sides of the input.
///
/// # Returns
///
/// The output size of the window operation.
///
/// # Panics
///
/// If the output size would be <= 0.
pub fn expect_window_output_size(
    input_size: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
) -> usize {
    match maybe_window_output_size(input_size, kernel_size, stride, padding) {
        Some(x) => x,
        None => panic!(
            "No legal output size for window with:\n input_size:{input_size}\n kernel_size:{kernel_size}\n stride:{stride}\n padding:{padding}",
        ),
    }
}

/// Predict the output resolution of a square sliding-window operation.
///
/// This is the per-axis application of [`maybe_window_output_size`]
/// to a ``[height, width]`` resolution.
///
/// # Arguments
///
/// - `input_resolution`: The ``[height, width]`` input resolution, each dim must be > 0.
/// - `kernel_size`: The window size, must be > 0.
/// - `stride`: The stride of the window, must be > 0.
/// - `padding`: The padding, added evenly to all sides of the input.
///
/// # Returns
///
/// An `Option<[usize; 2]>` representing the output resolution; or `None` for <= 0.
pub fn maybe_window_output_resolution(
    input_resolution: [usize; 2],
    kernel_size: usize,
    stride: usize,
    padding: usize,
) -> Option<[usize; 2]> {
    let [in_height, in_width] = input_resolution;
    Some([
        maybe_window_output_size(in_height, kernel_size, stride, padding)?,
        maybe_window_output_size(in_width, kernel_size, stride, padding)?,
    ])
}

/// Predict the output resolution of a square sliding-window operation.
///
/// This is the ``panic``-ing variant of [`maybe_window_output_resolution`].
///
/// # Arguments
///
/// - `input_resolution`: The ``[height, width]`` input resolution, each dim must be > 0.
/// - `kernel_size`: The window size, must be > 0.
/// - `stride`: The stride of the window, must be > 0.
/// - `padding`: The padding, added evenly to all sides of the input.
///
/// # Returns
///
/// The ``[height, width]`` output resolution.
///
/// # Panics
///
/// If either output dimension would be <= 0.
pub fn expect_window_output_resolution(
    input_resolution: [usize; 2],
    kernel_size: usize,
    stride: usize,
    padding: usize,
) -> [usize; 2] {
    match maybe_window_output_resolution(input_resolution, kernel_size, stride, padding) {
        Some(resolution) => resolution,
        None => panic!(
            "No legal output resolution for window with:\n input_resolution:{input_resolution:?}\n kernel_size:{kernel_size}\n stride:{stride}\n padding:{padding}",
        ),
    }
}
