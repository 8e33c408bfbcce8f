//! Int8 dynamic-range kernels.
//!
//! Weights are quantized once at export time, symmetric per
//! output channel. Activations are quantized on the fly, one
//! scale per input row, so the dot products run in `i32` and
//! only the rescale and bias are in float.

/// Largest magnitude representable by a symmetric int8 value
pub const QMAX: f32 = 127.0;

/// Symmetric scale for a set of values: max|v| / 127.
/// An all-zero set gets scale 1.0 so dequantization stays exact.
pub fn symmetric_scale<'a>(values: impl IntoIterator<Item = &'a f32>) -> f32 {
    let max_abs = values.into_iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max_abs > 0.0 { max_abs / QMAX } else { 1.0 }
}

pub fn quantize_value(value: f32, scale: f32) -> i8 {
    (value / scale).round().clamp(-QMAX, QMAX) as i8
}

/// Quantize one row with a single scale.
pub fn quantize_row(values: &[f32]) -> (Vec<i8>, f32) {
    let scale = symmetric_scale(values);
    (values.iter().map(|&v| quantize_value(v, scale)).collect(), scale)
}

/// Quantize a row-major `[in_dim, out_dim]` weight matrix with one
/// scale per output column.
pub fn quantize_per_channel(weights: &[f32], in_dim: usize, out_dim: usize) -> (Vec<i8>, Vec<f32>) {
    debug_assert_eq!(weights.len(), in_dim * out_dim);

    let scales: Vec<f32> = (0..out_dim)
        .map(|j| symmetric_scale((0..in_dim).map(|i| &weights[i * out_dim + j])))
        .collect();

    let quantized = weights
        .iter()
        .enumerate()
        .map(|(k, &w)| quantize_value(w, scales[k % out_dim]))
        .collect();

    (quantized, scales)
}

/// `y = x · W + b` with int8 x and W, i32 accumulation.
pub fn hybrid_dense(
    input:    &[f32],
    weights:  &[i8],
    scales:   &[f32],
    bias:     &[f32],
    out_dim:  usize,
) -> Vec<f32> {
    let (xq, x_scale) = quantize_row(input);

    (0..out_dim)
        .map(|j| {
            let acc: i32 = xq
                .iter()
                .enumerate()
                .map(|(i, &x)| x as i32 * weights[i * out_dim + j] as i32)
                .sum();
            acc as f32 * x_scale * scales[j] + bias[j]
        })
        .collect()
}

pub fn relu_in_place(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = v.max(0.0);
    }
}

/// Numerically stable softmax.
pub fn softmax_in_place(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}
