use rustfft::num_complex::Complex;

use crate::engine::history::SpectralHistory;
use crate::engine::partition::PartitionSet;

/// `result[k] += a[k] * b[k]` for every bin.
#[inline]
pub fn complex_multiply_accumulate(
    result: &mut [Complex<f32>],
    a: &[Complex<f32>],
    b: &[Complex<f32>],
) {
    debug_assert_eq!(result.len(), a.len());
    debug_assert_eq!(result.len(), b.len());

    for ((acc, x), h) in result.iter_mut().zip(a).zip(b) {
        acc.re += x.re * h.re - x.im * h.im;
        acc.im += x.im * h.re + x.re * h.im;
    }
}

/// Sum `history[k] * partitions[k]` over all partitions into `output`, then
/// scale by `1 / P`.
///
/// Returns `false` without touching `output` when there are no partitions;
/// the caller is expected to pass the input through instead.
pub fn accumulate(
    history: &SpectralHistory,
    partitions: &PartitionSet,
    output: &mut [Complex<f32>],
) -> bool {
    let count = partitions.len();
    if count == 0 {
        return false;
    }

    output.fill(Complex::new(0.0, 0.0));

    for (x, h) in history.iter().zip(partitions.iter()) {
        complex_multiply_accumulate(output, x, h);
    }

    let scale = 1.0 / count as f32;
    for bin in output.iter_mut() {
        *bin *= scale;
    }

    true
}
