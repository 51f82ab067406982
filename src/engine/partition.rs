use rustfft::num_complex::Complex;

use crate::transform::{SpectralTransform, TransformError};

/// Number of `block_length` chunks needed to cover `impulse_length` samples.
pub const fn partition_count(impulse_length: usize, block_length: usize) -> usize {
    if block_length == 0 {
        return 0;
    }
    impulse_length.div_ceil(block_length)
}

/// Copy `src` into `dst` and zero whatever is left over.
pub fn copy_and_pad(dst: &mut [f32], src: &[f32]) {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
    dst[len..].fill(0.0);
}

/// Frequency-domain chunks of an impulse response, index 0 = earliest chunk.
#[derive(Debug, Clone, Default)]
pub struct PartitionSet {
    block_length: usize,
    partitions: Vec<Vec<Complex<f32>>>,
    chunk: Vec<f32>,
}

impl PartitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice the first `impulse_length` samples of `impulse` into
    /// `block_length` chunks and transform each one. Chunks are zero-padded,
    /// including any that lie past the end of `impulse`. Replaces the previous
    /// contents entirely.
    pub fn rebuild<T: SpectralTransform + ?Sized>(
        &mut self,
        transform: &mut T,
        impulse: &[f32],
        impulse_length: usize,
        block_length: usize,
    ) -> Result<(), TransformError> {
        let count = partition_count(impulse_length, block_length);
        let impulse = &impulse[..impulse.len().min(impulse_length)];

        self.block_length = block_length;
        self.partitions
            .resize_with(count, || vec![Complex::new(0.0, 0.0); block_length]);
        self.chunk.resize(block_length, 0.0);

        if count == 0 {
            return Ok(());
        }

        transform.prepare(block_length)?;

        for (index, spectrum) in self.partitions.iter_mut().enumerate() {
            let start = (index * block_length).min(impulse.len());
            let end = (start + block_length).min(impulse.len());

            spectrum.resize(block_length, Complex::new(0.0, 0.0));
            copy_and_pad(&mut self.chunk, &impulse[start..end]);
            transform.forward(&mut self.chunk, spectrum)?;
        }

        Ok(())
    }

    /// Drop all partitions, e.g. when the impulse resource has gone away.
    pub fn clear(&mut self) {
        self.partitions.clear();
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn get(&self, index: usize) -> Option<&[Complex<f32>]> {
        self.partitions.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Complex<f32>]> {
        self.partitions.iter().map(Vec::as_slice)
    }
}
