use realfft::{ComplexToReal, FftError, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("transform not prepared for block length {0}")]
    NotPrepared(usize),
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    Length { expected: usize, got: usize },
    #[error("fft error: {0}")]
    Fft(String),
}

impl From<FftError> for TransformError {
    fn from(err: FftError) -> Self {
        Self::Fft(err.to_string())
    }
}

/// Forward/inverse real-valued transform the engine analyses impulses with.
///
/// Spectra are full length: a block of `B` real samples maps to `B` complex
/// bins, the upper half being the conjugate mirror of the lower half.
pub trait SpectralTransform {
    /// Re-plan for a new block length. Only called from the re-analysis path.
    fn prepare(&mut self, block_length: usize) -> Result<(), TransformError>;

    /// Transform `block` into `spectrum`. `block` is used as scratch.
    fn forward(
        &mut self,
        block: &mut [f32],
        spectrum: &mut [Complex<f32>],
    ) -> Result<(), TransformError>;

    /// Inverse of [`forward`](Self::forward), normalized so the round trip is
    /// the identity. `spectrum` is used as scratch.
    fn inverse(
        &mut self,
        spectrum: &mut [Complex<f32>],
        block: &mut [f32],
    ) -> Result<(), TransformError>;
}

/// [`SpectralTransform`] backed by `realfft`.
pub struct RealFftTransform {
    block_length: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    half: Vec<Complex<f32>>,
    r2c_scratch: Vec<Complex<f32>>,
    c2r_scratch: Vec<Complex<f32>>,
}

impl Default for RealFftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RealFftTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealFftTransform")
            .field("block_length", &self.block_length)
            .finish_non_exhaustive()
    }
}

impl RealFftTransform {
    pub fn new() -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            block_length: 0,
            r2c: planner.plan_fft_forward(0),
            c2r: planner.plan_fft_inverse(0),
            half: Vec::new(),
            r2c_scratch: Vec::new(),
            c2r_scratch: Vec::new(),
        }
    }

    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    fn check(&self, got: usize) -> Result<(), TransformError> {
        if self.block_length == 0 {
            return Err(TransformError::NotPrepared(got));
        }
        if got != self.block_length {
            return Err(TransformError::Length {
                expected: self.block_length,
                got,
            });
        }
        Ok(())
    }
}

impl SpectralTransform for RealFftTransform {
    fn prepare(&mut self, block_length: usize) -> Result<(), TransformError> {
        if block_length == self.block_length {
            return Ok(());
        }

        let mut planner = RealFftPlanner::<f32>::new();
        self.r2c = planner.plan_fft_forward(block_length);
        self.c2r = planner.plan_fft_inverse(block_length);
        self.r2c_scratch = self.r2c.make_scratch_vec();
        self.c2r_scratch = self.c2r.make_scratch_vec();
        self.half = self.r2c.make_output_vec();
        self.block_length = block_length;

        Ok(())
    }

    fn forward(
        &mut self,
        block: &mut [f32],
        spectrum: &mut [Complex<f32>],
    ) -> Result<(), TransformError> {
        self.check(block.len())?;
        self.check(spectrum.len())?;

        self.r2c
            .process_with_scratch(block, &mut self.half, &mut self.r2c_scratch)?;

        let n = self.block_length;
        let bins = self.half.len();
        spectrum[..bins].copy_from_slice(&self.half);
        for k in bins..n {
            spectrum[k] = self.half[n - k].conj();
        }

        Ok(())
    }

    fn inverse(
        &mut self,
        spectrum: &mut [Complex<f32>],
        block: &mut [f32],
    ) -> Result<(), TransformError> {
        self.check(block.len())?;
        self.check(spectrum.len())?;

        let n = self.block_length;
        let bins = self.half.len();
        self.half.copy_from_slice(&spectrum[..bins]);

        // DC and Nyquist must be real for the c2r transform
        self.half[0].im = 0.0;
        if n % 2 == 0
            && let Some(last) = self.half.last_mut()
        {
            last.im = 0.0;
        }

        self.c2r
            .process_with_scratch(&mut self.half, block, &mut self.c2r_scratch)?;

        let scale = 1.0 / n as f32;
        block.iter_mut().for_each(|sample| *sample *= scale);

        Ok(())
    }
}

/// Split a complex spectrum into separate real and imaginary arrays.
pub fn split_complex(spectrum: &[Complex<f32>], re: &mut [f32], im: &mut [f32]) {
    for ((bin, r), i) in spectrum.iter().zip(re.iter_mut()).zip(im.iter_mut()) {
        *r = bin.re;
        *i = bin.im;
    }
}

/// Interleave separate real and imaginary arrays into a complex spectrum.
pub fn join_complex(re: &[f32], im: &[f32], spectrum: &mut [Complex<f32>]) {
    for ((bin, &r), &i) in spectrum.iter_mut().zip(re).zip(im) {
        *bin = Complex::new(r, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(len: usize) -> RealFftTransform {
        let mut fft = RealFftTransform::new();
        fft.prepare(len).unwrap();
        fft
    }

    #[test]
    fn test_unit_impulse_is_flat() {
        let mut fft = prepared(8);
        let mut block = vec![0.0f32; 8];
        block[0] = 1.0;
        let mut spectrum = vec![Complex::new(0.0, 0.0); 8];

        fft.forward(&mut block, &mut spectrum).unwrap();

        for bin in &spectrum {
            assert!((bin.re - 1.0).abs() < 1e-6);
            assert!(bin.im.abs() < 1e-6);
        }
    }

    #[test]
    fn test_upper_half_is_conjugate_mirror() {
        let mut fft = prepared(6);
        let mut block = vec![0.3, -1.0, 0.25, 0.7, 0.0, 2.0];
        let mut spectrum = vec![Complex::new(0.0, 0.0); 6];

        fft.forward(&mut block, &mut spectrum).unwrap();

        for k in 1..6 {
            let mirror = spectrum[6 - k].conj();
            assert!((spectrum[k] - mirror).norm() < 1e-5, "bin {k}");
        }
    }

    #[test]
    fn test_inverse_restores_block() {
        let mut fft = prepared(16);
        let original: Vec<f32> = (0..16).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut block = original.clone();
        let mut spectrum = vec![Complex::new(0.0, 0.0); 16];
        let mut restored = vec![0.0f32; 16];

        fft.forward(&mut block, &mut spectrum).unwrap();
        fft.inverse(&mut spectrum, &mut restored).unwrap();

        for (a, b) in original.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rejects_wrong_length() {
        let mut fft = prepared(8);
        let mut block = vec![0.0f32; 4];
        let mut spectrum = vec![Complex::new(0.0, 0.0); 8];

        assert_eq!(
            fft.forward(&mut block, &mut spectrum),
            Err(TransformError::Length {
                expected: 8,
                got: 4
            })
        );
    }

    #[test]
    fn test_unprepared_transform_fails() {
        let mut fft = RealFftTransform::new();
        let mut block = vec![0.0f32; 4];
        let mut spectrum = vec![Complex::new(0.0, 0.0); 4];

        assert!(fft.forward(&mut block, &mut spectrum).is_err());
    }
}
