use anyhow::{Context, Result, anyhow};
use hound::WavReader;
use log::{debug, warn};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::resource::BufferTable;

const MAX_IR_LENGTH_SECONDS: u64 = 5;
const PEAK_LEVEL: f32 = 0.9;

/// Finds WAV impulse responses in a directory and loads them as mono sample
/// buffers at the target sample rate.
pub struct IrLoader {
    available_ir_paths: Vec<(String, PathBuf)>,
    ir_directory: PathBuf,
    target_sample_rate: usize,
}

impl IrLoader {
    pub fn new(directory: &Path, target_sample_rate: usize) -> Result<Self> {
        let mut loader = Self {
            available_ir_paths: Vec::new(),
            ir_directory: directory.to_path_buf(),
            target_sample_rate,
        };

        loader.scan_ir_directory()?;

        Ok(loader)
    }

    pub fn load_by_name(&self, name: &str) -> Result<Vec<f32>> {
        let (_, path) = self
            .available_ir_paths
            .iter()
            .find(|(ir_name, _)| ir_name == name)
            .ok_or_else(|| anyhow!("ir name '{}' not found", name))?;

        self.load_ir(path)
    }

    /// Load the named impulse and register it in `table` under the same name.
    pub fn load_into(&self, table: &mut BufferTable, name: &str) -> Result<usize> {
        let samples = self
            .load_by_name(name)
            .with_context(|| format!("failed to load impulse '{name}'"))?;
        let len = samples.len();
        table.insert_samples(name, samples);

        debug!("Registered impulse '{}' ({} samples)", name, len);
        Ok(len)
    }

    // available ir names returns a string list of impulse response names
    pub fn available_ir_names(&self) -> Vec<String> {
        self.available_ir_paths
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn load_ir(&self, path: &Path) -> Result<Vec<f32>> {
        let reader = WavReader::open(path).context("Failed to open WAV file")?;
        let spec = reader.spec();

        if reader.duration() as u64 > spec.sample_rate as u64 * MAX_IR_LENGTH_SECONDS {
            return Err(anyhow!(
                "Failed to load IR as the IR is too long: {} seconds (max {}).",
                reader.duration() as f64 / spec.sample_rate as f64,
                MAX_IR_LENGTH_SECONDS
            ));
        }

        let mono = read_mono(reader)?;

        let mut resampled = if spec.sample_rate != self.target_sample_rate as u32 {
            debug!(
                "Resampling IR from {} Hz to {} Hz",
                spec.sample_rate, self.target_sample_rate
            );
            resample(&mono, spec.sample_rate, self.target_sample_rate as u32)?
        } else {
            mono
        };

        normalize_peak(&mut resampled, PEAK_LEVEL);

        Ok(resampled)
    }

    pub fn scan_ir_directory(&mut self) -> Result<()> {
        if !self.ir_directory.exists() {
            fs::create_dir_all(&self.ir_directory).context("Failed to create IR directory")?;
            warn!("IR directory created at {:?}", self.ir_directory);
            return Ok(());
        }

        self.available_ir_paths.clear();
        let base = self.ir_directory.clone();
        self.scan_recursive(&base, &base)?;

        self.available_ir_paths.sort_by(|a, b| {
            let a_sep_count = a.0.matches('/').count();
            let b_sep_count = b.0.matches('/').count();
            a_sep_count.cmp(&b_sep_count).then_with(|| a.0.cmp(&b.0))
        });

        debug!(
            "Found {} impulse response files",
            self.available_ir_paths.len()
        );
        Ok(())
    }

    fn scan_recursive(&mut self, current_dir: &Path, base_dir: &Path) -> Result<()> {
        for entry in fs::read_dir(current_dir)? {
            let path = entry?.path();

            if path.is_dir() {
                self.scan_recursive(&path, base_dir)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("wav") {
                let relative_path = path
                    .strip_prefix(base_dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");

                self.available_ir_paths.push((relative_path, path));
            }
        }
        Ok(())
    }
}

/// Decode every frame of `reader` to `f32` and average the channels down to mono.
///
/// Integer formats are scaled by their bit depth into `[-1, 1)`.
pub fn read_mono<R: Read>(reader: WavReader<R>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    let samples: Vec<f32> = if spec.sample_format == hound::SampleFormat::Float {
        reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read float samples")?
    } else {
        let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / max_val))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read integer samples")?
    };

    Ok(fold_to_mono(samples, spec.channels as usize))
}

fn fold_to_mono(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }

    samples
        .chunks(channels)
        .map(|c| c.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn normalize_peak(samples: &mut [f32], level: f32) {
    let peak = samples.iter().fold(0.0f32, |m, &x| m.max(x.abs()));
    if peak > 0.0 {
        let g = level / peak;
        for s in samples.iter_mut() {
            *s *= g;
        }
    }
}

/// resample takes input samples at a given sample_rate and returns them in the target sample_rate
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)?;

    let input = vec![samples.to_vec()];
    let output = resampler.process(&input, None)?;

    output
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Resampling failed"))
}
