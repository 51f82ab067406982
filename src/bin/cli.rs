use anyhow::{Context, Result, bail};
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{info, warn};
use rustfft::num_complex::Complex;
use spectral_convolver::ir::{IrLoader, read_mono};
use spectral_convolver::settings::Settings;
use spectral_convolver::transform::{join_complex, split_complex};
use spectral_convolver::{BufferTable, ConvolutionEngine, RealFftTransform, SpectralTransform};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "spectral-convolver")]
#[command(version)]
#[command(
    about = "Runs a WAV file block by block through the partitioned spectral convolver (no overlap-add)."
)]
struct Args {
    #[arg(long, help = "Input WAV file")]
    input: PathBuf,
    #[arg(long, help = "Output WAV file")]
    output: PathBuf,
    #[arg(long, help = "Impulse response name, relative to the IR directory")]
    ir: Option<String>,
    #[arg(long, env = "IR_DIR", help = "Directory to scan for impulse responses")]
    ir_dir: Option<String>,
    #[arg(long, help = "Spectral bins per block")]
    block_length: Option<usize>,
    #[arg(long, help = "Settings file to use instead of the user config")]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("spectral-convolver v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {:?}", args);

    let mut settings = match &args.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load().context("failed to load settings")?,
    };
    if let Some(ir_dir) = args.ir_dir.clone() {
        settings.ir_dir = ir_dir;
    }
    if let Some(block_length) = args.block_length {
        settings.block_length = block_length;
    }
    if args.ir.is_some() {
        settings.impulse.clone_from(&args.ir);
    }
    info!("Settings:\n{settings}");

    convolve_file(&settings, &args.input, &args.output)
}

fn convolve_file(settings: &Settings, input: &Path, output: &Path) -> Result<()> {
    let reader = WavReader::open(input)
        .with_context(|| format!("failed to open input '{}'", input.display()))?;
    let spec = reader.spec();
    let samples = read_mono(reader)?;

    let mut table = BufferTable::new();
    let (mut engine, _) = ConvolutionEngine::new(settings.block_length);
    if let Some(name) = settings.impulse.as_deref() {
        let loader = IrLoader::new(Path::new(&settings.ir_dir), spec.sample_rate as usize)?;
        loader.load_into(&mut table, name)?;
        engine.bind(name);
    }

    let block_length = settings.block_length;
    if block_length < spectral_convolver::MIN_BLOCK_LENGTH {
        bail!("block length {block_length} is too small");
    }

    let mut fft = RealFftTransform::new();
    fft.prepare(block_length)?;

    let mut time = vec![0.0f32; block_length];
    let mut spectrum = vec![Complex::new(0.0, 0.0); block_length];
    let mut re = vec![0.0f32; block_length];
    let mut im = vec![0.0f32; block_length];

    let out_spec = WavSpec {
        channels: 1,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, out_spec)
        .with_context(|| format!("failed to create output '{}'", output.display()))?;

    for chunk in samples.chunks(block_length) {
        time[..chunk.len()].copy_from_slice(chunk);
        time[chunk.len()..].fill(0.0);

        fft.forward(&mut time, &mut spectrum)?;
        split_complex(&spectrum, &mut re, &mut im);

        engine.process_in_place(&table, &mut re, &mut im)?;
        if let Some(fault) = engine.take_fault() {
            warn!("Passing audio through unfiltered: {fault}");
        }

        join_complex(&re, &im, &mut spectrum);
        fft.inverse(&mut spectrum, &mut time)?;

        for &sample in &time[..chunk.len()] {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize().context("failed to finalize output")?;
    info!(
        "Wrote {} samples to {} using {} partitions",
        samples.len(),
        output.display(),
        engine.partition_count()
    );

    Ok(())
}
