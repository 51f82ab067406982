use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rustfft::num_complex::Complex;
use spectral_convolver::engine::accumulate::complex_multiply_accumulate;
use spectral_convolver::{BufferTable, ConvolutionEngine};
use std::hint::black_box;

const BLOCK_LENGTH: usize = 512;
const SAMPLE_RATE: f32 = 48000.0;

fn synthetic_ir(length: usize) -> Vec<f32> {
    (0..length)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let decay = (-t * 3.0).exp();
            (440.0 * 2.0 * std::f32::consts::PI * t).sin() * decay
        })
        .collect()
}

fn build_engine(ir_length: usize) -> (ConvolutionEngine, BufferTable) {
    let mut table = BufferTable::new();
    table.insert_samples("ir", synthetic_ir(ir_length));

    let (mut engine, _) = ConvolutionEngine::new(BLOCK_LENGTH);
    engine.bind("ir");

    let mut re = vec![0.0f32; BLOCK_LENGTH];
    let mut im = vec![0.0f32; BLOCK_LENGTH];
    engine.process_in_place(&table, &mut re, &mut im).unwrap();

    (engine, table)
}

fn bench_engine_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine Process");

    for &len in &[1_000, 13_000, 34_000, 87_000] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let (mut engine, table) = build_engine(len);

            let in_re = vec![0.5f32; BLOCK_LENGTH];
            let in_im = vec![0.25f32; BLOCK_LENGTH];
            let mut out_re = vec![0.0f32; BLOCK_LENGTH];
            let mut out_im = vec![0.0f32; BLOCK_LENGTH];

            b.iter(|| {
                engine
                    .process(
                        &table,
                        black_box(&in_re),
                        black_box(&in_im),
                        black_box(&mut out_re),
                        black_box(&mut out_im),
                    )
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_reanalysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reanalysis");

    for &len in &[13_000, 87_000] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let (mut engine, table) = build_engine(len);
            let mut re = vec![0.5f32; BLOCK_LENGTH];
            let mut im = vec![0.0f32; BLOCK_LENGTH];

            b.iter(|| {
                engine.reanalyze();
                engine
                    .process_in_place(&table, black_box(&mut re), black_box(&mut im))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_accumulate_loop(c: &mut Criterion) {
    let num_partitions = 34;

    let history: Vec<Vec<Complex<f32>>> =
        vec![vec![Complex::new(0.5, 0.3); BLOCK_LENGTH]; num_partitions];
    let partitions: Vec<Vec<Complex<f32>>> =
        vec![vec![Complex::new(0.7, 0.2); BLOCK_LENGTH]; num_partitions];

    c.bench_function("Accumulate Loop", |b| {
        let mut accumulator = vec![Complex::new(0.0, 0.0); BLOCK_LENGTH];
        b.iter(|| {
            accumulator.fill(Complex::new(0.0, 0.0));
            for (x, h) in history.iter().zip(&partitions) {
                complex_multiply_accumulate(&mut accumulator, black_box(x), black_box(h));
            }
            black_box(&accumulator);
        });
    });
}

criterion_group!(
    benches,
    bench_engine_process,
    bench_reanalysis,
    bench_accumulate_loop
);
criterion_main!(benches);
