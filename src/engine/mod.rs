pub mod accumulate;
pub mod analysis;
pub mod history;
pub mod partition;

pub use analysis::AnalysisState;
pub use history::SpectralHistory;
pub use partition::{PartitionSet, partition_count};

use crossbeam::channel::{Receiver, Sender, bounded};
use log::{debug, error, warn};
use rustfft::num_complex::Complex;

use crate::error::{EngineError, EngineResult};
use crate::resource::{ImpulseSource, ResourceError};
use crate::transform::{RealFftTransform, SpectralTransform, join_complex, split_complex};
use analysis::Freshness;

/// Smallest block length the engine will process.
pub const MIN_BLOCK_LENGTH: usize = 4;

const MESSAGE_CAPACITY: usize = 64;

/// Control messages delivered to the engine between blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    Bind(String),
    Unbind,
    Reanalyze,
    Configure(usize),
}

/// Cloneable sender side for controlling an engine from another thread.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx_updates: Sender<EngineMessage>,
}

impl EngineHandle {
    pub fn bind(&self, name: impl Into<String>) {
        self.send(EngineMessage::Bind(name.into()));
    }

    pub fn unbind(&self) {
        self.send(EngineMessage::Unbind);
    }

    pub fn reanalyze(&self) {
        self.send(EngineMessage::Reanalyze);
    }

    pub fn configure(&self, block_length: usize) {
        self.send(EngineMessage::Configure(block_length));
    }

    fn send(&self, message: EngineMessage) {
        if let Err(e) = self.tx_updates.try_send(message) {
            warn!("Failed to send engine message: {e}");
        }
    }
}

/// Uniformly partitioned frequency-domain convolution of one channel.
///
/// Each call to [`process`](Self::process) takes one block of `B` spectral
/// bins and returns one block. Before accumulating, the engine checks whether
/// the bound impulse or the block length changed since the last analysis and
/// rebuilds its partitions inline if so. Without a usable impulse the input
/// is passed through unchanged.
pub struct ConvolutionEngine<T = RealFftTransform> {
    transform: T,
    block_length: usize,
    resource: Option<String>,

    partitions: PartitionSet,
    history: SpectralHistory,
    freshness: Freshness,

    // Private copies so callers may alias input and output
    input: Vec<Complex<f32>>,
    output: Vec<Complex<f32>>,

    last_fault: Option<ResourceError>,
    pending_fault: Option<ResourceError>,

    rx_updates: Receiver<EngineMessage>,
}

impl ConvolutionEngine {
    pub fn new(block_length: usize) -> (Self, EngineHandle) {
        Self::with_transform(RealFftTransform::new(), block_length)
    }
}

impl<T: SpectralTransform> ConvolutionEngine<T> {
    pub fn with_transform(transform: T, block_length: usize) -> (Self, EngineHandle) {
        let (tx_updates, rx_updates) = bounded(MESSAGE_CAPACITY);

        let engine = Self {
            transform,
            block_length,
            resource: None,
            partitions: PartitionSet::new(),
            history: SpectralHistory::new(),
            freshness: Freshness::new(),
            input: Vec::new(),
            output: Vec::new(),
            last_fault: None,
            pending_fault: None,
            rx_updates,
        };

        (engine, EngineHandle { tx_updates })
    }

    /// Associate the named impulse buffer. Analysis happens on the next block.
    pub fn bind(&mut self, name: impl Into<String>) {
        let name = name.into();
        debug!("Binding impulse resource '{name}'");
        self.resource = Some(name);
        self.last_fault = None;
        self.freshness.invalidate();
    }

    pub fn unbind(&mut self) {
        debug!("Unbinding impulse resource");
        self.resource = None;
        self.last_fault = None;
        self.freshness.invalidate();
    }

    /// Rebuild on the next block even if no length changed.
    pub fn reanalyze(&mut self) {
        self.freshness.invalidate();
    }

    /// Record a new block length; buffers follow on the next block.
    pub fn configure(&mut self, block_length: usize) {
        if block_length < MIN_BLOCK_LENGTH {
            warn!(
                "Block length {block_length} is below the minimum of {MIN_BLOCK_LENGTH}, processing will be refused"
            );
        } else if block_length != self.block_length {
            debug!(
                "Block length changed from {} to {block_length}",
                self.block_length
            );
        }
        self.block_length = block_length;
    }

    /// Convolve one spectral block from separate input to output buffers.
    pub fn process<S: ImpulseSource + ?Sized>(
        &mut self,
        source: &S,
        in_re: &[f32],
        in_im: &[f32],
        out_re: &mut [f32],
        out_im: &mut [f32],
    ) -> EngineResult<()> {
        self.handle_messages();

        let result = self
            .check_lengths(&[in_re.len(), in_im.len(), out_re.len(), out_im.len()])
            .and_then(|()| self.refresh(source));
        if let Err(e) = result {
            out_re.fill(0.0);
            out_im.fill(0.0);
            return Err(e);
        }

        join_complex(in_re, in_im, &mut self.input);
        self.convolve();
        split_complex(&self.output, out_re, out_im);

        Ok(())
    }

    /// Convolve one spectral block, replacing the contents of `re` and `im`.
    pub fn process_in_place<S: ImpulseSource + ?Sized>(
        &mut self,
        source: &S,
        re: &mut [f32],
        im: &mut [f32],
    ) -> EngineResult<()> {
        self.handle_messages();

        let result = self
            .check_lengths(&[re.len(), im.len()])
            .and_then(|()| self.refresh(source));
        if let Err(e) = result {
            re.fill(0.0);
            im.fill(0.0);
            return Err(e);
        }

        join_complex(re, im, &mut self.input);
        self.convolve();
        split_complex(&self.output, re, im);

        Ok(())
    }

    /// Apply pending [`EngineMessage`]s sent through an [`EngineHandle`].
    pub fn handle_messages(&mut self) {
        while let Ok(message) = self.rx_updates.try_recv() {
            match message {
                EngineMessage::Bind(name) => self.bind(name),
                EngineMessage::Unbind => self.unbind(),
                EngineMessage::Reanalyze => {
                    debug!("Reanalysis requested");
                    self.reanalyze();
                }
                EngineMessage::Configure(block_length) => self.configure(block_length),
            }
        }
    }

    /// The resource fault reported since the last call, if any. Each fault is
    /// reported once, however many blocks it persists for.
    pub fn take_fault(&mut self) -> Option<ResourceError> {
        self.pending_fault.take()
    }

    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub const fn analysis_state(&self) -> AnalysisState {
        self.freshness.state()
    }

    /// Number of partition rebuilds performed over the engine's lifetime.
    pub const fn rebuild_count(&self) -> u64 {
        self.freshness.rebuilds()
    }

    pub const fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    pub const fn history(&self) -> &SpectralHistory {
        &self.history
    }

    fn check_lengths(&self, lengths: &[usize]) -> EngineResult<()> {
        if self.block_length < MIN_BLOCK_LENGTH {
            return Err(EngineError::BlockLengthTooSmall {
                block_length: self.block_length,
                minimum: MIN_BLOCK_LENGTH,
            });
        }

        if let Some(&got) = lengths.iter().find(|&&len| len != self.block_length) {
            return Err(EngineError::BlockLengthMismatch {
                expected: self.block_length,
                got,
            });
        }

        Ok(())
    }

    /// Re-analysis check, run once per block before accumulating.
    fn refresh<S: ImpulseSource + ?Sized>(&mut self, source: &S) -> EngineResult<()> {
        let block_length = self.block_length;
        if self.input.len() != block_length {
            self.input.resize(block_length, Complex::new(0.0, 0.0));
            self.output.resize(block_length, Complex::new(0.0, 0.0));
        }

        let Some(name) = self.resource.as_deref() else {
            self.degrade(ResourceError::Unbound);
            return Ok(());
        };

        let impulse_length = match source.length(name) {
            Ok(len) => len,
            Err(e) => {
                self.degrade(e);
                return Ok(());
            }
        };

        if !self.freshness.needs_rebuild(impulse_length, block_length) {
            return Ok(());
        }

        let samples = match source.samples(name) {
            Ok(samples) => samples,
            Err(e) => {
                self.degrade(e);
                return Ok(());
            }
        };

        self.rebuild(samples, impulse_length, block_length)
    }

    fn rebuild(
        &mut self,
        impulse: &[f32],
        impulse_length: usize,
        block_length: usize,
    ) -> EngineResult<()> {
        self.freshness.begin();

        if let Err(e) = self.partitions.rebuild(
            &mut self.transform,
            impulse,
            impulse_length,
            block_length,
        ) {
            error!("Failed to analyze impulse, passing input through: {e}");
            self.partitions.clear();
            self.history.resize(0, block_length);
            self.freshness.fail(impulse_length, block_length);
            return Err(e.into());
        }

        self.history.resize(self.partitions.len(), block_length);
        self.freshness.complete(impulse_length, block_length);
        self.last_fault = None;

        debug!(
            "Analyzed impulse of {} samples into {} partitions of {} bins",
            impulse_length,
            self.partitions.len(),
            block_length
        );

        Ok(())
    }

    /// Fall back to passthrough until the resource is usable again.
    fn degrade(&mut self, fault: ResourceError) {
        if !self.partitions.is_empty() || !self.history.is_empty() {
            self.partitions.clear();
            self.history.resize(0, self.block_length);
        }
        self.freshness.reset();

        if self.last_fault.as_ref() != Some(&fault) {
            warn!("Impulse unavailable, passing input through: {fault}");
            self.pending_fault = Some(fault.clone());
            self.last_fault = Some(fault);
        }
    }

    fn convolve(&mut self) {
        self.history.admit(&self.input);
        if !accumulate::accumulate(&self.history, &self.partitions, &mut self.output) {
            self.output.copy_from_slice(&self.input);
        }
    }
}
