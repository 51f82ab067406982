use rustfft::num_complex::Complex;

/// Sliding window of the most recent input spectra, newest first.
///
/// Stored as a ring so admitting a block is a single copy; [`get`](Self::get)
/// translates logical age into a slot.
#[derive(Debug, Clone, Default)]
pub struct SpectralHistory {
    block_length: usize,
    slots: Vec<Vec<Complex<f32>>>,
    /// Slot holding the newest spectrum.
    head: usize,
}

impl SpectralHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to `depth` blocks of `block_length` bins and zero everything.
    /// Old contents are not kept: they were aligned for a different partition count.
    pub fn resize(&mut self, depth: usize, block_length: usize) {
        self.block_length = block_length;
        self.slots
            .resize_with(depth, || vec![Complex::new(0.0, 0.0); block_length]);
        for slot in &mut self.slots {
            slot.clear();
            slot.resize(block_length, Complex::new(0.0, 0.0));
        }
        self.head = 0;
    }

    /// Push `spectrum` in as age 0; the oldest entry falls off the end.
    pub fn admit(&mut self, spectrum: &[Complex<f32>]) {
        if self.slots.is_empty() {
            return;
        }

        self.head = if self.head == 0 {
            self.slots.len() - 1
        } else {
            self.head - 1
        };
        self.slots[self.head].copy_from_slice(spectrum);
    }

    /// The spectrum admitted `age` blocks ago.
    pub fn get(&self, age: usize) -> Option<&[Complex<f32>]> {
        if age >= self.slots.len() {
            return None;
        }
        let slot = (self.head + age) % self.slots.len();
        Some(&self.slots[slot])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    /// Spectra from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &[Complex<f32>]> {
        (0..self.slots.len()).filter_map(move |age| self.get(age))
    }
}
