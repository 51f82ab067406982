/// Whether the partition set matches the impulse and block length in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisState {
    /// Partitions must be rebuilt before the next accumulation.
    #[default]
    Stale,
    /// A rebuild is in progress.
    Analyzing,
    /// Partitions and history match the recorded lengths.
    Fresh,
    /// The last rebuild failed for the recorded lengths. Not retried until a
    /// length changes or the state is invalidated.
    Failed,
}

/// Analysis freshness plus the lengths the last rebuild was done for.
#[derive(Debug, Clone, Default)]
pub struct Freshness {
    state: AnalysisState,
    impulse_length: Option<usize>,
    block_length: Option<usize>,
    rebuilds: u64,
}

impl Freshness {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> AnalysisState {
        self.state
    }

    pub const fn is_fresh(&self) -> bool {
        matches!(self.state, AnalysisState::Fresh)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self.state, AnalysisState::Failed)
    }

    /// Lengths of the last rebuild attempt that completed or failed, if any.
    pub const fn analyzed_lengths(&self) -> Option<(usize, usize)> {
        match (self.impulse_length, self.block_length) {
            (Some(impulse), Some(block)) => Some((impulse, block)),
            _ => None,
        }
    }

    /// Number of rebuilds completed so far.
    pub const fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// True when a rebuild is required before accumulating with the given lengths.
    pub fn needs_rebuild(&self, impulse_length: usize, block_length: usize) -> bool {
        !matches!(self.state, AnalysisState::Fresh | AnalysisState::Failed)
            || self.impulse_length != Some(impulse_length)
            || self.block_length != Some(block_length)
    }

    /// Force a rebuild on the next check, keeping the recorded lengths.
    pub fn invalidate(&mut self) {
        self.state = AnalysisState::Stale;
    }

    /// Forget the recorded lengths as well, e.g. when the resource disappeared.
    pub fn reset(&mut self) {
        self.state = AnalysisState::Stale;
        self.impulse_length = None;
        self.block_length = None;
    }

    pub fn begin(&mut self) {
        self.state = AnalysisState::Analyzing;
    }

    pub fn complete(&mut self, impulse_length: usize, block_length: usize) {
        debug_assert_eq!(self.state, AnalysisState::Analyzing);
        self.impulse_length = Some(impulse_length);
        self.block_length = Some(block_length);
        self.state = AnalysisState::Fresh;
        self.rebuilds += 1;
    }

    /// A rebuild failed part way; nothing it produced may be used. The lengths
    /// are kept so the same attempt is not repeated every block.
    pub fn fail(&mut self, impulse_length: usize, block_length: usize) {
        debug_assert_eq!(self.state, AnalysisState::Analyzing);
        self.impulse_length = Some(impulse_length);
        self.block_length = Some(block_length);
        self.state = AnalysisState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stale() {
        let freshness = Freshness::new();
        assert_eq!(freshness.state(), AnalysisState::Stale);
        assert!(freshness.needs_rebuild(0, 4));
        assert_eq!(freshness.analyzed_lengths(), None);
    }

    #[test]
    fn test_complete_makes_fresh() {
        let mut freshness = Freshness::new();
        freshness.begin();
        assert_eq!(freshness.state(), AnalysisState::Analyzing);
        freshness.complete(100, 16);

        assert!(freshness.is_fresh());
        assert!(!freshness.needs_rebuild(100, 16));
        assert_eq!(freshness.analyzed_lengths(), Some((100, 16)));
        assert_eq!(freshness.rebuilds(), 1);
    }

    #[test]
    fn test_length_changes_need_rebuild() {
        let mut freshness = Freshness::new();
        freshness.begin();
        freshness.complete(100, 16);

        assert!(freshness.needs_rebuild(101, 16));
        assert!(freshness.needs_rebuild(100, 32));
    }

    #[test]
    fn test_invalidate_keeps_lengths() {
        let mut freshness = Freshness::new();
        freshness.begin();
        freshness.complete(100, 16);
        freshness.invalidate();

        assert!(freshness.needs_rebuild(100, 16));
        assert_eq!(freshness.analyzed_lengths(), Some((100, 16)));
    }

    #[test]
    fn test_failure_is_latched_for_its_lengths() {
        let mut freshness = Freshness::new();
        freshness.begin();
        freshness.complete(100, 16);
        freshness.begin();
        freshness.fail(200, 16);

        assert_eq!(freshness.state(), AnalysisState::Failed);
        assert!(!freshness.is_fresh());
        assert!(!freshness.needs_rebuild(200, 16));
        assert!(freshness.needs_rebuild(201, 16));
        assert!(freshness.needs_rebuild(200, 32));
        assert_eq!(freshness.rebuilds(), 1);

        freshness.invalidate();
        assert!(freshness.needs_rebuild(200, 16));
    }

    #[test]
    fn test_reset_forgets_lengths() {
        let mut freshness = Freshness::new();
        freshness.begin();
        freshness.complete(100, 16);
        freshness.reset();

        assert_eq!(freshness.state(), AnalysisState::Stale);
        assert_eq!(freshness.analyzed_lengths(), None);
        assert!(freshness.needs_rebuild(100, 16));
    }
}
