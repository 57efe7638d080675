/// Counts discrete changes to a piece of state.
///
/// Consumers remember the last version they observed and compare against
/// [`ChangeTracker::version`] to decide whether cached derived data (a
/// compiled shader program, an uploaded buffer) is still valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { version: 0 }
    }

    /// Records one change.
    pub fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Current version number.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
