//! Optimistic concurrency expectations.

/// Optimistic concurrency expectation for a versioned value.
///
/// Inventory store keys carry a write version; a watched key is recorded as
/// `Exact(version_at_watch)` and checked again at commit time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the value to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
