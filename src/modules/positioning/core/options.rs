use std::time::Duration;

/// Request options handed to the platform position source.
///
/// The two constructors carry different defaults: a one-shot read favours a fresh, cheap fix
/// while a watch favours accuracy and tolerates slightly stale fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// Enforced by the position source, not by the caller.
    pub timeout: Duration,
    /// Oldest cached fix the source may answer with. Zero rejects cached fixes.
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub const fn one_shot() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
        }
    }

    pub const fn watch() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(5_000),
            maximum_age: Duration::from_millis(1_000),
        }
    }
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::one_shot()
    }
}
