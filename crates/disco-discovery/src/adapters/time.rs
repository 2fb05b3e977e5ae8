use crate::domain::Timestamp;
use crate::ports::TimeSource;

// ============================================================================
// SystemTimeSource - Production Time Source
// ============================================================================

/// Production time source using the system clock.
///
/// For testing, use `FixedTimeSource` from the test utilities.
///
/// # Example
///
/// ```rust
/// use disco_discovery::adapters::SystemTimeSource;
/// use disco_discovery::ports::TimeSource;
///
/// let now = SystemTimeSource::new().now();
/// assert!(now.as_secs() > 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Timestamp::new(duration.as_secs())
    }
}
