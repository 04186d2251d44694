//! Catalog refresh coordination.
//!
//! Re-parsing the document catalog is idempotent, so a refresh requested
//! while one is already running is simply skipped, not queued and not
//! cancelled. The two-state machine makes that explicit instead of
//! leaving it to ambient flags.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

/// Owns the refresh state. Held by whatever component drives catalog
/// scans; parsing itself is pure and needs none of this.
#[derive(Debug, Default)]
pub struct ScanCoordinator {
    state: ScanState,
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a scan. Returns `false` (a no-op) when one is
    /// already in flight.
    pub fn begin(&mut self) -> bool {
        match self.state {
            ScanState::Scanning => {
                debug!("scan already in progress, skipping");
                false
            }
            ScanState::Idle => {
                self.state = ScanState::Scanning;
                true
            }
        }
    }

    /// Mark the in-flight scan finished.
    pub fn finish(&mut self) {
        self.state = ScanState::Idle;
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    /// Run `scan` unless one is already in flight. Returns the scan's
    /// result, or `None` for the skipped case.
    pub fn run<T>(&mut self, scan: impl FnOnce() -> T) -> Option<T> {
        if !self.begin() {
            return None;
        }
        let result = scan();
        self.finish();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_transitions_to_scanning() {
        let mut coordinator = ScanCoordinator::new();
        assert!(!coordinator.is_scanning());
        assert!(coordinator.begin());
        assert!(coordinator.is_scanning());
    }

    #[test]
    fn second_begin_is_noop() {
        let mut coordinator = ScanCoordinator::new();
        assert!(coordinator.begin());
        assert!(!coordinator.begin());
        assert!(coordinator.is_scanning());
    }

    #[test]
    fn finish_allows_next_scan() {
        let mut coordinator = ScanCoordinator::new();
        assert!(coordinator.begin());
        coordinator.finish();
        assert!(!coordinator.is_scanning());
        assert!(coordinator.begin());
    }

    #[test]
    fn run_skips_reentrancy() {
        let mut coordinator = ScanCoordinator::new();
        assert!(coordinator.begin());
        assert_eq!(coordinator.run(|| 42), None);
        coordinator.finish();
        assert_eq!(coordinator.run(|| 42), Some(42));
        assert!(!coordinator.is_scanning());
    }
}
