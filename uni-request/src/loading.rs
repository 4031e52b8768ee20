//! Loading indicator coordination
//!
//! Concurrent calls that opt into a loading indicator share a single visible
//! indicator: it is shown when the first one starts and hidden when the last
//! one settles. The title is whatever the first call asked for.

use std::sync::{Arc, Mutex};

use crate::utils::lock;

const LOG_TARGET: &str = "uni_request::loading";

/// Arguments of the platform's show-indicator primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingOptions {
    pub title: String,
    pub mask: bool,
}

/// Platform loading indicator. Both calls are fire-and-forget.
pub trait LoadingIndicator: Send + Sync {
    fn show(&self, options: &LoadingOptions);
    fn hide(&self);
}

/// Indicator that only reports transitions through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingIndicator;

impl LoadingIndicator for TracingIndicator {
    fn show(&self, options: &LoadingOptions) {
        tracing::info!(
            target: LOG_TARGET,
            title = %options.title,
            mask = options.mask,
            "show loading"
        );
    }

    fn hide(&self) {
        tracing::info!(target: LOG_TARGET, "hide loading");
    }
}

/// Reference-counts loading-enabled calls of one client.
pub struct LoadingCoordinator {
    indicator: Arc<dyn LoadingIndicator>,
    active: Mutex<usize>,
}

impl LoadingCoordinator {
    pub fn new(indicator: Arc<dyn LoadingIndicator>) -> Self {
        Self {
            indicator,
            active: Mutex::new(0),
        }
    }

    /// Count one more active call, showing the indicator on 0 → 1.
    pub fn acquire(&self, loading_text: &str) {
        // The indicator is driven under the lock so show/hide can never be
        // observed out of order by concurrent callers.
        let mut active = lock(&self.active);
        *active += 1;
        tracing::trace!(target: LOG_TARGET, active = *active, "loading acquired");
        if *active == 1 {
            self.indicator.show(&LoadingOptions {
                title: loading_text.to_string(),
                mask: true,
            });
        }
    }

    /// Count one fewer active call, hiding the indicator on 1 → 0.
    ///
    /// An unmatched release is ignored.
    pub fn release(&self) {
        let mut active = lock(&self.active);
        if *active == 0 {
            tracing::warn!(target: LOG_TARGET, "loading released without a matching acquire");
            return;
        }
        *active -= 1;
        tracing::trace!(target: LOG_TARGET, active = *active, "loading released");
        if *active == 0 {
            self.indicator.hide();
        }
    }

    /// Acquire, releasing again when the guard is dropped.
    pub fn guard(&self, loading_text: &str) -> LoadingGuard<'_> {
        self.acquire(loading_text);
        LoadingGuard { coordinator: self }
    }

    pub fn active_count(&self) -> usize {
        *lock(&self.active)
    }

    pub fn is_visible(&self) -> bool {
        self.active_count() > 0
    }
}

impl std::fmt::Debug for LoadingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingCoordinator")
            .field("active", &self.active_count())
            .finish()
    }
}

/// Releases its coordinator exactly once, on drop.
#[must_use = "dropping the guard releases the loading indicator"]
pub struct LoadingGuard<'a> {
    coordinator: &'a LoadingCoordinator,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingIndicator {
        shown: Mutex<Vec<LoadingOptions>>,
        hides: AtomicUsize,
    }

    impl LoadingIndicator for RecordingIndicator {
        fn show(&self, options: &LoadingOptions) {
            self.shown.lock().unwrap().push(options.clone());
        }

        fn hide(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator() -> (LoadingCoordinator, Arc<RecordingIndicator>) {
        let indicator = Arc::new(RecordingIndicator::default());
        (LoadingCoordinator::new(indicator.clone()), indicator)
    }

    #[test]
    fn shows_on_first_and_hides_on_last() {
        let (coordinator, indicator) = coordinator();

        coordinator.acquire("first");
        coordinator.acquire("second");
        assert!(coordinator.is_visible());
        assert_eq!(
            *indicator.shown.lock().unwrap(),
            vec![LoadingOptions {
                title: "first".into(),
                mask: true
            }]
        );

        coordinator.release();
        assert_eq!(indicator.hides.load(Ordering::SeqCst), 0);
        coordinator.release();
        assert_eq!(indicator.hides.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_visible());
    }

    #[test]
    fn shows_again_after_going_idle() {
        let (coordinator, indicator) = coordinator();
        coordinator.acquire("a");
        coordinator.release();
        coordinator.acquire("b");
        coordinator.release();
        assert_eq!(indicator.shown.lock().unwrap().len(), 2);
        assert_eq!(indicator.hides.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn unmatched_release_is_clamped() {
        let (coordinator, indicator) = coordinator();
        coordinator.release();
        assert_eq!(coordinator.active_count(), 0);
        assert_eq!(indicator.hides.load(Ordering::SeqCst), 0);
        assert!(logs_contain("loading released without a matching acquire"));
    }

    #[test]
    fn guard_releases_on_drop() {
        let (coordinator, indicator) = coordinator();
        {
            let _guard = coordinator.guard("loading");
            assert_eq!(coordinator.active_count(), 1);
        }
        assert_eq!(coordinator.active_count(), 0);
        assert_eq!(indicator.hides.load(Ordering::SeqCst), 1);
    }
}
