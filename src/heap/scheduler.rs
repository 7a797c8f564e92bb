use std::collections::HashMap;

use tokio::task::JoinHandle;

/// Lifecycle of a hot entry. `Deleted` has no variant: a deleted entry is
/// simply absent from the hot store.
///
/// `PendingDeletion` is entered when an entry's timer fires and left again
/// (back to `Active`) when `before_delete` vetoes the eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryLifecycle {
    Active,
    PendingDeletion,
}

/// Tagged map from id to the cancellable deferred-deletion task for that id.
///
/// Invariant: at most one live timer per id. Arming replaces (and aborts) any
/// prior task under the heap lock, so cancel-then-arm is atomic relative to
/// other activity on the same id.
#[derive(Default)]
pub(crate) struct EvictionScheduler {
    timers: HashMap<String, JoinHandle<()>>,
}

impl EvictionScheduler {
    /// Cancels the previous timer for `id`, if any, and installs `handle`.
    pub fn arm(&mut self, id: impl Into<String>, handle: JoinHandle<()>) {
        let id = id.into();
        log::debug!("arming eviction timer for '{}'", id);
        if let Some(previous) = self.timers.insert(id, handle) {
            previous.abort();
        }
    }

    /// Drops the bookkeeping entry for a timer that has fired.
    pub fn consume(&mut self, id: &str) {
        self.timers.remove(id);
    }

    pub fn armed(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, sleep};

    #[test]
    fn arm_replaces_and_aborts_previous_timer() {
        tokio_test::block_on(async {
            let fired = Arc::new(AtomicUsize::new(0));
            let mut scheduler = EvictionScheduler::default();

            let first_fired = fired.clone();
            scheduler.arm(
                "a",
                tokio::spawn(async move {
                    sleep(Duration::from_millis(20)).await;
                    first_fired.fetch_add(1, Ordering::SeqCst);
                }),
            );

            let second_fired = fired.clone();
            scheduler.arm(
                "a",
                tokio::spawn(async move {
                    sleep(Duration::from_millis(40)).await;
                    second_fired.fetch_add(1, Ordering::SeqCst);
                }),
            );
            assert_eq!(scheduler.armed(), 1);

            sleep(Duration::from_millis(120)).await;
            assert_eq!(fired.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn consume_forgets_a_fired_timer() {
        tokio_test::block_on(async {
            let mut scheduler = EvictionScheduler::default();
            scheduler.arm("a", tokio::spawn(async {}));
            scheduler.arm("b", tokio::spawn(async {}));
            assert_eq!(scheduler.armed(), 2);

            scheduler.consume("a");
            assert_eq!(scheduler.armed(), 1);
            scheduler.consume("a");
            assert_eq!(scheduler.armed(), 1);
        });
    }
}
