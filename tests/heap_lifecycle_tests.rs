use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rustmemheap::{HeapHandler, HeapItem, HeapItemState};
use serde_json::json;
use tokio::time::{Duration, sleep};

struct Counter {
    count: i64,
}

impl HeapItem for Counter {
    fn type_name(&self) -> &'static str {
        "Counter"
    }

    fn save_state(&self) -> HeapItemState {
        json!({ "count": self.count })
    }

    fn load_state(&mut self, state: HeapItemState) -> bool {
        match state.get("count").and_then(|v| v.as_i64()) {
            Some(count) => {
                self.count = count;
                true
            }
            None => false,
        }
    }
}

/// Vetoes deletion while `refusals` lasts, counting every ask.
struct Stubborn {
    refusals: usize,
    asked: Arc<AtomicUsize>,
}

impl HeapItem for Stubborn {
    fn type_name(&self) -> &'static str {
        "Stubborn"
    }

    fn save_state(&self) -> HeapItemState {
        json!({ "refusals": self.refusals })
    }

    fn load_state(&mut self, state: HeapItemState) -> bool {
        match state.get("refusals").and_then(|v| v.as_u64()) {
            Some(refusals) => {
                self.refusals = refusals as usize;
                true
            }
            None => false,
        }
    }

    fn before_delete(&mut self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        if self.refusals > 0 {
            self.refusals -= 1;
            false
        } else {
            true
        }
    }
}

#[tokio::test]
async fn entry_expires_after_inactivity() {
    let heap = HeapHandler::in_memory(100);
    heap.insert_into_heap("a", Counter { count: 1 }).unwrap();
    assert!(heap.has_instance("a"));
    assert_eq!(heap.stats().armed_timers, 1);

    sleep(Duration::from_millis(400)).await;

    assert!(!heap.has_instance("a"));
    assert!(heap.get_from_heap("a").unwrap().is_none());
    let stats = heap.stats();
    assert_eq!(stats.hot_entries, 0);
    assert_eq!(stats.armed_timers, 0);
}

#[tokio::test]
async fn activity_resets_the_eviction_timer() {
    let heap = HeapHandler::in_memory(400);
    heap.insert_into_heap("a", Counter { count: 1 }).unwrap();

    // past half the expiration, refresh the entry
    sleep(Duration::from_millis(200)).await;
    assert!(heap.mark_activity("a").unwrap());

    // beyond the original deadline but within the refreshed one
    sleep(Duration::from_millis(300)).await;
    assert!(heap.has_instance("a"));

    // well past the refreshed deadline
    sleep(Duration::from_millis(600)).await;
    assert!(!heap.has_instance("a"));
}

#[tokio::test]
async fn single_veto_survives_first_expiry_only() {
    let asked = Arc::new(AtomicUsize::new(0));
    let heap = HeapHandler::in_memory(100);
    heap.insert_into_heap(
        "s",
        Stubborn {
            refusals: 1,
            asked: asked.clone(),
        },
    )
    .unwrap();

    sleep(Duration::from_millis(500)).await;

    assert!(!heap.has_instance("s"));
    assert_eq!(asked.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn permanent_veto_extends_indefinitely() {
    let asked = Arc::new(AtomicUsize::new(0));
    let heap = HeapHandler::in_memory(100);
    heap.insert_into_heap(
        "s",
        Stubborn {
            refusals: usize::MAX,
            asked: asked.clone(),
        },
    )
    .unwrap();

    sleep(Duration::from_millis(450)).await;

    assert!(heap.has_instance("s"));
    assert!(asked.load(Ordering::SeqCst) >= 2);
    assert_eq!(heap.stats().armed_timers, 1);
}

#[tokio::test]
async fn dropping_the_handler_lets_timers_die() {
    let asked = Arc::new(AtomicUsize::new(0));
    let heap = HeapHandler::in_memory(100);
    heap.insert_into_heap(
        "s",
        Stubborn {
            refusals: 0,
            asked: asked.clone(),
        },
    )
    .unwrap();

    drop(heap);
    sleep(Duration::from_millis(300)).await;

    // the outstanding timer woke up, found the heap gone and exited
    assert_eq!(asked.load(Ordering::SeqCst), 0);
}
