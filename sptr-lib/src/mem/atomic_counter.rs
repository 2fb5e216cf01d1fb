use core::sync::atomic::{AtomicIsize, Ordering};

use super::{counter::Counter, ref_counter_update::RefCounterUpdate};

/// Counters that stay consistent when updated from several threads at once.
///
/// Handles whose control block uses such a counter are `Send` and `Sync`.
pub unsafe trait SyncCounter: Counter + Send + Sync {}

#[repr(transparent)]
#[derive(Debug, Default)]
pub struct AtomicCounter {
    counter: AtomicIsize,
}

impl Counter for AtomicCounter {
    #[inline(always)]
    unsafe fn ref_counter_update(&self, val: RefCounterUpdate) -> isize {
        match val {
            RefCounterUpdate::AddRef => self.counter.fetch_add(1, Ordering::Relaxed),
            RefCounterUpdate::Read => self.counter.load(Ordering::Acquire),
            // the thread that observes the last release must see every write made
            // through the other handles before it destroys anything.
            RefCounterUpdate::Release => self.counter.fetch_sub(1, Ordering::AcqRel),
        }
    }
    #[inline(always)]
    unsafe fn try_add_ref(&self) -> bool {
        self.counter
            .fetch_update(Ordering::Acquire, Ordering::Relaxed, |n| {
                if n > 0 {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

unsafe impl SyncCounter for AtomicCounter {}
