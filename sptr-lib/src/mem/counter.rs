use core::cell::Cell;

use super::ref_counter_update::RefCounterUpdate;

/// A reference counter. `Default` starts at zero.
///
/// The counting policy of a control block is chosen by `Dealloc::Counter`, so
/// single-threaded and thread-safe handles never mix.
pub trait Counter: Default {
    // required
    /// Applies `i` and returns the value the counter had before the update.
    unsafe fn ref_counter_update(&self, i: RefCounterUpdate) -> isize;
    /// Increments the counter only if it is positive. Returns `true` on success.
    unsafe fn try_add_ref(&self) -> bool;
}

/// Plain counter without synchronization.
impl Counter for Cell<isize> {
    #[inline(always)]
    unsafe fn ref_counter_update(&self, val: RefCounterUpdate) -> isize {
        let result = self.get();
        self.set(result + val as isize);
        result
    }
    #[inline(always)]
    unsafe fn try_add_ref(&self) -> bool {
        let result = self.get();
        if result <= 0 {
            return false;
        }
        self.set(result + 1);
        true
    }
}
