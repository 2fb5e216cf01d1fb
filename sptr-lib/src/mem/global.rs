use core::{alloc::Layout, cell::Cell};
use std::alloc::{alloc, dealloc, handle_alloc_error};

use super::{atomic_counter::AtomicCounter, Dealloc, Manager};

/// The standard global allocator with single-threaded counters.
#[derive(Debug, Clone, Copy)]
pub struct Global();

pub const GLOBAL: Global = Global();

/// The standard global allocator with atomic counters. Handles created through
/// it can be sent to and shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct SyncGlobal();

pub const SYNC_GLOBAL: SyncGlobal = SyncGlobal();

#[inline(always)]
unsafe fn global_alloc(layout: Layout) -> *mut u8 {
    if layout.size() == 0 {
        // any aligned non-null address is a valid zero-sized allocation.
        return layout.align() as *mut u8;
    }
    let p = alloc(layout);
    if p.is_null() {
        handle_alloc_error(layout)
    }
    p
}

#[inline(always)]
unsafe fn global_dealloc(ptr: *mut u8, layout: Layout) {
    if layout.size() != 0 {
        dealloc(ptr, layout)
    }
}

impl Dealloc for Global {
    type Counter = Cell<isize>;
    #[inline(always)]
    unsafe fn dealloc(ptr: *mut u8, layout: Layout) {
        global_dealloc(ptr, layout)
    }
}

impl Manager for Global {
    type Dealloc = Global;
    #[inline(always)]
    unsafe fn alloc(self, layout: Layout) -> *mut u8 {
        global_alloc(layout)
    }
}

impl Dealloc for SyncGlobal {
    type Counter = AtomicCounter;
    #[inline(always)]
    unsafe fn dealloc(ptr: *mut u8, layout: Layout) {
        global_dealloc(ptr, layout)
    }
}

impl Manager for SyncGlobal {
    type Dealloc = SyncGlobal;
    #[inline(always)]
    unsafe fn alloc(self, layout: Layout) -> *mut u8 {
        global_alloc(layout)
    }
}
