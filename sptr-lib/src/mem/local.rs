use core::{
    alloc::Layout,
    cell::Cell,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::trace;

use super::{
    field_layout::FieldLayout,
    global::{Global, GLOBAL},
    Dealloc, Manager,
};

/// A manager that keeps track of its live allocations.
///
/// Every block is prefixed with a pointer back to the `Local`, so deallocation
/// only needs the block address.
#[derive(Debug, Default)]
pub struct Local {
    count: AtomicUsize,
    size: AtomicUsize,
}

type Header = *const Local;

type HeaderLayout = FieldLayout<Header, u8>;

impl Local {
    fn layout(block_layout: Layout) -> (HeaderLayout, Layout) {
        let header_layout = HeaderLayout::align_to(block_layout.align());
        let layout = header_layout.layout(block_layout.size());
        (header_layout, layout)
    }
    /// Number of live allocations.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
    /// Total size of live allocations, headers included.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}

impl<'a> Dealloc for &'a Local {
    type Counter = Cell<isize>;
    unsafe fn dealloc(block_p: *mut u8, block_layout: Layout) {
        let (header_layout, layout) = Local::layout(block_layout);
        let p = header_layout.from_adjacent(block_p);
        {
            let local = &**p;
            local.count.fetch_sub(1, Ordering::Relaxed);
            local.size.fetch_sub(layout.size(), Ordering::Relaxed);
            trace!("local dealloc: size={} live={}", layout.size(), local.count());
        }
        Global::dealloc(p as *mut u8, layout);
    }
}

impl<'a> Manager for &'a Local {
    type Dealloc = Self;
    unsafe fn alloc(self, block_layout: Layout) -> *mut u8 {
        let (header_layout, layout) = Local::layout(block_layout);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.size.fetch_add(layout.size(), Ordering::Relaxed);
        trace!("local alloc: size={} live={}", layout.size(), self.count());
        let p = GLOBAL.alloc(layout) as *mut Header;
        p.write(self);
        header_layout.to_adjacent(p)
    }
}
