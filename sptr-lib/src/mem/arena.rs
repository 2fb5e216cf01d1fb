use core::{alloc::Layout, cell::Cell, marker::PhantomData};

use super::{Dealloc, Manager};

/// A bump allocator over a borrowed byte range. Memory is only reclaimed when
/// the arena itself goes away, but objects are still dropped on time.
#[derive(Debug)]
pub struct Arena<'a> {
    begin: *mut u8,
    current: Cell<usize>,
    len: usize,
    _0: PhantomData<&'a mut [u8]>,
}

#[inline(always)]
const fn align_to(v: usize, align: usize) -> usize {
    let mask = align - 1;
    (v + mask) & !mask
}

impl<'a> Arena<'a> {
    pub fn new(range: &'a mut [u8]) -> Self {
        Self {
            begin: range.as_mut_ptr(),
            current: Cell::new(0),
            len: range.len(),
            _0: PhantomData,
        }
    }
    /// Bytes left at the end of the range, ignoring alignment padding.
    pub fn remaining(&self) -> usize {
        self.len - self.current.get()
    }
}

impl<'a, 'b> Dealloc for &'b Arena<'a> {
    type Counter = Cell<isize>;
    #[inline(always)]
    unsafe fn dealloc(_: *mut u8, _: Layout) {}
}

impl<'a, 'b> Manager for &'b Arena<'a> {
    type Dealloc = Self;
    unsafe fn alloc(self, layout: Layout) -> *mut u8 {
        let base = self.begin as usize;
        let offset = align_to(base + self.current.get(), layout.align()) - base;
        let end = offset + layout.size();
        if end > self.len {
            panic!("out of memory");
        }
        self.current.set(end);
        self.begin.add(offset)
    }
}
