use core::ptr::NonNull;

use log::trace;

use crate::mem::{Counter, Dealloc, RefCounterUpdate};

/// Counters shared by every handle descended from one wrapped object.
///
/// Strong handles collectively hold one extra weak reference. It is released
/// right after the object is destroyed, so the block outlives the destructor
/// even when the object owns weak handles to itself. `weak_count` hides it.
pub(crate) struct ControlBlock<D: Dealloc> {
    strong: D::Counter,
    weak: D::Counter,
    destroy_object: unsafe fn(NonNull<ControlBlock<D>>),
    free: unsafe fn(NonNull<ControlBlock<D>>),
}

impl<D: Dealloc> ControlBlock<D> {
    /// A block with one strong reference.
    pub fn new(
        destroy_object: unsafe fn(NonNull<ControlBlock<D>>),
        free: unsafe fn(NonNull<ControlBlock<D>>),
    ) -> Self {
        let result = Self {
            strong: D::Counter::default(),
            weak: D::Counter::default(),
            destroy_object,
            free,
        };
        unsafe {
            result.strong.ref_counter_update(RefCounterUpdate::AddRef);
            result.weak.ref_counter_update(RefCounterUpdate::AddRef);
        }
        result
    }
    #[inline(always)]
    pub unsafe fn add_ref(this: NonNull<Self>) {
        this.as_ref().strong.ref_counter_update(RefCounterUpdate::AddRef);
    }
    /// Takes a strong reference only while the object is alive.
    #[inline(always)]
    pub unsafe fn try_add_ref(this: NonNull<Self>) -> bool {
        this.as_ref().strong.try_add_ref()
    }
    #[inline(always)]
    pub unsafe fn add_weak(this: NonNull<Self>) {
        this.as_ref().weak.ref_counter_update(RefCounterUpdate::AddRef);
    }
    /// Drops a strong reference. The last one destroys the object, marks it
    /// gone by taking the strong counter to -1, and then gives up the implicit
    /// weak reference.
    pub unsafe fn release(this: NonNull<Self>) {
        if this.as_ref().strong.ref_counter_update(RefCounterUpdate::Release) != 1 {
            return;
        }
        trace!("destroy object: block={:p}", this);
        let destroy_object = this.as_ref().destroy_object;
        destroy_object(this);
        this.as_ref().strong.ref_counter_update(RefCounterUpdate::Release);
        Self::release_weak(this);
    }
    /// Drops a weak reference. The last one frees the block.
    pub unsafe fn release_weak(this: NonNull<Self>) {
        if this.as_ref().weak.ref_counter_update(RefCounterUpdate::Release) != 1 {
            return;
        }
        trace!("free control block: block={:p}", this);
        let free = this.as_ref().free;
        free(this);
    }
    #[inline(always)]
    fn strong(&self) -> isize {
        unsafe { self.strong.ref_counter_update(RefCounterUpdate::Read) }
    }
    pub fn strong_count(&self) -> usize {
        self.strong().max(0) as usize
    }
    pub fn weak_count(&self) -> usize {
        let weak = unsafe { self.weak.ref_counter_update(RefCounterUpdate::Read) };
        // the implicit reference is held until the strong counter reaches -1
        let implicit = if self.strong() >= 0 { 1 } else { 0 };
        (weak - implicit).max(0) as usize
    }
}
