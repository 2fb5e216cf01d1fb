use core::ptr::NonNull;

use crate::mem::Dealloc;

use super::control_block::ControlBlock;

/// An object pointer together with the control block that owns it.
///
/// Both handle kinds store `Option<Inner>`, so a handle either has both or
/// neither.
pub(crate) struct Inner<T: ?Sized, D: Dealloc> {
    pub ptr: NonNull<T>,
    pub block: NonNull<ControlBlock<D>>,
}

impl<T: ?Sized, D: Dealloc> Clone for Inner<T, D> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized, D: Dealloc> Copy for Inner<T, D> {}

impl<T: ?Sized, D: Dealloc> Inner<T, D> {
    #[inline(always)]
    pub fn block(&self) -> &ControlBlock<D> {
        unsafe { self.block.as_ref() }
    }
    /// Same control block, another view of the object.
    #[inline(always)]
    pub fn with_ptr<U: ?Sized>(self, ptr: NonNull<U>) -> Inner<U, D> {
        Inner {
            ptr,
            block: self.block,
        }
    }
}
