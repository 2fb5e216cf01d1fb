use core::{alloc::Layout, mem::ManuallyDrop, ptr::NonNull};

use log::trace;

use crate::mem::{Dealloc, Manager};

use super::{control_block::ControlBlock, delete::Delete};

/// The control block allocation: counters followed by everything needed to
/// destroy the object. Handles only see the `ControlBlock` prefix.
#[repr(C)]
pub(crate) struct Block<T, X, D: Dealloc> {
    header: ControlBlock<D>,
    object: *mut T,
    deleter: ManuallyDrop<X>,
}

impl<T, X: Delete<T>, D: Dealloc> Block<T, X, D> {
    /// Allocates a block with one strong reference to `object`.
    pub fn alloc<M: Manager<Dealloc = D>>(
        manager: M,
        object: *mut T,
        deleter: X,
    ) -> NonNull<ControlBlock<D>> {
        let p = manager.alloc_object(Self {
            header: ControlBlock::new(Self::destroy_object, Self::free),
            object,
            deleter: ManuallyDrop::new(deleter),
        });
        trace!("new control block: block={:p} object={:p}", p, object);
        p.cast()
    }
    /// Runs once, when the strong count reaches zero. The block itself stays.
    unsafe fn destroy_object(header: NonNull<ControlBlock<D>>) {
        let block = header.cast::<Self>().as_ptr();
        let deleter = ManuallyDrop::take(&mut (*block).deleter);
        deleter.delete((*block).object);
    }
    /// Runs once, after `destroy_object`, when the weak count reaches zero.
    unsafe fn free(header: NonNull<ControlBlock<D>>) {
        D::dealloc(header.as_ptr() as *mut u8, Layout::new::<Self>());
    }
}

#[cfg(test)]
mod test {
    use core::cell::Cell;

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::{
        mem::{Local, Manager},
        ptr::{control_block::ControlBlock, delete::DeallocDelete},
    };

    use super::Block;

    #[test]
    #[wasm_bindgen_test]
    fn test() {
        let local = Local::default();
        let object = local.alloc_object(7u32);
        let block = Block::alloc(&local, object.as_ptr(), DeallocDelete::<&Local>::default());
        assert_eq!(local.count(), 2);
        unsafe {
            ControlBlock::add_weak(block);
            ControlBlock::release(block);
            assert_eq!(local.count(), 1);
            ControlBlock::release_weak(block);
        }
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_custom_deleter() {
        let local = Local::default();
        let deleted = Cell::new(0);
        let mut value = 3;
        let block = Block::alloc(&local, &mut value as *mut i32, |p: *mut i32| {
            assert_eq!(unsafe { *p }, 3);
            deleted.set(deleted.get() + 1);
        });
        unsafe { ControlBlock::release(block) };
        assert_eq!(deleted.get(), 1);
        assert_eq!(local.count(), 0);
    }
}
