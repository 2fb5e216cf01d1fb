use core::{alloc::Layout, marker::PhantomData, ptr::drop_in_place};

use crate::mem::Dealloc;

/// Destroys a managed object when its last strong handle goes away.
pub trait Delete<T> {
    unsafe fn delete(self, object: *mut T);
}

/// Drops the object in place and returns its memory to `D`.
pub struct DeallocDelete<D>(PhantomData<fn() -> D>);

impl<D> Default for DeallocDelete<D> {
    #[inline(always)]
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T, D: Dealloc> Delete<T> for DeallocDelete<D> {
    #[inline(always)]
    unsafe fn delete(self, object: *mut T) {
        drop_in_place(object);
        D::dealloc(object as *mut u8, Layout::new::<T>());
    }
}

/// A custom deleter.
impl<T, F: FnOnce(*mut T)> Delete<T> for F {
    #[inline(always)]
    unsafe fn delete(self, object: *mut T) {
        self(object)
    }
}

#[cfg(test)]
mod test {
    use core::cell::Cell;

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::mem::{Local, Manager};

    use super::{DeallocDelete, Delete};

    struct X<'a>(&'a Cell<i32>);

    impl Drop for X<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_dealloc() {
        let local = Local::default();
        let i = Cell::new(0);
        let p = local.alloc_object(X(&i));
        assert_eq!(local.count(), 1);
        unsafe { DeallocDelete::<&Local>::default().delete(p.as_ptr()) };
        assert_eq!(i.get(), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_closure() {
        let mut x = 5;
        let called = Cell::new(false);
        unsafe {
            (|p: *mut i32| {
                *p += 1;
                called.set(true);
            })
            .delete(&mut x as *mut i32)
        };
        assert!(called.get());
        assert_eq!(x, 6);
    }
}
