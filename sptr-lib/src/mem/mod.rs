mod arena;
mod atomic_counter;
mod counter;
mod field_layout;
mod global;
mod local;
mod ref_counter_update;

use core::{alloc::Layout, ptr::NonNull};
use std::alloc::handle_alloc_error;

use crate::ptr::{Object, SharedPtr};

pub use self::{
    arena::Arena,
    atomic_counter::{AtomicCounter, SyncCounter},
    counter::Counter,
    global::{Global, SyncGlobal, GLOBAL, SYNC_GLOBAL},
    local::Local,
    ref_counter_update::RefCounterUpdate,
};

/// Releases memory. Implemented at the type level so that handles never carry
/// a manager instance around.
pub trait Dealloc {
    /// Counting policy of control blocks released through this type.
    type Counter: Counter;
    unsafe fn dealloc(ptr: *mut u8, layout: Layout);
}

/// Allocates memory that is later released through `Self::Dealloc`.
pub trait Manager: Copy {
    // required:
    type Dealloc: Dealloc;
    unsafe fn alloc(self, layout: Layout) -> *mut u8;
    // optional:
    /// Moves `value` into a new allocation. The result can be passed to
    /// `SharedPtr::from_raw` with the same manager.
    fn alloc_object<T>(self, value: T) -> NonNull<T> {
        let layout = Layout::new::<T>();
        unsafe {
            let Some(p) = NonNull::new(self.alloc(layout) as *mut T) else {
                handle_alloc_error(layout)
            };
            p.as_ptr().write(value);
            p
        }
    }
    /// Allocates `value` and wraps it into a new ownership tree.
    fn shared_new<T>(self, value: T) -> SharedPtr<T, Self::Dealloc> {
        SharedPtr::new(self, value)
    }
    /// Same as `shared_new`, and attaches the object's `SelfRef`.
    fn shared_object<T: Object<Self::Dealloc>>(self, value: T) -> SharedPtr<T, Self::Dealloc> {
        SharedPtr::new_object(self, value)
    }
}
