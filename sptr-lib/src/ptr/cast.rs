use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
    ops::Deref,
    ptr::NonNull,
};

use crate::mem::Dealloc;

use super::shared::SharedPtr;

/// A read-only view of `T`. `SharedPtr<Const<T>>` can't hand out `&mut T`
/// until `const_cast` removes the view.
#[repr(transparent)]
pub struct Const<T: ?Sized>(T);

impl<T: ?Sized> Const<T> {
    #[inline(always)]
    pub(crate) fn from_ptr(p: NonNull<T>) -> NonNull<Const<T>> {
        unsafe { NonNull::new_unchecked(p.as_ptr() as *mut Const<T>) }
    }
    #[inline(always)]
    pub(crate) fn to_ptr(p: NonNull<Const<T>>) -> NonNull<T> {
        unsafe { NonNull::new_unchecked(p.as_ptr() as *mut T) }
    }
}

impl<T: ?Sized> Deref for Const<T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + Debug> Debug for Const<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Const").field(&&self.0).finish()
    }
}

/// A conversion between pointer types that is known to be valid at compile
/// time, such as an upcast to a trait object or an unchecked downcast.
///
/// # Safety
///
/// `static_cast` must return a pointer into the same object.
pub unsafe trait StaticCast<U: ?Sized> {
    fn static_cast(p: NonNull<Self>) -> NonNull<U>;
}

/// A conversion checked against the runtime type of the object.
///
/// # Safety
///
/// A returned pointer must point into the same object and be valid as `U`.
pub unsafe trait DynamicCast<U: ?Sized> {
    /// # Safety
    ///
    /// `p` must point to a live object.
    unsafe fn dynamic_cast(p: NonNull<Self>) -> Option<NonNull<U>>;
}

unsafe impl<T: Any> StaticCast<dyn Any> for T {
    #[inline(always)]
    fn static_cast(p: NonNull<Self>) -> NonNull<dyn Any> {
        p
    }
}

unsafe impl<U: Any> DynamicCast<U> for dyn Any {
    #[inline(always)]
    unsafe fn dynamic_cast(p: NonNull<Self>) -> Option<NonNull<U>> {
        if p.as_ref().is::<U>() {
            Some(p.cast())
        } else {
            None
        }
    }
}

/// Declares a `StaticCast` between two types.
///
/// `static_cast!(Circle => dyn Shape)` declares an upcast. It compiles only
/// when `Circle` coerces to `dyn Shape`, so it can't reinterpret anything:
///
/// ```compile_fail
/// use sptr_lib::static_cast;
///
/// trait Shape {}
/// struct Circle(f64);
/// impl Shape for Circle {}
///
/// static_cast!(dyn Shape => Circle);
/// ```
///
/// `static_cast!(unsafe dyn Shape => Circle)` declares the unchecked way back.
/// The caller promises that every `dyn Shape` ever cast this way is a
/// `Circle`.
#[macro_export]
macro_rules! static_cast {
    (unsafe $from:ty => $to:ty) => {
        unsafe impl $crate::ptr::StaticCast<$to> for $from {
            #[inline(always)]
            fn static_cast(p: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$to> {
                unsafe { ::core::ptr::NonNull::new_unchecked(p.as_ptr() as *mut $to) }
            }
        }
    };
    ($from:ty => $to:ty) => {
        unsafe impl $crate::ptr::StaticCast<$to> for $from {
            #[inline(always)]
            fn static_cast(p: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$to> {
                p
            }
        }
    };
}

/// Shares `p` as `U`. Never fails.
pub fn static_pointer_cast<U, T, D>(p: &SharedPtr<T, D>) -> SharedPtr<U, D>
where
    U: ?Sized,
    T: ?Sized + StaticCast<U>,
    D: Dealloc,
{
    p.static_cast()
}

/// Shares `p` without its read-only view. Never fails.
pub fn const_pointer_cast<T: ?Sized, D: Dealloc>(p: &SharedPtr<Const<T>, D>) -> SharedPtr<T, D> {
    p.const_cast()
}

/// Shares `p` as `U` if the object's runtime type allows it. Otherwise returns
/// an empty handle and leaves the counters of `p` alone.
pub fn dynamic_pointer_cast<U, T, D>(p: &SharedPtr<T, D>) -> SharedPtr<U, D>
where
    U: ?Sized,
    T: ?Sized + DynamicCast<U>,
    D: Dealloc,
{
    p.dynamic_cast()
}
