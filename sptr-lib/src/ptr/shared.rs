use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem::forget,
    ops::Deref,
    ptr::NonNull,
};

use crate::mem::{Dealloc, Global, Manager, SyncCounter};

use super::{
    block::Block,
    cast::{Const, DynamicCast, StaticCast},
    control_block::ControlBlock,
    delete::{DeallocDelete, Delete},
    inner::Inner,
    object::Object,
    weak::WeakPtr,
};

/// An owning handle. The object lives while at least one `SharedPtr` to it
/// exists; the control block lives while any `SharedPtr` or `WeakPtr` does.
///
/// A handle is either empty or owning. The only way to get an owning handle
/// from nothing is `new`/`from_raw`; everything else shares an existing
/// control block.
pub struct SharedPtr<T: ?Sized, D: Dealloc = Global> {
    inner: Option<Inner<T, D>>,
    _0: PhantomData<T>,
}

impl<T: ?Sized, D: Dealloc> SharedPtr<T, D> {
    /// Adopts `inner` without touching the counters. The caller hands over a
    /// strong reference that is already counted.
    #[inline(always)]
    pub(crate) const unsafe fn from_inner(inner: Option<Inner<T, D>>) -> Self {
        Self {
            inner,
            _0: PhantomData,
        }
    }
    #[inline(always)]
    pub(crate) fn inner(&self) -> Option<Inner<T, D>> {
        self.inner
    }
    /// A new handle for `inner`, taking a strong reference.
    #[inline(always)]
    fn share(inner: Option<Inner<T, D>>) -> Self {
        if let Some(inner) = inner {
            unsafe { ControlBlock::add_ref(inner.block) };
        }
        unsafe { Self::from_inner(inner) }
    }
    /// Gives up the handle without releasing its strong reference.
    #[inline(always)]
    fn into_inner(self) -> Option<Inner<T, D>> {
        let result = self.inner;
        forget(self);
        result
    }
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }
    /// The object, or `None` for an empty handle.
    #[inline(always)]
    pub fn get(&self) -> Option<&T> {
        self.inner.map(|inner| unsafe { &*inner.ptr.as_ptr() })
    }
    /// The raw object pointer. Ownership stays with the handle.
    #[inline(always)]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.inner.map(|inner| inner.ptr)
    }
    /// Mutable access while this is the only handle of any kind.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let inner = self.inner?;
        let block = inner.block();
        if block.strong_count() == 1 && block.weak_count() == 0 {
            Some(unsafe { &mut *inner.ptr.as_ptr() })
        } else {
            None
        }
    }
    pub fn strong_count(&self) -> usize {
        self.inner.map_or(0, |inner| inner.block().strong_count())
    }
    pub fn weak_count(&self) -> usize {
        self.inner.map_or(0, |inner| inner.block().weak_count())
    }
    /// `true` if both handles share one control block, or both are empty.
    pub fn ptr_eq<U: ?Sized>(&self, other: &SharedPtr<U, D>) -> bool {
        self.inner.map(|inner| inner.block) == other.inner.map(|inner| inner.block)
    }
    #[inline(always)]
    pub fn downgrade(&self) -> WeakPtr<T, D> {
        WeakPtr::from(self)
    }
    /// A weak handle that observes the object as a related type.
    pub fn downgrade_as<U: ?Sized>(&self) -> WeakPtr<U, D>
    where
        T: StaticCast<U>,
    {
        WeakPtr::observe(
            self.inner
                .map(|inner| inner.with_ptr(T::static_cast(inner.ptr))),
        )
    }
    /// Releases the object and leaves the handle empty.
    #[inline(always)]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
    /// Shares the object as a related type. Never fails.
    pub fn static_cast<U: ?Sized>(&self) -> SharedPtr<U, D>
    where
        T: StaticCast<U>,
    {
        SharedPtr::share(
            self.inner
                .map(|inner| inner.with_ptr(T::static_cast(inner.ptr))),
        )
    }
    /// Shares the object as `U` if its runtime type allows it. On failure the
    /// result is empty and the counters stay as they are.
    pub fn dynamic_cast<U: ?Sized>(&self) -> SharedPtr<U, D>
    where
        T: DynamicCast<U>,
    {
        SharedPtr::share(self.inner.and_then(|inner| {
            unsafe { T::dynamic_cast(inner.ptr) }.map(|ptr| inner.with_ptr(ptr))
        }))
    }
    /// Shares the object through a read-only view.
    pub fn to_const(&self) -> SharedPtr<Const<T>, D> {
        SharedPtr::share(self.inner.map(|inner| inner.with_ptr(Const::from_ptr(inner.ptr))))
    }
    /// Same as `to_const` but reuses this handle's strong reference.
    pub fn into_const(self) -> SharedPtr<Const<T>, D> {
        let inner = self
            .into_inner()
            .map(|inner| inner.with_ptr(Const::from_ptr(inner.ptr)));
        unsafe { SharedPtr::from_inner(inner) }
    }
}

impl<T: ?Sized, D: Dealloc> SharedPtr<Const<T>, D> {
    /// Removes the read-only view.
    pub fn const_cast(&self) -> SharedPtr<T, D> {
        SharedPtr::share(self.inner.map(|inner| inner.with_ptr(Const::to_ptr(inner.ptr))))
    }
}

impl<T, D: Dealloc> SharedPtr<T, D> {
    /// Moves `value` into memory from `manager` and starts a new ownership
    /// tree with one strong reference.
    pub fn new<M: Manager<Dealloc = D>>(manager: M, value: T) -> Self {
        let object = manager.alloc_object(value);
        unsafe { Self::wrap(manager, object.as_ptr(), DeallocDelete::<D>::default()) }
    }
    /// Starts a new ownership tree for `p`. A null `p` gives an empty handle and
    /// allocates nothing.
    ///
    /// # Safety
    ///
    /// `p` must be null or point to a live `T` allocated through a manager
    /// with the same `Dealloc` and `Layout::new::<T>()`. Nothing else may own
    /// `p`: wrapping one pointer twice creates two independent trees that both
    /// destroy the object.
    pub unsafe fn from_raw<M: Manager<Dealloc = D>>(manager: M, p: *mut T) -> Self {
        Self::wrap(manager, p, DeallocDelete::<D>::default())
    }
    /// Like `from_raw`, but the object is destroyed by calling `deleter`
    /// instead of being dropped and returned to `D`. The deleter runs exactly
    /// once. If `p` is null, it never runs.
    ///
    /// # Safety
    ///
    /// `p` must be null or point to a live `T` that `deleter` knows how to
    /// destroy, and nothing else may own it.
    pub unsafe fn from_raw_with_deleter<M, X>(manager: M, p: *mut T, deleter: X) -> Self
    where
        M: Manager<Dealloc = D>,
        X: FnOnce(*mut T) + Send + 'static,
    {
        Self::wrap(manager, p, deleter)
    }
    unsafe fn wrap<M, X>(manager: M, p: *mut T, deleter: X) -> Self
    where
        M: Manager<Dealloc = D>,
        X: Delete<T>,
    {
        let Some(ptr) = NonNull::new(p) else {
            return Self::default();
        };
        let block = Block::alloc(manager, p, deleter);
        Self::from_inner(Some(Inner { ptr, block }))
    }
    /// Releases the current object and owns a fresh `value` instead.
    pub fn reset_with<M: Manager<Dealloc = D>>(&mut self, manager: M, value: T) {
        self.reset();
        *self = Self::new(manager, value);
    }
    /// Releases the current object and wraps `p` instead.
    ///
    /// # Safety
    ///
    /// Same as `from_raw`.
    pub unsafe fn reset_raw<M: Manager<Dealloc = D>>(&mut self, manager: M, p: *mut T) {
        self.reset();
        *self = Self::from_raw(manager, p);
    }
}

impl<T: Object<D>, D: Dealloc> SharedPtr<T, D> {
    /// Same as `new`, and the object's `SelfRef` is attached to the new tree.
    pub fn new_object<M: Manager<Dealloc = D>>(manager: M, value: T) -> Self {
        Self::new(manager, value).attach_self_ref()
    }
    /// Attaches the object's `SelfRef` to this handle's tree.
    /// Does nothing for an empty handle or an already attached `SelfRef`.
    ///
    /// Use it after `from_raw` or `from_raw_with_deleter`; `new_object` calls
    /// it already.
    pub fn attach_self_ref(self) -> Self {
        if let Some(object) = self.get() {
            <T as Object<D>>::self_ref(object).attach(self.downgrade());
        }
        self
    }
}

impl<T: ?Sized, D: Dealloc> Default for SharedPtr<T, D> {
    #[inline(always)]
    fn default() -> Self {
        unsafe { Self::from_inner(None) }
    }
}

impl<T: ?Sized, D: Dealloc> Clone for SharedPtr<T, D> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self::share(self.inner)
    }
}

impl<T: ?Sized, D: Dealloc> Drop for SharedPtr<T, D> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner {
            unsafe { ControlBlock::release(inner.block) }
        }
    }
}

impl<T: ?Sized, D: Dealloc> Deref for SharedPtr<T, D> {
    type Target = T;
    /// # Panics
    ///
    /// If the handle is empty.
    #[inline(always)]
    fn deref(&self) -> &T {
        match self.get() {
            Some(result) => result,
            None => panic!("dereference of an empty SharedPtr"),
        }
    }
}

impl<T: ?Sized, D: Dealloc> From<&WeakPtr<T, D>> for SharedPtr<T, D> {
    #[inline(always)]
    fn from(weak: &WeakPtr<T, D>) -> Self {
        weak.lock()
    }
}

impl<T: ?Sized + Debug, D: Dealloc> Debug for SharedPtr<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("SharedPtr").field(&value).finish(),
            None => f.write_str("SharedPtr(<empty>)"),
        }
    }
}

unsafe impl<T: ?Sized + Send + Sync, D: Dealloc> Send for SharedPtr<T, D>
where
    D::Counter: SyncCounter,
{
}

unsafe impl<T: ?Sized + Send + Sync, D: Dealloc> Sync for SharedPtr<T, D>
where
    D::Counter: SyncCounter,
{
}

#[cfg(test)]
mod test {
    use core::{
        cell::Cell,
        mem::take,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use std::{collections::HashMap, rc::Rc, sync::Arc};

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::mem::{Local, Manager, GLOBAL, SYNC_GLOBAL};

    use super::SharedPtr;

    struct Probe<'a>(&'a Cell<usize>);

    impl Drop for Probe<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_empty() {
        let x = SharedPtr::<i32>::default();
        assert!(x.is_empty());
        assert!(!x.is_valid());
        assert!(x.get().is_none());
        assert!(x.as_ptr().is_none());
        assert_eq!(x.strong_count(), 0);
        assert_eq!(x.weak_count(), 0);
        let y = x.clone();
        assert!(y.is_empty());
        assert!(x.ptr_eq(&y));
    }

    #[test]
    #[should_panic]
    #[wasm_bindgen_test]
    fn test_deref_empty() {
        let x = SharedPtr::<i32>::default();
        let _value: i32 = *x;
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_null() {
        let local = Local::default();
        let x = unsafe { SharedPtr::<i32, _>::from_raw(&local, core::ptr::null_mut()) };
        assert!(x.is_empty());
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_from_raw() {
        let local = Local::default();
        let destroyed = Cell::new(0);
        {
            let p = local.alloc_object(Probe(&destroyed));
            let x = unsafe { SharedPtr::from_raw(&local, p.as_ptr()) };
            assert_eq!(x.as_ptr(), Some(p));
            assert_eq!((x.strong_count(), x.weak_count()), (1, 0));
            assert_eq!(local.count(), 2);
        }
        assert_eq!(destroyed.get(), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_clone() {
        let local = Local::default();
        let destroyed = Cell::new(0);
        let x = local.shared_new(Probe(&destroyed));
        let copies: Vec<_> = (0..5).map(|_| x.clone()).collect();
        assert_eq!(x.strong_count(), 6);
        assert!(copies.iter().all(|c| c.ptr_eq(&x)));
        drop(copies);
        assert_eq!(x.strong_count(), 1);
        assert_eq!(destroyed.get(), 0);
        drop(x);
        assert_eq!(destroyed.get(), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_move() {
        let local = Local::default();
        let mut x = local.shared_new(5);
        let y = take(&mut x);
        assert!(x.is_empty());
        assert_eq!(y.strong_count(), 1);
        let z = y;
        assert_eq!(*z, 5);
        assert_eq!(z.strong_count(), 1);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_assign() {
        let local = Local::default();
        let destroyed = Cell::new(0);
        let mut x = local.shared_new(Probe(&destroyed));
        let y = x.clone();
        // a handle that shares the block
        x = y.clone();
        assert_eq!(destroyed.get(), 0);
        assert_eq!(x.strong_count(), 2);
        x = x.clone();
        assert_eq!(destroyed.get(), 0);
        assert_eq!(x.strong_count(), 2);
        let other = Cell::new(0);
        let mut z = local.shared_new(Probe(&other));
        z.clone_from(&x);
        assert_eq!(other.get(), 1);
        assert_eq!(x.strong_count(), 3);
        drop((x, y, z));
        assert_eq!(destroyed.get(), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_reset() {
        let local = Local::default();
        let first = Cell::new(0);
        let second = Cell::new(0);
        let mut x = local.shared_new(Probe(&first));
        x.reset_with(&local, Probe(&second));
        assert_eq!(first.get(), 1);
        assert_eq!(x.strong_count(), 1);
        assert_eq!(local.count(), 2);
        let p = local.alloc_object(Probe(&first));
        unsafe { x.reset_raw(&local, p.as_ptr()) };
        assert_eq!(second.get(), 1);
        x.reset();
        assert!(x.is_empty());
        assert_eq!(first.get(), 2);
        assert_eq!(local.count(), 0);
    }

    struct LiveOnDrop<'a> {
        local: &'a Local,
        seen: &'a Cell<usize>,
    }

    impl Drop for LiveOnDrop<'_> {
        fn drop(&mut self) {
            self.seen.set(self.local.count());
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_reset_releases_first() {
        let local = Local::default();
        let seen = Cell::new(0);
        let mut x = local.shared_new(LiveOnDrop {
            local: &local,
            seen: &seen,
        });
        // only the old object and its block are live when it is destroyed
        x.reset_with(
            &local,
            LiveOnDrop {
                local: &local,
                seen: &seen,
            },
        );
        assert_eq!(seen.get(), 2);
        assert_eq!(local.count(), 2);
        let p = local.alloc_object(LiveOnDrop {
            local: &local,
            seen: &seen,
        });
        unsafe { x.reset_raw(&local, p.as_ptr()) };
        assert_eq!(seen.get(), 3);
        drop(x);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_any_type() {
        let local = Local::default();
        {
            let mut map = local.shared_new(HashMap::<u8, u8>::new());
            map.get_mut().unwrap().insert(1, 2);
            assert_eq!(map[&1], 2);
            let pair = local.shared_new((1, "one"));
            assert_eq!(pair.1, "one");
            let array = local.shared_new([0u8; 4]);
            assert_eq!(array.len(), 4);
            let rc = local.shared_new(Rc::new(3));
            assert_eq!(**rc, 3);
            assert_eq!(local.count(), 8);
        }
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_get_mut() {
        let mut x = GLOBAL.shared_new(1);
        *x.get_mut().unwrap() += 1;
        assert_eq!(*x, 2);
        let y = x.clone();
        assert!(x.get_mut().is_none());
        drop(y);
        let w = x.downgrade();
        assert!(x.get_mut().is_none());
        drop(w);
        assert!(x.get_mut().is_some());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_custom_deleter() {
        let local = Local::default();
        let deleted = Arc::new(AtomicUsize::new(0));
        let boxed = Box::into_raw(Box::new(10));
        {
            let d = deleted.clone();
            let x = unsafe {
                SharedPtr::from_raw_with_deleter(&local, boxed, move |p| {
                    d.fetch_add(1, Ordering::Relaxed);
                    drop(Box::from_raw(p));
                })
            };
            let y = x.clone();
            drop(x);
            assert_eq!(deleted.load(Ordering::Relaxed), 0);
            assert_eq!(*y, 10);
        }
        assert_eq!(deleted.load(Ordering::Relaxed), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_debug() {
        let x = GLOBAL.shared_new(3);
        assert_eq!(format!("{:?}", x), "SharedPtr(3)");
        assert_eq!(
            format!("{:?}", SharedPtr::<i32>::default()),
            "SharedPtr(<empty>)"
        );
    }

    #[test]
    fn test_sync() {
        let x = SYNC_GLOBAL.shared_new(42usize);
        std::thread::scope(|s| {
            for _ in 0..4 {
                let y = x.clone();
                s.spawn(move || {
                    let copies: Vec<_> = (0..100).map(|_| y.clone()).collect();
                    assert!(copies.iter().all(|c| **c == 42));
                });
            }
        });
        assert_eq!(x.strong_count(), 1);
    }
}
