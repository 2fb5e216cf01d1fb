use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};

use crate::mem::{Dealloc, Global, SyncCounter};

use super::{control_block::ControlBlock, inner::Inner, shared::SharedPtr};

/// A non-owning observer. Keeps the control block alive but never the object.
///
/// The object pointer may dangle once the last `SharedPtr` is gone, so the
/// object is only reachable through `lock`.
pub struct WeakPtr<T: ?Sized, D: Dealloc = Global> {
    inner: Option<Inner<T, D>>,
    _0: PhantomData<T>,
}

impl<T: ?Sized, D: Dealloc> WeakPtr<T, D> {
    /// Promotes to a strong handle if the object is still alive, otherwise
    /// returns an empty one.
    pub fn lock(&self) -> SharedPtr<T, D> {
        match self.inner {
            Some(inner) if unsafe { ControlBlock::try_add_ref(inner.block) } => unsafe {
                SharedPtr::from_inner(Some(inner))
            },
            _ => SharedPtr::default(),
        }
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }
    /// `true` if `lock` would return an empty handle.
    pub fn expired(&self) -> bool {
        self.strong_count() == 0
    }
    pub fn strong_count(&self) -> usize {
        self.inner.map_or(0, |inner| inner.block().strong_count())
    }
    pub fn weak_count(&self) -> usize {
        self.inner.map_or(0, |inner| inner.block().weak_count())
    }
    /// `true` if both handles observe one control block, or both are empty.
    pub fn ptr_eq<U: ?Sized>(&self, other: &WeakPtr<U, D>) -> bool {
        self.inner.map(|inner| inner.block) == other.inner.map(|inner| inner.block)
    }
    #[inline(always)]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<T: ?Sized, D: Dealloc> WeakPtr<T, D> {
    /// A new handle for `inner`, taking a weak reference.
    pub(crate) fn observe(inner: Option<Inner<T, D>>) -> Self {
        if let Some(inner) = inner {
            unsafe { ControlBlock::add_weak(inner.block) };
        }
        Self {
            inner,
            _0: PhantomData,
        }
    }
}

impl<T: ?Sized, D: Dealloc> From<&SharedPtr<T, D>> for WeakPtr<T, D> {
    #[inline(always)]
    fn from(shared: &SharedPtr<T, D>) -> Self {
        Self::observe(shared.inner())
    }
}

impl<T: ?Sized, D: Dealloc> Default for WeakPtr<T, D> {
    #[inline(always)]
    fn default() -> Self {
        Self {
            inner: None,
            _0: PhantomData,
        }
    }
}

impl<T: ?Sized, D: Dealloc> Clone for WeakPtr<T, D> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self::observe(self.inner)
    }
}

impl<T: ?Sized, D: Dealloc> Drop for WeakPtr<T, D> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner {
            unsafe { ControlBlock::release_weak(inner.block) }
        }
    }
}

impl<T: ?Sized, D: Dealloc> Debug for WeakPtr<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(WeakPtr)")
    }
}

unsafe impl<T: ?Sized + Send + Sync, D: Dealloc> Send for WeakPtr<T, D>
where
    D::Counter: SyncCounter,
{
}

unsafe impl<T: ?Sized + Send + Sync, D: Dealloc> Sync for WeakPtr<T, D>
where
    D::Counter: SyncCounter,
{
}
