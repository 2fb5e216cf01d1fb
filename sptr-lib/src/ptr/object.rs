use core::{
    cell::OnceCell,
    fmt::{self, Debug, Formatter},
};

use crate::mem::{Dealloc, Global};

use super::{cast::Const, shared::SharedPtr, weak::WeakPtr};

/// A type that can hand out strong handles to itself.
///
/// Any type can be managed by `SharedPtr`. Only types that embed a `SelfRef`
/// implement `Object`, and only `SharedPtr::new_object`,
/// `Manager::shared_object` and `SharedPtr::attach_self_ref` attach it.
pub trait Object<D: Dealloc = Global>: Sized {
    fn self_ref(&self) -> &SelfRef<Self, D>;
}

/// The weak reference a self-aware object keeps to itself.
///
/// It is attached once, by the first `SharedPtr` that wraps the object through
/// a self-aware constructor. Cloning gives a detached `SelfRef`, so a copied object never shares
/// the identity of its source.
pub struct SelfRef<T, D: Dealloc = Global>(OnceCell<WeakPtr<T, D>>);

impl<T, D: Dealloc> SelfRef<T, D> {
    pub const fn new() -> Self {
        Self(OnceCell::new())
    }
    /// Called by `SharedPtr` only. A second attachment is ignored.
    pub(crate) fn attach(&self, weak: WeakPtr<T, D>) {
        let _ = self.0.set(weak);
    }
    pub fn is_attached(&self) -> bool {
        self.0.get().is_some()
    }
    /// A strong handle to the owner, or an empty one if the owner was never
    /// wrapped or is already being destroyed.
    pub fn lock(&self) -> SharedPtr<T, D> {
        self.0.get().map_or_else(SharedPtr::default, WeakPtr::lock)
    }
}

impl<T, D: Dealloc> Default for SelfRef<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D: Dealloc> Clone for SelfRef<T, D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T, D: Dealloc> Debug for SelfRef<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfRef")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Strong handles to `self` from inside the object.
pub trait SharedFromSelf<D: Dealloc = Global>: Object<D> {
    fn self_as_shared_ptr(&self) -> SharedPtr<Self, D> {
        self.self_ref().lock()
    }
    fn self_as_const_shared_ptr(&self) -> SharedPtr<Const<Self>, D> {
        self.self_as_shared_ptr().into_const()
    }
}

impl<D: Dealloc, T: Object<D>> SharedFromSelf<D> for T {}
