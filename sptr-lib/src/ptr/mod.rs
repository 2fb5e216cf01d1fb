//! Shared ownership: `SharedPtr` owns, `WeakPtr` observes, and both share one
//! control block per wrapped object.
//!
//! Handles are single-threaded unless the manager's `Dealloc` selects a
//! `SyncCounter` policy. Wrapping the same raw pointer twice is undefined
//! behavior; every other way of getting a handle goes through an existing one.

mod block;
mod cast;
mod control_block;
mod delete;
mod inner;
mod object;
mod shared;
mod weak;

pub use self::{
    cast::{
        const_pointer_cast, dynamic_pointer_cast, static_pointer_cast, Const, DynamicCast,
        StaticCast,
    },
    delete::{DeallocDelete, Delete},
    object::{Object, SelfRef, SharedFromSelf},
    shared::SharedPtr,
    weak::WeakPtr,
};
