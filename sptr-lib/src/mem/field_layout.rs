use core::{
    alloc::Layout,
    marker::PhantomData,
    mem::{align_of, size_of},
};

/// Layout of a header `T` placed right before an adjacent region of `A`s.
pub struct FieldLayout<T, A> {
    pub align: usize,
    pub size: usize,
    _0: PhantomData<(T, A)>,
}

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

impl<T, A> FieldLayout<T, A> {
    pub const fn align_to(adjacent_align: usize) -> FieldLayout<T, A> {
        assert!(adjacent_align.is_power_of_two());
        assert!(adjacent_align >= align_of::<A>());
        FieldLayout {
            align: max(align_of::<T>(), adjacent_align),
            size: {
                let mask = adjacent_align - 1;
                (size_of::<T>() + mask) & !mask
            },
            _0: PhantomData,
        }
    }
    /// Layout of the header followed by `adjacent_size` bytes.
    #[inline(always)]
    pub const fn layout(&self, adjacent_size: usize) -> Layout {
        unsafe { Layout::from_size_align_unchecked(self.size + adjacent_size, self.align) }
    }
    #[inline(always)]
    pub unsafe fn to_adjacent(&self, p: *mut T) -> *mut A {
        p.cast::<u8>().add(self.size).cast()
    }
    #[inline(always)]
    pub unsafe fn from_adjacent(&self, p: *mut A) -> *mut T {
        p.cast::<u8>().sub(self.size).cast()
    }
}
