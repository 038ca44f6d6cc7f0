use core::mem::MaybeUninit;

/// Compile-time zero-sized-type check, usable in generic code as `T::IS_ZST`.
pub(crate) trait IsZST {
    const IS_ZST: bool;
}

impl<T> IsZST for T {
    const IS_ZST: bool = core::mem::size_of::<T>() == 0;
}

/// Marks the enclosing branch as unlikely.
#[cold]
#[inline(never)]
pub(crate) fn cold_path() {}

/// Conjure a value of a zero sized type out of thin air.
///
/// # Safety
/// `T` must be a zero sized type.
#[inline(always)]
pub(crate) const unsafe fn zst_init<T>() -> T {
    debug_assert!(core::mem::size_of::<T>() == 0);
    // SAFETY: a ZST has no bits, so the uninitialized value is the value.
    unsafe { MaybeUninit::<T>::uninit().assume_init() }
}

/// Common trait impls for a two-segment container.
///
/// The segments are not contiguous, so everything here goes through the
/// container's own iterator rather than a single backing slice.
macro_rules! impl_common_traits {
    ($name:ty) => {
        impl<T: core::fmt::Debug, const N: usize> core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list().entries(self.iter()).finish()
            }
        }

        impl<T: core::hash::Hash, const N: usize> core::hash::Hash for $name {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.len().hash(state);
                for item in self.iter() {
                    item.hash(state);
                }
            }
        }

        impl<T, const N: usize> core::ops::Index<usize> for $name {
            type Output = T;

            #[inline]
            fn index(&self, index: usize) -> &T {
                match self.get(index) {
                    Some(item) => item,
                    None => panic!(
                        "index out of bounds: the len is {} but the index is {}",
                        self.len(),
                        index
                    ),
                }
            }
        }

        impl<T, const N: usize> core::ops::IndexMut<usize> for $name {
            #[inline]
            fn index_mut(&mut self, index: usize) -> &mut T {
                let len = self.len();
                match self.get_mut(index) {
                    Some(item) => item,
                    None => panic!(
                        "index out of bounds: the len is {} but the index is {}",
                        len, index
                    ),
                }
            }
        }

        impl<'a, T, const N: usize> IntoIterator for &'a $name {
            type Item = &'a T;
            type IntoIter = $crate::hybrid_vec::Iter<'a, T>;
            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<'a, T, const N: usize> IntoIterator for &'a mut $name {
            type Item = &'a mut T;
            type IntoIter = $crate::hybrid_vec::IterMut<'a, T>;
            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.iter_mut()
            }
        }

        impl<T, U, const N: usize, const P: usize> core::cmp::PartialEq<$crate::HybridVec<U, P>>
            for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &$crate::HybridVec<U, P>) -> bool {
                self.iter().eq(other.iter())
            }
        }

        impl<T: Eq, const N: usize> Eq for $name {}

        impl<T: core::cmp::PartialOrd, const N: usize> core::cmp::PartialOrd for $name {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                self.iter().partial_cmp(other.iter())
            }
        }

        impl<T: core::cmp::Ord, const N: usize> core::cmp::Ord for $name {
            #[inline]
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                self.iter().cmp(other.iter())
            }
        }

        impl<T, U, const N: usize> core::cmp::PartialEq<&[U]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U]) -> bool {
                self.iter().eq(other.iter())
            }
        }

        impl<T, U, const N: usize> core::cmp::PartialEq<[U]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U]) -> bool {
                self.iter().eq(other.iter())
            }
        }

        impl<T, U, const N: usize, const P: usize> core::cmp::PartialEq<[U; P]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U; P]) -> bool {
                self.iter().eq(other.iter())
            }
        }

        impl<T, U, const N: usize, const P: usize> core::cmp::PartialEq<&[U; P]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U; P]) -> bool {
                self.iter().eq(other.iter())
            }
        }
    };
}

pub(crate) use impl_common_traits;
