use alloc::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use core::{
    fmt,
    iter::FusedIterator,
    mem::{self, ManuallyDrop, MaybeUninit},
    ptr::{self, NonNull},
    slice,
};

use crate::callable::Callable;
use crate::utils::{cold_path, zst_init, IsZST};

/// Size of the first spill allocation, in elements.
///
/// Also the occupancy floor below which [`HybridVec::pop`] stops halving the
/// spill buffer, so a buffer never shrinks to a size it would immediately
/// have to grow out of again.
pub const MIN_SPILL_CAPACITY: usize = 16;

/// A pop only shrinks the spill buffer once occupancy falls to
/// `capacity / SHRINK_DIVISOR` or below.
///
/// Together with the doubling growth this keeps a gap between the grow and
/// shrink boundaries, so alternating push/pop sequences near a capacity
/// boundary cannot thrash the allocator.
pub const SHRINK_DIVISOR: usize = 4;

/// Error type for APIs with fallible spill-buffer allocation.
///
/// This is the only recoverable error class in the crate. It is returned by
/// [`HybridVec::try_push`], [`HybridVec::try_reserve`] and
/// [`HybridVec::try_clone`]; the failing operation leaves the container in
/// its prior valid state. Index violations, by contrast, are caller bugs and
/// panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The requested capacity overflowed `usize` or `isize::MAX` bytes
    /// during size computation.
    CapacityOverflow,
    /// The allocator returned null.
    AllocFailed {
        /// The layout that was passed to the allocator.
        layout: Layout,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::CapacityOverflow => write!(f, "capacity overflow"),
            AllocError::AllocFailed { layout } => {
                write!(f, "allocation of {} bytes failed", layout.size())
            }
        }
    }
}

impl core::error::Error for AllocError {}

/// Unwraps fallible-allocation results the way the standard collections do.
#[inline]
fn infallible<T>(result: Result<T, AllocError>) -> T {
    match result {
        Ok(value) => value,
        Err(AllocError::CapacityOverflow) => panic!("capacity overflow"),
        Err(AllocError::AllocFailed { layout }) => handle_alloc_error(layout),
    }
}

/// A two-segment vector: a fixed inline buffer of `N` elements plus a
/// growable heap ("spill") buffer for overflow.
///
/// The inline segment always fills before the spill segment receives any
/// element, and elements never migrate between segments, so logical index
/// `i` is inline for `i < N` (once written) and at spill offset `i - N`
/// otherwise. Appends into either segment are O(1); growing the spill buffer
/// doubles its capacity (first allocation [`MIN_SPILL_CAPACITY`] elements),
/// which bounds the total reallocation work across `n` pushes to O(n).
///
/// Popping applies shrink hysteresis: the spill buffer is released outright
/// when it empties, and halved when occupancy falls to a quarter of capacity
/// while still at least [`MIN_SPILL_CAPACITY`]; see [`HybridVec::pop`].
///
/// The two segments are not contiguous, so there is no `Deref<Target = [T]>`;
/// use [`as_slices`](HybridVec::as_slices), the iterators, or indexing.
///
/// # Examples
///
/// ```
/// use hybridvec::HybridVec;
///
/// let mut vec: HybridVec<i32, 4> = HybridVec::new();
/// vec.extend([1, 2, 3, 4, 5, 6]);
///
/// // The first four elements stayed inline; the rest spilled.
/// assert_eq!(vec.as_slices(), (&[1, 2, 3, 4][..], &[5, 6][..]));
/// assert_eq!(vec.len(), 6);
/// assert_eq!(vec[5], 6);
///
/// assert_eq!(vec.pop(), Some(6));
/// ```
///
/// # Single-threaded by design
///
/// All operations take `&self`/`&mut self` and run to completion; the
/// container is `Send`/`Sync` when `T` is, but concurrent mutation requires
/// external synchronization like any other Rust collection.
pub struct HybridVec<T, const N: usize> {
    inline: [MaybeUninit<T>; N],
    inline_len: usize,
    /// Dangling iff `spill_cap == 0`. For ZSTs always dangling; `spill_cap`
    /// is then tracked arithmetically with no allocation behind it.
    spill: NonNull<T>,
    spill_len: usize,
    spill_cap: usize,
}

unsafe impl<T: Send, const N: usize> Send for HybridVec<T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for HybridVec<T, N> {}

impl<T, const N: usize> Drop for HybridVec<T, N> {
    fn drop(&mut self) {
        // SAFETY: both ranges hold initialized elements; the spill buffer,
        // when present, was allocated by this container with its current
        // capacity.
        unsafe {
            if self.spill_len > 0 {
                ptr::drop_in_place(slice::from_raw_parts_mut(self.spill.as_ptr(), self.spill_len));
            }
            if self.inline_len > 0 {
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    self.inline.as_mut_ptr() as *mut T,
                    self.inline_len,
                ));
            }
            if !T::IS_ZST && self.spill_cap > 0 {
                self.dealloc_spill();
            }
        }
    }
}

/// Creates a [`HybridVec`] containing the arguments.
///
/// The syntax is similar to [`vec!`](https://doc.rust-lang.org/std/macro.vec.html).
/// The inline capacity must be nameable from context; the number of elements
/// may exceed it, overflow simply spills.
///
/// # Examples
///
/// ```
/// # use hybridvec::{hybridvec, HybridVec};
/// let vec: HybridVec<i32, 4> = hybridvec![];
/// let vec: HybridVec<i32, 4> = hybridvec![7; 6]; // needs Clone
/// let vec: HybridVec<_, 4> = hybridvec![1, 2, 3, 4, 5];
/// assert_eq!(vec.len(), 5);
/// ```
#[macro_export]
macro_rules! hybridvec {
    [] => { $crate::HybridVec::new() };
    [$elem:expr; $n:expr] => { $crate::HybridVec::from_elem($elem, $n) };
    [$($item:expr),+ $(,)?] => { $crate::HybridVec::from([ $($item),+ ]) };
}

impl<T, const N: usize> HybridVec<T, N> {
    /// Constructs a new, empty `HybridVec`.
    ///
    /// The inline capacity is fixed by the const generic parameter and never
    /// changes for the container's lifetime. No heap allocation happens here
    /// or on any later operation that fits within the first `N` elements.
    /// This constructor cannot fail.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec: HybridVec<String, 8> = HybridVec::new();
    /// assert!(vec.is_empty());
    /// assert_eq!(vec.capacity(), 8);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            // SAFETY: an uninitialized array of `MaybeUninit` is initialized.
            inline: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
            inline_len: 0,
            spill: NonNull::dangling(),
            spill_len: 0,
            spill_cap: 0,
        }
    }

    /// Constructs an empty `HybridVec` able to hold at least `capacity`
    /// elements without reallocating.
    ///
    /// # Panics
    /// Panics on capacity overflow; aborts on allocator failure.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec: HybridVec<i32, 4> = HybridVec::with_capacity(10);
    /// assert_eq!(vec.capacity(), 10);
    /// assert_eq!(vec.spill_capacity(), 6);
    /// ```
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut vec = Self::new();
        vec.reserve(capacity);
        vec
    }

    /// Returns the number of elements in the vector.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.inline_len + self.spill_len
    }

    /// Returns `true` if the vector contains no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of elements the vector can hold without
    /// reallocating: the inline capacity plus the current spill capacity.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N + self.spill_cap
    }

    /// Number of elements currently held in the inline segment.
    #[inline(always)]
    pub const fn inline_len(&self) -> usize {
        self.inline_len
    }

    /// Number of elements currently held in the spill segment.
    #[inline(always)]
    pub const fn spill_len(&self) -> usize {
        self.spill_len
    }

    /// The fixed inline capacity `N`.
    #[inline(always)]
    pub const fn inline_capacity(&self) -> usize {
        N
    }

    /// Current capacity of the spill segment, in elements.
    ///
    /// Zero means no spill allocation exists.
    #[inline(always)]
    pub const fn spill_capacity(&self) -> usize {
        self.spill_cap
    }

    /// Returns `true` if a spill buffer currently exists.
    ///
    /// For zero-sized element types no memory is ever allocated, but the
    /// spill capacity is still tracked and reported here.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<u8, 2> = HybridVec::new();
    /// vec.extend([1, 2]);
    /// assert!(!vec.spilled());
    /// vec.push(3);
    /// assert!(vec.spilled());
    /// ```
    #[inline(always)]
    pub const fn spilled(&self) -> bool {
        self.spill_cap > 0
    }

    #[inline(always)]
    fn inline_ptr(&self) -> *const T {
        self.inline.as_ptr() as *const T
    }

    #[inline(always)]
    fn inline_mut_ptr(&mut self) -> *mut T {
        self.inline.as_mut_ptr() as *mut T
    }

    /// Pointer to the element at logical index `index`.
    ///
    /// # Safety
    /// `index < self.len()`.
    #[inline]
    unsafe fn elem_ptr(&self, index: usize) -> *const T {
        if index < self.inline_len {
            unsafe { self.inline_ptr().add(index) }
        } else {
            unsafe { self.spill.as_ptr().add(index - self.inline_len) as *const T }
        }
    }

    /// Mutable pointer to the element at logical index `index`.
    ///
    /// # Safety
    /// `index < self.len()`.
    #[inline]
    unsafe fn elem_mut_ptr(&mut self, index: usize) -> *mut T {
        if index < self.inline_len {
            unsafe { self.inline_mut_ptr().add(index) }
        } else {
            unsafe { self.spill.as_ptr().add(index - self.inline_len) }
        }
    }

    /// Frees the spill allocation.
    ///
    /// # Safety
    /// `T` is not a ZST, `spill_cap > 0`, and the buffer's contents have
    /// been dropped or moved out.
    #[inline]
    unsafe fn dealloc_spill(&mut self) {
        debug_assert!(!T::IS_ZST && self.spill_cap > 0);
        // SAFETY: the buffer was allocated with exactly this layout.
        unsafe {
            dealloc(
                self.spill.as_ptr() as *mut u8,
                Layout::from_size_align_unchecked(
                    mem::size_of::<T>() * self.spill_cap,
                    mem::align_of::<T>(),
                ),
            );
        }
    }

    /// Resizes the spill buffer to exactly `new_cap` elements, moving the
    /// spill-resident elements into the new allocation. `new_cap == 0`
    /// releases the buffer. On failure nothing changes.
    ///
    /// # Safety
    /// `new_cap >= self.spill_len`.
    unsafe fn try_resize_spill(&mut self, new_cap: usize) -> Result<(), AllocError> {
        debug_assert!(new_cap >= self.spill_len);

        if T::IS_ZST {
            self.spill_cap = new_cap;
            return Ok(());
        }

        if new_cap == 0 {
            if self.spill_cap > 0 {
                // SAFETY: spill_len == 0 per the contract, contents gone.
                unsafe { self.dealloc_spill() };
                self.spill = NonNull::dangling();
                self.spill_cap = 0;
            }
            return Ok(());
        }

        let new_layout =
            Layout::array::<T>(new_cap).map_err(|_| AllocError::CapacityOverflow)?;
        if new_layout.size() > isize::MAX as usize {
            return Err(AllocError::CapacityOverflow);
        }

        // SAFETY: new_layout has nonzero size (T is not a ZST, new_cap > 0).
        unsafe {
            let new_ptr = alloc(new_layout) as *mut T;
            let new_ptr = NonNull::new(new_ptr)
                .ok_or(AllocError::AllocFailed { layout: new_layout })?;
            ptr::copy_nonoverlapping(self.spill.as_ptr(), new_ptr.as_ptr(), self.spill_len);
            if self.spill_cap > 0 {
                self.dealloc_spill();
            }
            self.spill = new_ptr;
            self.spill_cap = new_cap;
        }
        Ok(())
    }

    /// Picks the next spill capacity for a push that found both segments
    /// full: the minimum reservation for a fresh buffer, doubling otherwise.
    #[inline]
    fn try_grow_for_push(&mut self) -> Result<(), AllocError> {
        debug_assert!(self.inline_len == N && self.spill_len == self.spill_cap);
        let new_cap = if self.spill_cap == 0 {
            MIN_SPILL_CAPACITY
        } else {
            self.spill_cap
                .checked_mul(2)
                .ok_or(AllocError::CapacityOverflow)?
        };
        // SAFETY: new_cap > spill_cap >= spill_len.
        unsafe { self.try_resize_spill(new_cap) }
    }

    /// # Safety
    /// `self.inline_len < N`.
    #[inline(always)]
    unsafe fn push_inline_unchecked(&mut self, value: T) {
        debug_assert!(self.inline_len < N);
        if T::IS_ZST {
            mem::forget(value);
        } else {
            unsafe { ptr::write(self.inline_mut_ptr().add(self.inline_len), value) };
        }
        self.inline_len += 1;
    }

    /// # Safety
    /// `self.spill_len < self.spill_cap`.
    #[inline(always)]
    unsafe fn push_spill_unchecked(&mut self, value: T) {
        debug_assert!(self.spill_len < self.spill_cap);
        if T::IS_ZST {
            mem::forget(value);
        } else {
            unsafe { ptr::write(self.spill.as_ptr().add(self.spill_len), value) };
        }
        self.spill_len += 1;
    }

    /// Appends without checking capacity.
    ///
    /// # Safety
    /// `self.len() < self.capacity()`.
    #[inline]
    pub(crate) unsafe fn push_unchecked(&mut self, value: T) {
        if self.inline_len < N {
            unsafe { self.push_inline_unchecked(value) };
        } else {
            unsafe { self.push_spill_unchecked(value) };
        }
    }

    /// Appends an element to the back of the vector.
    ///
    /// The element lands inline while the inline segment has spare capacity,
    /// and in the spill segment afterwards. When both segments are full the
    /// spill buffer grows: to [`MIN_SPILL_CAPACITY`] if it was empty, double
    /// its capacity otherwise.
    ///
    /// # Panics
    /// Panics on capacity overflow; aborts on allocator failure. Use
    /// [`try_push`](HybridVec::try_push) to recover instead.
    ///
    /// # Time complexity
    /// Amortized O(1).
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 4> = HybridVec::new();
    /// for v in 1..=4 {
    ///     vec.push(v);
    /// }
    /// assert_eq!(vec.spill_capacity(), 0); // still no allocation
    ///
    /// vec.push(5);
    /// assert_eq!(vec.spill_capacity(), 16);
    /// assert_eq!(vec.len(), 5);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.inline_len < N {
            // SAFETY: just checked.
            unsafe { self.push_inline_unchecked(value) };
        } else if self.spill_len < self.spill_cap {
            // SAFETY: just checked.
            unsafe { self.push_spill_unchecked(value) };
        } else {
            cold_path();
            infallible(self.try_grow_for_push());
            // SAFETY: growth succeeded, so the spill buffer has room.
            unsafe { self.push_spill_unchecked(value) };
        }
    }

    /// Appends an element, reporting allocation failure instead of aborting.
    ///
    /// On failure the container is unchanged and the rejected value is
    /// handed back alongside the cause.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<u8, 4> = HybridVec::new();
    /// assert!(vec.try_push(1).is_ok());
    /// assert_eq!(vec.len(), 1);
    /// ```
    pub fn try_push(&mut self, value: T) -> Result<(), (T, AllocError)> {
        if self.inline_len < N {
            // SAFETY: just checked.
            unsafe { self.push_inline_unchecked(value) };
        } else if self.spill_len < self.spill_cap {
            // SAFETY: just checked.
            unsafe { self.push_spill_unchecked(value) };
        } else if let Err(err) = self.try_grow_for_push() {
            return Err((value, err));
        } else {
            // SAFETY: growth succeeded, so the spill buffer has room.
            unsafe { self.push_spill_unchecked(value) };
        }
        Ok(())
    }

    /// Removes and returns the last element, or `None` if the vector is
    /// empty.
    ///
    /// After popping from the spill segment, shrink hysteresis applies: an
    /// emptied spill buffer is released outright (capacity back to zero),
    /// and a buffer whose occupancy fell to `capacity / `[`SHRINK_DIVISOR`]
    /// while still at least [`MIN_SPILL_CAPACITY`] is halved. The two-sided
    /// threshold keeps alternating push/pop sequences near a boundary from
    /// oscillating between grow and shrink.
    ///
    /// The returned value transfers ownership to the caller; no destructor
    /// runs here.
    ///
    /// # Time complexity
    /// Amortized O(1).
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 2> = HybridVec::from([1, 2, 3]);
    /// assert!(vec.spilled());
    ///
    /// assert_eq!(vec.pop(), Some(3));
    /// assert!(!vec.spilled()); // the emptied spill buffer was released
    ///
    /// assert_eq!(vec.pop(), Some(2));
    /// assert_eq!(vec.pop(), Some(1));
    /// assert_eq!(vec.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<T> {
        if self.spill_len > 0 {
            self.spill_len -= 1;
            let value = if T::IS_ZST {
                // SAFETY: T is a ZST.
                unsafe { zst_init() }
            } else {
                // SAFETY: the slot at the old spill_len - 1 is initialized.
                unsafe { ptr::read(self.spill.as_ptr().add(self.spill_len)) }
            };
            self.shrink_after_pop();
            Some(value)
        } else if self.inline_len > 0 {
            self.inline_len -= 1;
            if T::IS_ZST {
                // SAFETY: T is a ZST.
                Some(unsafe { zst_init() })
            } else {
                // SAFETY: the slot at the old inline_len - 1 is initialized.
                Some(unsafe { ptr::read(self.inline_ptr().add(self.inline_len)) })
            }
        } else {
            cold_path();
            None
        }
    }

    /// Shrink policy applied after every pop that touched the spill segment.
    #[inline]
    fn shrink_after_pop(&mut self) {
        if self.spill_len == 0 {
            // SAFETY: nothing left to keep; releasing cannot fail.
            unsafe {
                let _ = self.try_resize_spill(0);
            }
        } else if self.spill_len <= self.spill_cap / SHRINK_DIVISOR
            && self.spill_len >= MIN_SPILL_CAPACITY
        {
            // Shrinking is an optimization; if the smaller allocation cannot
            // be obtained the container simply keeps its current capacity.
            // SAFETY: spill_cap / 2 >= spill_cap / SHRINK_DIVISOR >= spill_len.
            unsafe {
                let _ = self.try_resize_spill(self.spill_cap / 2);
            }
        }
    }

    /// Removes the element at `index` and returns it, replacing it with the
    /// last element.
    ///
    /// This does not preserve the order of the remaining elements, but is
    /// O(1). The pop at the end applies the usual shrink hysteresis.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = hybridvec![1, 2, 3];
    ///
    /// assert_eq!(vec.swap_remove(0), 1);
    /// assert_eq!(vec, [3, 2]);
    /// ```
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(index < len, "removal index should be < len");

        let last = len - 1;
        if index != last && !T::IS_ZST {
            // SAFETY: both indices are < len, and they are distinct.
            unsafe {
                let a = self.elem_mut_ptr(index);
                let b = self.elem_mut_ptr(last);
                ptr::swap(a, b);
            }
        }
        // SAFETY: len > 0 was asserted above.
        unsafe { self.pop().unwrap_unchecked() }
    }

    /// Reserves capacity for at least `capacity` elements in total.
    ///
    /// A no-op when the request is already satisfied by the inline segment
    /// or the current spill buffer; this never shrinks. Otherwise the spill
    /// buffer is resized to exactly `capacity - N` elements, with no extra
    /// slack; slack comes only from the doubling growth in
    /// [`push`](HybridVec::push).
    ///
    /// # Panics
    /// Panics on capacity overflow; aborts on allocator failure. Use
    /// [`try_reserve`](HybridVec::try_reserve) to recover instead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 4> = HybridVec::new();
    /// vec.reserve(10);
    /// assert_eq!(vec.capacity(), 10);
    /// assert_eq!(vec.spill_capacity(), 6); // exact fit
    ///
    /// vec.reserve(8); // already satisfied
    /// assert_eq!(vec.capacity(), 10);
    /// ```
    #[inline]
    pub fn reserve(&mut self, capacity: usize) {
        infallible(self.try_reserve(capacity));
    }

    /// Fallible form of [`reserve`](HybridVec::reserve).
    ///
    /// On failure the container is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{AllocError, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = HybridVec::new();
    /// assert!(vec.try_reserve(100).is_ok());
    /// assert_eq!(vec.try_reserve(usize::MAX), Err(AllocError::CapacityOverflow));
    /// assert_eq!(vec.capacity(), 100);
    /// ```
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        // SAFETY: capacity > N + spill_cap, so the new spill capacity
        // exceeds spill_cap >= spill_len.
        unsafe { self.try_resize_spill(capacity - N) }
    }

    /// Shrinks the spill buffer to exactly fit the spill-resident elements,
    /// releasing it when empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 0> = HybridVec::with_capacity(100);
    /// vec.extend([1, 2, 3]);
    /// vec.shrink_to_fit();
    /// assert_eq!(vec.spill_capacity(), 3);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        if self.spill_cap > self.spill_len {
            // Failure to shrink just keeps the current capacity.
            // SAFETY: spill_len is the exact element count.
            unsafe {
                let _ = self.try_resize_spill(self.spill_len);
            }
        }
    }

    /// Returns a reference to the element at `index`, or `None` if out of
    /// bounds.
    ///
    /// Indexing through `vec[index]` panics on out-of-bounds access instead;
    /// an out-of-range index is a caller bug, not a recoverable condition.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let vec: HybridVec<i32, 2> = hybridvec![10, 20, 30];
    /// assert_eq!(vec.get(2), Some(&30)); // spill-resident
    /// assert_eq!(vec.get(3), None);
    /// ```
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            // SAFETY: just checked.
            Some(unsafe { &*self.elem_ptr(index) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, or `None` if
    /// out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            // SAFETY: just checked.
            Some(unsafe { &mut *self.elem_mut_ptr(index) })
        } else {
            None
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// The two segments as slices, inline segment first.
    ///
    /// Concatenated in order, the two slices are the whole sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 2> = HybridVec::new();
    /// vec.extend([1, 2, 3]);
    /// assert_eq!(vec.as_slices(), (&[1, 2][..], &[3][..]));
    /// ```
    #[inline]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        // SAFETY: both ranges hold initialized elements; for ZSTs the
        // dangling spill pointer is aligned and valid for zero-size access.
        unsafe {
            (
                slice::from_raw_parts(self.inline_ptr(), self.inline_len),
                slice::from_raw_parts(self.spill.as_ptr(), self.spill_len),
            )
        }
    }

    /// Mutable variant of [`as_slices`](HybridVec::as_slices).
    #[inline]
    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let inline_ptr = self.inline.as_mut_ptr() as *mut T;
        let spill_ptr = self.spill.as_ptr();
        // SAFETY: the two ranges are disjoint and hold initialized elements.
        unsafe {
            (
                slice::from_raw_parts_mut(inline_ptr, self.inline_len),
                slice::from_raw_parts_mut(spill_ptr, self.spill_len),
            )
        }
    }

    /// Iterator over the elements in logical order, inline segment first.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        let (inline, spill) = self.as_slices();
        Iter {
            inline: inline.iter(),
            spill: spill.iter(),
        }
    }

    /// Mutable iterator over the elements in logical order.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let (inline, spill) = self.as_mut_slices();
        IterMut {
            inline: inline.iter_mut(),
            spill: spill.iter_mut(),
        }
    }

    /// Invokes `callable` once per element, in logical order, passing each
    /// element by mutable reference.
    ///
    /// Traversal is synchronous and runs over every element; there is no
    /// early-exit signal. The container is mutably borrowed for the whole
    /// traversal, so the callable cannot also mutate its length.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{Callable, HybridVec};
    /// let mut vec: HybridVec<u32, 2> = HybridVec::from([1, 2, 3, 4]);
    ///
    /// let mut product = 1u64;
    /// vec.for_each(Callable::new(
    ///     |product: &mut u64, item: &mut u32| *product *= u64::from(*item),
    ///     &mut product,
    /// ));
    /// assert_eq!(product, 24);
    /// ```
    pub fn for_each<Ctx: ?Sized, Ret>(&mut self, mut callable: Callable<'_, Ctx, T, Ret>) {
        let (inline, spill) = self.as_mut_slices();
        for item in inline {
            callable.call(item);
        }
        for item in spill {
            callable.call(item);
        }
    }

    /// Shortens the vector to at most `len` elements, dropping the rest.
    ///
    /// No effect when `len >= self.len()`. An emptied spill buffer is
    /// released, matching the pop hysteresis policy.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 2> = hybridvec![1, 2, 3, 4, 5];
    /// vec.truncate(1);
    /// assert_eq!(vec, [1]);
    /// assert!(!vec.spilled());
    /// ```
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        // SAFETY: every dropped range holds initialized elements, and the
        // lengths are updated before any reallocation.
        unsafe {
            if len >= self.inline_len {
                let keep = len - self.inline_len;
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    self.spill.as_ptr().add(keep),
                    self.spill_len - keep,
                ));
                self.spill_len = keep;
            } else {
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    self.spill.as_ptr(),
                    self.spill_len,
                ));
                self.spill_len = 0;
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    self.inline_mut_ptr().add(len),
                    self.inline_len - len,
                ));
                self.inline_len = len;
            }
            if self.spill_len == 0 && self.spill_cap > 0 {
                let _ = self.try_resize_spill(0);
            }
        }
    }

    /// Clears the vector, dropping all elements and releasing the spill
    /// buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl<T: Clone, const N: usize> HybridVec<T, N> {
    /// Creates a `HybridVec` with `count` clones of `elem`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec: HybridVec<i32, 4> = HybridVec::from_elem(9, 6);
    /// assert_eq!(vec, [9, 9, 9, 9, 9, 9]);
    /// ```
    pub fn from_elem(elem: T, count: usize) -> Self {
        let mut vec = Self::new();
        if count == 0 {
            return vec;
        }
        vec.reserve(count);
        for _ in 1..count {
            // SAFETY: capacity was reserved above.
            unsafe { vec.push_unchecked(elem.clone()) };
        }
        // The original value fills the last slot, saving one clone.
        // SAFETY: capacity was reserved above.
        unsafe { vec.push_unchecked(elem) };
        vec
    }

    /// Clones and appends all elements in `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = hybridvec![1];
    /// vec.extend_from_slice(&[2, 3, 4, 5]);
    /// assert_eq!(vec, [1, 2, 3, 4, 5]);
    /// ```
    pub fn extend_from_slice(&mut self, other: &[T]) {
        let required = match self.len().checked_add(other.len()) {
            Some(required) => required,
            None => panic!("capacity overflow"),
        };
        self.reserve(required);
        for item in other {
            // SAFETY: capacity was reserved above.
            unsafe { self.push_unchecked(item.clone()) };
        }
    }

    /// Produces an independent deep copy, reporting allocation failure.
    ///
    /// The copy gets a fresh spill buffer of the *same capacity* as the
    /// source, and every element (inline and spill-resident) is cloned, so
    /// elements that own heap resources become independent too. After this
    /// call the source and the copy share no allocation. `Clone::clone` is
    /// the infallible form.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<String, 1> = HybridVec::new();
    /// vec.push("inline".to_string());
    /// vec.push("spilled".to_string());
    ///
    /// let copy = vec.try_clone().unwrap();
    /// vec[1].push_str(" and mutated");
    ///
    /// assert_eq!(copy[1], "spilled");
    /// assert_eq!(copy.spill_capacity(), vec.spill_capacity());
    /// ```
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let mut clone = Self::new();
        if self.spill_cap > 0 {
            // SAFETY: the clone's spill_len is 0.
            unsafe { clone.try_resize_spill(self.spill_cap)? };
        }
        for item in self.iter() {
            // SAFETY: the clone's capacity equals the source's, which holds
            // at least len() elements.
            unsafe { clone.push_unchecked(item.clone()) };
        }
        Ok(clone)
    }
}

impl<T: Clone, const N: usize> Clone for HybridVec<T, N> {
    /// Deep copy; see [`HybridVec::try_clone`].
    ///
    /// # Panics
    /// Panics on capacity overflow; aborts on allocator failure.
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        for item in source.iter() {
            self.push(item.clone());
        }
    }
}

impl<T, const N: usize> Default for HybridVec<T, N> {
    /// Equivalent to [`HybridVec::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Extend<T> for HybridVec<T, N> {
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 2> = HybridVec::new();
    /// vec.extend([1, 2, 3]);
    /// assert_eq!(vec, [1, 2, 3]);
    /// ```
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: 'a + Clone, const N: usize> Extend<&'a T> for HybridVec<T, N> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item.clone());
        }
    }
}

impl<T, const N: usize> FromIterator<T> for HybridVec<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut vec = Self::new();
        let (hint, _) = iter.size_hint();
        vec.reserve(hint);
        for item in iter {
            vec.push(item);
        }
        vec
    }
}

impl<T, const N: usize, const P: usize> From<[T; P]> for HybridVec<T, N> {
    /// Fills the inline segment with the first `min(P, N)` elements and
    /// spills the rest.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec = HybridVec::<i32, 2>::from([1, 2, 3]);
    /// assert_eq!(vec.as_slices(), (&[1, 2][..], &[3][..]));
    /// ```
    fn from(value: [T; P]) -> Self {
        Self::from_iter(value)
    }
}

impl<T: Clone, const N: usize> From<&[T]> for HybridVec<T, N> {
    fn from(value: &[T]) -> Self {
        let mut vec = Self::new();
        vec.extend_from_slice(value);
        vec
    }
}

crate::utils::impl_common_traits!(HybridVec<T, N>);

/// Immutable iterator over a [`HybridVec`], inline segment first.
#[derive(Debug)]
pub struct Iter<'a, T> {
    inline: slice::Iter<'a, T>,
    spill: slice::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    // Not derived: the derive would require `T: Clone`, but the borrowed
    // slice iterators clone for any `T`.
    #[inline]
    fn clone(&self) -> Self {
        Iter {
            inline: self.inline.clone(),
            spill: self.spill.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inline.next().or_else(|| self.spill.next())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inline.len() + self.spill.len();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.spill.next_back().or_else(|| self.inline.next_back())
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over a [`HybridVec`], inline segment first.
#[derive(Debug)]
pub struct IterMut<'a, T> {
    inline: slice::IterMut<'a, T>,
    spill: slice::IterMut<'a, T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        self.inline.next().or_else(|| self.spill.next())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inline.len() + self.spill.len();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.spill.next_back().or_else(|| self.inline.next_back())
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// An iterator that consumes a [`HybridVec`] and yields its items by value.
///
/// # Examples
///
/// ```
/// # use hybridvec::{hybridvec, HybridVec};
/// let vec: HybridVec<&'static str, 2> = hybridvec!["a", "b", "c"];
/// let mut iter = vec.into_iter();
///
/// assert_eq!(iter.next(), Some("a"));
/// let rest: Vec<_> = iter.collect();
/// assert_eq!(rest, ["b", "c"]);
/// ```
pub struct IntoIter<T, const N: usize> {
    vec: ManuallyDrop<HybridVec<T, N>>,
    index: usize,
}

unsafe impl<T: Send, const N: usize> Send for IntoIter<T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for IntoIter<T, N> {}

impl<T, const N: usize> IntoIterator for HybridVec<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            vec: ManuallyDrop::new(self),
            index: 0,
        }
    }
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index < self.vec.len() {
            self.index += 1;
            if T::IS_ZST {
                // SAFETY: T is a ZST.
                Some(unsafe { zst_init() })
            } else {
                // SAFETY: index - 1 < len, and the slot will not be read again.
                Some(unsafe { ptr::read(self.vec.elem_ptr(self.index - 1)) })
            }
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.vec.len() - self.index;
        (len, Some(len))
    }
}

impl<T, const N: usize> DoubleEndedIterator for IntoIter<T, N> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.index >= self.vec.len() {
            return None;
        }
        // Shorten from the back; the lengths keep tracking which slots are
        // still live so the drop glue stays correct.
        if self.vec.spill_len > 0 {
            self.vec.spill_len -= 1;
            if T::IS_ZST {
                // SAFETY: T is a ZST.
                Some(unsafe { zst_init() })
            } else {
                // SAFETY: the slot at the old spill_len - 1 is initialized.
                Some(unsafe { ptr::read(self.vec.spill.as_ptr().add(self.vec.spill_len)) })
            }
        } else {
            self.vec.inline_len -= 1;
            if T::IS_ZST {
                // SAFETY: T is a ZST.
                Some(unsafe { zst_init() })
            } else {
                // SAFETY: the slot at the old inline_len - 1 is initialized.
                Some(unsafe { ptr::read(self.vec.inline_ptr().add(self.vec.inline_len)) })
            }
        }
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {
    #[inline]
    fn len(&self) -> usize {
        self.vec.len() - self.index
    }
}

impl<T, const N: usize> FusedIterator for IntoIter<T, N> {}

impl<T, const N: usize> Drop for IntoIter<T, N> {
    fn drop(&mut self) {
        // SAFETY: the live slots are exactly [index, len); segments are
        // dropped separately, then the allocation is released.
        unsafe {
            let vec = &mut *self.vec;
            let len = vec.len();
            let mut live = self.index;
            if live < vec.inline_len {
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    vec.inline_mut_ptr().add(live),
                    vec.inline_len - live,
                ));
                live = vec.inline_len;
            }
            if live < len {
                let offset = live - vec.inline_len;
                ptr::drop_in_place(slice::from_raw_parts_mut(
                    vec.spill.as_ptr().add(offset),
                    vec.spill_len - offset,
                ));
            }
            if !T::IS_ZST && vec.spill_cap > 0 {
                vec.dealloc_spill();
            }
        }
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for IntoIter<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for index in self.index..self.vec.len() {
            // SAFETY: index < len.
            list.entry(unsafe { &*self.vec.elem_ptr(index) });
        }
        list.finish()
    }
}
