//! ## Intro
//!
//! A growable sequence container that fills a fixed-size inline buffer first
//! and spills overflow to a separately managed heap buffer.
//!
//! Similar to [`SmallVec`], but the two segments stay live at the same time:
//! once the inline buffer fills up, new elements land on the heap while the
//! first `N` elements remain in place. Nothing is ever migrated, so growing
//! past the inline capacity never moves the elements already stored.
//!
//! This shape comes from language runtimes, where a callee receives a
//! fixed-size region sized by its caller and most sequences never outgrow it.
//! The common case costs zero heap allocations; the uncommon case degrades to
//! an ordinary amortized-doubling vector for the overflow only.
//!
//! ## The container
//!
//! [`HybridVec<T, N>`] keeps up to `N` elements inline and any overflow in a
//! heap buffer that grows by doubling (first allocation
//! [`MIN_SPILL_CAPACITY`] elements) and shrinks with hysteresis as elements
//! are popped:
//!
//! ```
//! # use hybridvec::HybridVec;
//! let mut vec: HybridVec<i32, 4> = HybridVec::new();
//!
//! vec.extend([1, 2, 3, 4]);
//! assert!(!vec.spilled());       // still entirely inline
//!
//! vec.push(5);                   // first element past the inline capacity
//! assert!(vec.spilled());
//! assert_eq!(vec.spill_capacity(), 16);
//! assert_eq!(vec[4], 5);
//!
//! vec.pop();
//! assert!(!vec.spilled());       // empty spill buffers are released
//! ```
//!
//! The two segments are not contiguous in memory, so there is no `Deref` to
//! a single slice; use [`HybridVec::as_slices`] or the iterators instead.
//!
//! ## Traversal without generics
//!
//! [`Callable`] pairs a plain function pointer with a borrowed context value,
//! so traversal logic can cross an abstraction boundary as data rather than
//! as a monomorphized closure:
//!
//! ```
//! # use hybridvec::{Callable, HybridVec};
//! let mut vec: HybridVec<i32, 2> = HybridVec::from([1, 2, 3]);
//!
//! let mut sum = 0i32;
//! vec.for_each(Callable::new(|acc: &mut i32, item: &mut i32| *acc += *item, &mut sum));
//! assert_eq!(sum, 6);
//! ```
//!
//! ## Fallible allocation
//!
//! Every operation that may grow the spill buffer has a `try_` form returning
//! [`AllocError`] and leaving the container untouched on failure:
//! [`try_push`](HybridVec::try_push), [`try_reserve`](HybridVec::try_reserve)
//! and [`try_clone`](HybridVec::try_clone). The plain forms panic on capacity
//! overflow and abort through [`handle_alloc_error`] when the allocator
//! fails, like the standard collections.
//!
//! ## `no_std` support
//!
//! This crate requires only `core` and `alloc`.
//!
//! ## Optional features
//!
//! - `serde` — `Serialize` and `Deserialize` for [`HybridVec`], serialized
//!   as a plain sequence.
//! - `std` — `std::io::Write` for `HybridVec<u8, N>`.
//!
//! [`SmallVec`]: https://docs.rs/smallvec/latest/smallvec
//! [`handle_alloc_error`]: alloc::alloc::handle_alloc_error
#![no_std]

extern crate alloc;

mod utils;

pub mod hybrid_vec;

pub mod callable;

#[cfg(feature = "serde")]
mod serde;

#[cfg(feature = "std")]
mod std_io;

#[doc(inline)]
pub use hybrid_vec::{AllocError, HybridVec, MIN_SPILL_CAPACITY, SHRINK_DIVISOR};

#[doc(inline)]
pub use callable::Callable;
