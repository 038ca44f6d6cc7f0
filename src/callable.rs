//! A function pointer paired with a borrowed context value.
//!
//! This is the vehicle for passing behavior across an abstraction boundary
//! as plain data: a [`Callable`] is two words, a `fn` pointer and a pointer
//! to its context, with no compile-time knowledge of a concrete closure type
//! required on the receiving side.

use core::fmt;

/// A function pointer bundled with the `&mut` context it operates on.
///
/// Calling a `Callable` invokes the function with the captured context as an
/// implicit first argument, followed by the per-call argument. The callable
/// borrows the context rather than owning it, so the borrow must outlive
/// every invocation; the `'ctx` lifetime enforces this.
///
/// There is no independent failure mode: any failure is that of the
/// underlying function.
///
/// A `Callable` is typically constructed right before a traversal call such
/// as [`HybridVec::for_each`](crate::HybridVec::for_each) and discarded
/// afterwards:
///
/// ```
/// # use hybridvec::Callable;
/// fn count_evens(seen: &mut usize, item: &mut i32) {
///     if *item % 2 == 0 {
///         *seen += 1;
///     }
/// }
///
/// let mut seen = 0usize;
/// let mut callable = Callable::new(count_evens, &mut seen);
///
/// callable.call(&mut 4);
/// callable.call(&mut 7);
///
/// drop(callable);
/// assert_eq!(seen, 1);
/// ```
///
/// Non-capturing closures coerce to `fn` pointers, so the function can also
/// be written inline:
///
/// ```
/// # use hybridvec::Callable;
/// let mut total = 0i64;
/// let mut add = Callable::new(|total: &mut i64, item: &mut i64| *total += *item, &mut total);
/// add.call(&mut 40);
/// add.call(&mut 2);
/// # drop(add);
/// assert_eq!(total, 42);
/// ```
pub struct Callable<'ctx, Ctx: ?Sized, Arg: ?Sized, Ret = ()> {
    func: fn(&mut Ctx, &mut Arg) -> Ret,
    context: &'ctx mut Ctx,
}

impl<'ctx, Ctx: ?Sized, Arg: ?Sized, Ret> Callable<'ctx, Ctx, Arg, Ret> {
    /// Pairs `func` with the context it will receive on every call.
    #[inline]
    pub fn new(func: fn(&mut Ctx, &mut Arg) -> Ret, context: &'ctx mut Ctx) -> Self {
        Self { func, context }
    }

    /// Invokes the bundled function with the captured context and `arg`.
    #[inline]
    pub fn call(&mut self, arg: &mut Arg) -> Ret {
        (self.func)(self.context, arg)
    }

    /// A shared view of the captured context.
    #[inline]
    pub fn context(&self) -> &Ctx {
        self.context
    }
}

impl<Ctx: fmt::Debug + ?Sized, Arg: ?Sized, Ret> fmt::Debug for Callable<'_, Ctx, Arg, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
