//! See `README.md`

use core::hint;
use criterion::{criterion_group, criterion_main, Bencher, Criterion};
use hybridvec::HybridVec;
use smallvec::SmallVec;
use std::sync::OnceLock;

use rand::Rng;

const SMALL_SIZE: usize = 16;
const LARGE_SIZE: usize = 40000;

/// A function used to generate a random amount of data.
///
/// We use random data to simulate real-world scenarios and
/// avoid excessive optimization by the compiler when it knows the context.
#[inline(never)]
fn gen_one(start: usize, end: usize) -> usize {
    let mut rng = rand::rng();
    rng.random_range(start..end)
}

/// The amount of data used in small data testing,
/// randomly generated so the compiler cannot specialize on an exact length.
static SMALL_BOUND: OnceLock<usize> = OnceLock::new();

/// The amount of data used in large data testing,
/// randomly generated so the compiler cannot specialize on an exact length.
static LARGE_BOUND: OnceLock<usize> = OnceLock::new();

/// Generate an array of random content of a specified length.
#[inline(never)]
fn gen_rand(len: usize, start: u64, end: u64) -> Box<[u64]> {
    let mut rng = rand::rng();
    let mut vec: Vec<u64> = Vec::with_capacity(len);
    for _ in 0..len {
        vec.push(rng.random_range(start..end));
    }
    vec.into_boxed_slice()
}

/// The operations every contestant shares.
trait VecLike {
    fn new_empty() -> Self;
    fn with_room(capacity: usize) -> Self;
    fn push(&mut self, value: u64);
    fn pop(&mut self) -> Option<u64>;
    fn swap_remove(&mut self, index: usize) -> u64;
    fn index_mut(&mut self, index: usize) -> &mut u64;
}

impl VecLike for Vec<u64> {
    #[inline(always)]
    fn new_empty() -> Self {
        Self::new()
    }
    #[inline(always)]
    fn with_room(capacity: usize) -> Self {
        Self::with_capacity(capacity)
    }
    #[inline(always)]
    fn push(&mut self, value: u64) {
        Vec::push(self, value)
    }
    #[inline(always)]
    fn pop(&mut self) -> Option<u64> {
        Vec::pop(self)
    }
    #[inline(always)]
    fn swap_remove(&mut self, index: usize) -> u64 {
        Vec::swap_remove(self, index)
    }
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut u64 {
        &mut self[index]
    }
}

impl VecLike for SmallVec<[u64; SMALL_SIZE]> {
    #[inline(always)]
    fn new_empty() -> Self {
        Self::new()
    }
    #[inline(always)]
    fn with_room(capacity: usize) -> Self {
        Self::with_capacity(capacity)
    }
    #[inline(always)]
    fn push(&mut self, value: u64) {
        SmallVec::push(self, value)
    }
    #[inline(always)]
    fn pop(&mut self) -> Option<u64> {
        SmallVec::pop(self)
    }
    #[inline(always)]
    fn swap_remove(&mut self, index: usize) -> u64 {
        SmallVec::swap_remove(self, index)
    }
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut u64 {
        &mut self[index]
    }
}

impl VecLike for HybridVec<u64, SMALL_SIZE> {
    #[inline(always)]
    fn new_empty() -> Self {
        Self::new()
    }
    #[inline(always)]
    fn with_room(capacity: usize) -> Self {
        Self::with_capacity(capacity)
    }
    #[inline(always)]
    fn push(&mut self, value: u64) {
        HybridVec::push(self, value)
    }
    #[inline(always)]
    fn pop(&mut self) -> Option<u64> {
        HybridVec::pop(self)
    }
    #[inline(always)]
    fn swap_remove(&mut self, index: usize) -> u64 {
        HybridVec::swap_remove(self, index)
    }
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut u64 {
        &mut self[index]
    }
}

macro_rules! gen_bench_group {
    ($c:ident => $fn_name:ident) => {{
        let mut group = $c.benchmark_group(stringify!($fn_name));
        group.bench_function("Vec", |b| $fn_name::<Vec<u64>>(b));
        group.bench_function("HybridVec", |b| $fn_name::<HybridVec<u64, SMALL_SIZE>>(b));
        group.bench_function("SmallVec", |b| $fn_name::<SmallVec<[u64; SMALL_SIZE]>>(b));
    }};
}

fn bench_vec(c: &mut Criterion) {
    SMALL_BOUND.get_or_init(|| gen_one(14, 16));
    LARGE_BOUND.get_or_init(|| gen_one(36000, 36003));
    gen_bench_group!(c => new_empty);
    gen_bench_group!(c => new_small);
    gen_bench_group!(c => new_large);
    gen_bench_group!(c => push_small_from_empty);
    gen_bench_group!(c => push_large_from_empty);
    gen_bench_group!(c => push_large_prealloc);
    gen_bench_group!(c => push_pop_cycle_small);
    gen_bench_group!(c => push_pop_cycle_large);
    gen_bench_group!(c => swap_remove_small);
    gen_bench_group!(c => index_small);
    gen_bench_group!(c => index_large);
}

/// Creation time of an empty vector. No heap memory is requested, so this
/// should be uniformly fast.
#[inline(never)]
fn new_empty<T: VecLike>(b: &mut Bencher) {
    b.iter(|| hint::black_box(T::new_empty()));
}

/// Creation time with capacity `16`. Only `Vec` needs heap memory; the
/// inline-buffer containers satisfy this from their fixed segment.
#[inline(never)]
fn new_small<T: VecLike>(b: &mut Bencher) {
    b.iter(|| hint::black_box(T::with_room(SMALL_SIZE)));
}

/// Creation time with capacity `40000`. Every contestant allocates.
#[inline(never)]
fn new_large<T: VecLike>(b: &mut Bencher) {
    b.iter(|| hint::black_box(T::with_room(LARGE_SIZE)));
}

/// Pushes that fit the inline segment, no preallocation. Only `Vec` has to
/// touch the heap.
///
/// The data volume is 14-15.
#[inline(never)]
fn push_small_from_empty<T: VecLike>(b: &mut Bencher) {
    let data = gen_rand(*SMALL_BOUND.get().unwrap(), 0, 9999);
    let index = gen_one(0, *SMALL_BOUND.get().unwrap());

    b.iter(|| {
        let mut vec = T::new_empty();
        // Randomly collect internal data to avoid
        // compiler optimization of these non output codes.
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        counter += *vec.index_mut(index);
        hint::black_box(counter)
    });
}

/// Pushes far past the inline segment; all contestants grow by doubling.
///
/// The data volume is 36000-36002.
#[inline(never)]
fn push_large_from_empty<T: VecLike>(b: &mut Bencher) {
    let data = gen_rand(*LARGE_BOUND.get().unwrap(), 0, 9999);
    let index = gen_rand(10, 0, *LARGE_BOUND.get().unwrap() as _);

    b.iter(|| {
        let mut vec = T::new_empty();
        // Randomly collect internal data to avoid
        // compiler optimization of these non output codes.
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        for item in &index {
            counter += *vec.index_mut(*item as usize);
        }
        hint::black_box(counter)
    });
}

/// Pushes into a fully preallocated vector; no contestant reallocates
/// during the loop, isolating the per-push cost.
///
/// The data volume is 36000-36002.
#[inline(never)]
fn push_large_prealloc<T: VecLike>(b: &mut Bencher) {
    let data = gen_rand(*LARGE_BOUND.get().unwrap(), 0, 9999);
    let index = gen_rand(10, 0, *LARGE_BOUND.get().unwrap() as _);

    b.iter(|| {
        let mut vec = T::with_room(LARGE_SIZE);
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        for item in &index {
            counter += *vec.index_mut(*item as usize);
        }
        hint::black_box(counter)
    });
}

/// A full push-then-drain cycle within the inline segment.
///
/// The data volume is 14-15.
#[inline(never)]
fn push_pop_cycle_small<T: VecLike>(b: &mut Bencher) {
    let data = gen_rand(*SMALL_BOUND.get().unwrap(), 0, 9999);

    b.iter(|| {
        let mut vec = T::new_empty();
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        while let Some(value) = vec.pop() {
            counter += value;
        }
        hint::black_box(counter)
    });
}

/// A full push-then-drain cycle through the spill segment; for `HybridVec`
/// this also exercises the shrink hysteresis on the way down.
///
/// The data volume is 36000-36002.
#[inline(never)]
fn push_pop_cycle_large<T: VecLike>(b: &mut Bencher) {
    let data = gen_rand(*LARGE_BOUND.get().unwrap(), 0, 9999);

    b.iter(|| {
        let mut vec = T::new_empty();
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        while let Some(value) = vec.pop() {
            counter += value;
        }
        hint::black_box(counter)
    });
}

/// Unordered removal from random positions.
///
/// The data volume is 14-15.
#[inline(never)]
fn swap_remove_small<T: VecLike>(b: &mut Bencher) {
    let num = *SMALL_BOUND.get().unwrap();
    let data = gen_rand(num, 0, 9999);

    b.iter(|| {
        let mut vec = T::new_empty();
        let mut counter = 0u64;
        for item in &data {
            vec.push(*item);
        }
        counter += vec.swap_remove((num + 4) % 12);
        counter += vec.swap_remove((num + 7) % 11);
        counter += vec.swap_remove((num + 9) % 10);
        counter += vec.swap_remove((num + 14) % 9);
        hint::black_box(counter)
    });
}

/// Random index access within the inline segment.
#[inline(never)]
fn index_small<T: VecLike>(b: &mut Bencher) {
    let mut vec = T::new_empty();
    for item in &gen_rand(SMALL_SIZE, 0, 9999) {
        vec.push(*item);
    }

    let index = gen_one(0, SMALL_SIZE);
    let range = gen_rand(10, 0, SMALL_SIZE as _);

    b.iter(|| {
        let mut counter = 0u64;
        for item in &range {
            *vec.index_mut(*item as usize) += *item;
        }
        counter += *vec.index_mut(index);
        hint::black_box(counter)
    });
}

/// Random index access dominated by the spill segment, so `HybridVec` pays
/// its segment-dispatch branch on most accesses.
#[inline(never)]
fn index_large<T: VecLike>(b: &mut Bencher) {
    let mut vec = T::new_empty();
    for item in &gen_rand(36000, 0, 9999) {
        vec.push(*item);
    }

    let index = gen_one(0, 36000);
    let range = gen_rand(2000, 0, 36000);

    b.iter(|| {
        let mut counter = 0u64;
        for item in &range {
            *vec.index_mut(*item as usize) += *item;
        }
        counter += *vec.index_mut(index);
        hint::black_box(counter)
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(500)
        .warm_up_time(core::time::Duration::from_secs(3))
        .measurement_time(core::time::Duration::from_secs(12))
        .confidence_level(0.96)
        .noise_threshold(0.04);
    targets = bench_vec,
}
criterion_main!(benches);
