/// Source of uniformly distributed sample indices.
///
/// Every [`rand::Rng`] is a `SampleSource`; tests can implement it directly
/// to script the exact indices that get drawn.
pub trait SampleSource {
    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn sample_index(&mut self, len: usize) -> usize;
}

impl<R: rand::Rng + ?Sized> SampleSource for R {
    #[inline]
    fn sample_index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// Three distinct indices in `0..n` (`n >= 3`) drawn without rejection.
///
/// The second and third draws come from the shrunken ranges `0..n-1` and
/// `0..n-2` and are shifted past the indices already taken.
pub(crate) fn sample_distinct_triple<S: SampleSource + ?Sized>(src: &mut S, n: usize) -> [usize; 3] {
    debug_assert!(n >= 3);
    let i = src.sample_index(n);

    let mut j = src.sample_index(n - 1);
    if j >= i {
        j += 1;
    }

    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let mut k = src.sample_index(n - 2);
    if k >= lo {
        k += 1;
    }
    if k >= hi {
        k += 1;
    }

    [i, j, k]
}
