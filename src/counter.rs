//! Signed counting of normalized Latin rectangles.
//!
//! Rows `2..=r` are drawn from the derangement cache. The search keeps, for every
//! row level still to be placed, a bitmask over that level's admissible cache
//! entries. Placing a row removes (AND-NOT) the position-value masks of its
//! cells from every later level; an emptied level prunes the branch. The last
//! level is never iterated: its contribution is two popcounts against the
//! level's positive/negative sign masks.
//!
//! For `r = n - 1` the completion mode iterates the last level instead and reads
//! off the unique completing row (one missing value per column), giving the
//! `(n, n)` counts in the same pass.

use crate::constraint::{all_values, ConstraintStore};
use crate::derangement::{pack_row, DerangementCache};
use crate::error::{check_dimensions, LatinError, MAX_ORDER};
use crate::first_column::check_first_column;
use crate::mask::IndexMask;
use crate::permutation::identity;
use std::borrow::Cow;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Range};

// ============================================================================
// Signed counts
// ============================================================================

/// Positive/negative rectangle counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SignedCount {
    /// Rectangles of sign `+1`.
    pub positive: u128,
    /// Rectangles of sign `-1`.
    pub negative: u128,
}

impl SignedCount {
    /// Builds a count from its two classes.
    pub const fn new(positive: u128, negative: u128) -> Self {
        Self { positive, negative }
    }

    /// `positive + negative`
    #[inline]
    pub const fn total(&self) -> u128 {
        self.positive + self.negative
    }

    /// `positive - negative`
    #[inline]
    pub fn difference(&self) -> i128 {
        self.positive as i128 - self.negative as i128
    }

    /// Both classes multiplied by `factor`.
    #[inline]
    pub const fn scaled(self, factor: u128) -> Self {
        Self { positive: self.positive * factor, negative: self.negative * factor }
    }

    /// Adds one rectangle of the given sign.
    #[inline(always)]
    pub fn add_one(&mut self, sign: i8) {
        if sign > 0 {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
    }

    /// Adds `plus` rectangles whose last row is even and `minus` whose last row is
    /// odd, under a running sign `sign` for the rows above.
    #[inline(always)]
    fn add_split(&mut self, sign: i8, plus: u128, minus: u128) {
        if sign > 0 {
            self.positive += plus;
            self.negative += minus;
        } else {
            self.positive += minus;
            self.negative += plus;
        }
    }
}

impl AddAssign for SignedCount {
    fn add_assign(&mut self, rhs: Self) {
        self.positive += rhs.positive;
        self.negative += rhs.negative;
    }
}

impl Add for SignedCount {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for SignedCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Counts for `(n-1, n)` rectangles and their `(n, n)` completions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompletionCount {
    /// The `(r, n)` rectangles.
    pub rectangles: SignedCount,
    /// Their completions to `(r + 1, n)`.
    pub completed: SignedCount,
}

impl CompletionCount {
    /// Both halves multiplied by `factor`.
    #[inline]
    pub const fn scaled(self, factor: u128) -> Self {
        Self { rectangles: self.rectangles.scaled(factor), completed: self.completed.scaled(factor) }
    }

    /// Whether every rectangle received exactly one completion.
    #[inline]
    pub const fn is_bijective(&self) -> bool {
        self.rectangles.total() == self.completed.total()
    }
}

impl AddAssign for CompletionCount {
    fn add_assign(&mut self, rhs: Self) {
        self.rectangles += rhs.rectangles;
        self.completed += rhs.completed;
    }
}

impl Add for CompletionCount {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for CompletionCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

// ============================================================================
// Level tables
// ============================================================================

/// Admissible cache entries for one row level, re-indexed from zero.
///
/// The unrestricted table borrows the cache's own masks; a restricted one (a
/// fixed first value or a pinned row) is rebuilt once per call over its range.
struct LevelTable<'a> {
    offset: usize,
    len: usize,
    conflicts: Cow<'a, [IndexMask]>,
    positive: Cow<'a, IndexMask>,
    negative: Cow<'a, IndexMask>,
}

impl<'a> LevelTable<'a> {
    fn new(cache: &'a DerangementCache, range: Range<usize>) -> Self {
        let n = cache.n();
        if range == (0..cache.len()) {
            return Self {
                offset: 0,
                len: cache.len(),
                conflicts: Cow::Borrowed(cache.position_value_index()),
                positive: Cow::Borrowed(cache.positive_mask()),
                negative: Cow::Borrowed(cache.negative_mask()),
            };
        }

        let len = range.len();
        let mut conflicts = vec![IndexMask::zeros(len); n * n];
        let mut positive = IndexMask::zeros(len);
        let mut negative = IndexMask::zeros(len);
        for (local, global) in range.clone().enumerate() {
            for (col, &v) in cache.row(global).iter().enumerate() {
                conflicts[col * n + usize::from(v) - 1].set(local);
            }
            if cache.sign(global) > 0 {
                positive.set(local);
            } else {
                negative.set(local);
            }
        }
        Self {
            offset: range.start,
            len,
            conflicts: Cow::Owned(conflicts),
            positive: Cow::Owned(positive),
            negative: Cow::Owned(negative),
        }
    }

    #[inline(always)]
    fn conflict(&self, n: usize, col: usize, value: u8) -> &IndexMask {
        &self.conflicts[col * n + usize::from(value) - 1]
    }
}

// ============================================================================
// RectangleCounter
// ============================================================================

/// Counting engine bound to one derangement cache.
///
/// Reuse one counter for many `(r, first_column)` calls with the same `n`; it
/// holds no mutable state, so it can be shared between threads.
#[derive(Clone, Copy, Debug)]
pub struct RectangleCounter<'a> {
    cache: &'a DerangementCache,
}

impl<'a> RectangleCounter<'a> {
    /// Binds a counter to `cache`.
    pub fn new(cache: &'a DerangementCache) -> Self {
        Self { cache }
    }

    /// The cache this counter draws rows from.
    pub fn cache(&self) -> &'a DerangementCache {
        self.cache
    }

    /// Counts `(r, n)` rectangles, optionally with a prescribed canonical first column.
    ///
    /// # Errors
    /// Invalid dimensions, `r > 10`, or an invalid first column.
    pub fn count(&self, r: usize, first_column: Option<&[u8]>) -> Result<SignedCount, LatinError> {
        let ranges = self.plan(r, first_column, None)?;
        Ok(self.search(&ranges, false)?.rectangles)
    }

    /// Counts `(n-1, n)` rectangles together with their `(n, n)` completions.
    ///
    /// # Errors
    /// As [`RectangleCounter::count`], plus
    /// [`LatinError::CompletionRequiresPenultimate`] when `r != n - 1` and
    /// [`LatinError::CompletionNotFound`] if a derived completion row is not a
    /// cached derangement.
    pub fn count_with_completion(
        &self,
        r: usize,
        first_column: Option<&[u8]>,
    ) -> Result<CompletionCount, LatinError> {
        self.require_penultimate(r)?;
        let ranges = self.plan(r, first_column, None)?;
        self.search(&ranges, true)
    }

    /// Counts `(r, n)` rectangles whose second row is cache entry `index`.
    ///
    /// Summing over every index gives [`RectangleCounter::count`] with no first
    /// column.
    ///
    /// # Errors
    /// As [`RectangleCounter::count`], plus [`LatinError::InvalidPartition`] if
    /// `index` is out of range.
    pub fn count_with_second_row(&self, r: usize, index: usize) -> Result<SignedCount, LatinError> {
        let ranges = self.plan(r, None, Some(index))?;
        Ok(self.search(&ranges, false)?.rectangles)
    }

    /// Completion counting restricted to second row `index`.
    ///
    /// # Errors
    /// As [`RectangleCounter::count_with_completion`] and
    /// [`RectangleCounter::count_with_second_row`].
    pub fn count_with_second_row_completion(
        &self,
        r: usize,
        index: usize,
    ) -> Result<CompletionCount, LatinError> {
        self.require_penultimate(r)?;
        let ranges = self.plan(r, None, Some(index))?;
        self.search(&ranges, true)
    }

    fn require_penultimate(&self, r: usize) -> Result<(), LatinError> {
        let n = self.cache.n();
        check_dimensions(r, n)?;
        if r + 1 != n {
            return Err(LatinError::CompletionRequiresPenultimate { r, n });
        }
        Ok(())
    }

    /// Cache index range admissible at each row level `1..r`.
    fn plan(
        &self,
        r: usize,
        first_column: Option<&[u8]>,
        second_row: Option<usize>,
    ) -> Result<Vec<Range<usize>>, LatinError> {
        let n = self.cache.n();
        check_dimensions(r, n)?;
        let full = 0..self.cache.len();
        let mut ranges = vec![full; r - 1];

        if let Some(column) = first_column {
            check_first_column(column, r, n)?;
            for (range, &value) in ranges.iter_mut().zip(&column[1..]) {
                *range = self.cache.first_value_range(value);
            }
        }
        if let Some(index) = second_row {
            if index >= self.cache.len() {
                return Err(LatinError::InvalidPartition(format!(
                    "second-row index {index} out of range (cache has {} rows)",
                    self.cache.len()
                )));
            }
            ranges[0] = index..index + 1;
        }
        Ok(ranges)
    }

    /// Depth-first search over row levels with an explicit frame stack.
    ///
    /// `frames[d][j]` holds the candidates of level `j` (for `j >= d`) once levels
    /// `0..d` are placed. The constraint store mirrors the placed rows so the
    /// completion row can be read off its column masks.
    fn search(&self, ranges: &[Range<usize>], completion: bool) -> Result<CompletionCount, LatinError> {
        let cache = self.cache;
        let n = cache.n();
        let levels: Vec<LevelTable<'_>> =
            ranges.iter().map(|range| LevelTable::new(cache, range.clone())).collect();
        let depth_count = levels.len();
        let last = depth_count - 1;
        let mut tally = CompletionCount::default();

        let mut frames: Vec<Vec<IndexMask>> = (0..depth_count)
            .map(|_| levels.iter().map(|t| IndexMask::zeros(t.len)).collect())
            .collect();
        for (mask, table) in frames[0].iter_mut().zip(&levels) {
            *mask = IndexMask::ones(table.len);
        }
        if frames[0].iter().any(IndexMask::is_empty) {
            return Ok(tally);
        }

        let mut store = ConstraintStore::with_row(&identity(n));
        let mut cursor = vec![0usize; depth_count];
        let mut signs = vec![1i8; depth_count];
        let mut placed: Vec<Option<usize>> = vec![None; depth_count];
        let mut d = 0usize;

        loop {
            if d == last {
                self.resolve_last(&levels[d], &frames[d][d], signs[d], &store, completion, &mut tally)?;
                if d == 0 {
                    break;
                }
                d -= 1;
                continue;
            }

            if let Some(prev) = placed[d].take() {
                store.remove_row_constraints(cache.row(prev));
            }
            let Some(local) = frames[d][d].next_one(cursor[d]) else {
                if d == 0 {
                    break;
                }
                d -= 1;
                continue;
            };
            cursor[d] = local + 1;

            let global = levels[d].offset + local;
            let row = cache.row(global);
            store.add_row_constraints(row);
            placed[d] = Some(global);

            let (head, tail) = frames.split_at_mut(d + 1);
            let (current, next) = (&head[d], &mut tail[0]);
            let mut alive = true;
            for j in (d + 1)..depth_count {
                let table = &levels[j];
                let mask = &mut next[j];
                mask.copy_from(&current[j]);
                for (col, &v) in row.iter().enumerate() {
                    mask.and_not_assign(table.conflict(n, col, v));
                }
                if mask.is_empty() {
                    alive = false;
                    break;
                }
            }
            if !alive {
                continue;
            }

            signs[d + 1] = signs[d] * cache.sign(global);
            d += 1;
            cursor[d] = 0;
        }

        Ok(tally)
    }

    /// Accounts for every candidate of the last level.
    fn resolve_last(
        &self,
        table: &LevelTable<'_>,
        candidates: &IndexMask,
        sign: i8,
        store: &ConstraintStore,
        completion: bool,
        tally: &mut CompletionCount,
    ) -> Result<(), LatinError> {
        if !completion {
            let plus = candidates.count_and(&table.positive) as u128;
            let minus = candidates.count_and(&table.negative) as u128;
            tally.rectangles.add_split(sign, plus, minus);
            return Ok(());
        }

        let cache = self.cache;
        let n = cache.n();
        let all = all_values(n);
        let mut completion_row = [0u8; MAX_ORDER];
        for local in candidates.iter_ones() {
            let global = table.offset + local;
            let row = cache.row(global);
            let rect_sign = sign * cache.sign(global);
            tally.rectangles.add_one(rect_sign);

            for (col, &v) in row.iter().enumerate() {
                let missing = all & !(store.column_mask(col) | (1u32 << (v - 1)));
                debug_assert_eq!(missing.count_ones(), 1, "column {col} must have one missing value");
                completion_row[col] = missing.trailing_zeros() as u8 + 1;
            }
            let completion_row = &completion_row[..n];
            let valid = completion_row.iter().all(|&v| usize::from(v) <= n);
            let index = if valid { cache.index_of_key(pack_row(completion_row)) } else { None };
            let Some(index) = index else {
                return Err(LatinError::CompletionNotFound { row: completion_row.to_vec() });
            };
            tally.completed.add_one(rect_sign * cache.sign(index));
        }
        Ok(())
    }
}

// ============================================================================
// Free-function entry points
// ============================================================================

fn with_cache<T>(
    n: usize,
    cache: Option<&DerangementCache>,
    f: impl FnOnce(RectangleCounter<'_>) -> Result<T, LatinError>,
) -> Result<T, LatinError> {
    match cache {
        Some(c) if c.n() != n => Err(LatinError::CacheMismatch { expected: n, got: c.n() }),
        Some(c) => f(RectangleCounter::new(c)),
        None => {
            let owned = DerangementCache::build(n)?;
            f(RectangleCounter::new(&owned))
        }
    }
}

/// Counts `(r, n)` normalized rectangles by sign.
///
/// With `first_column`, only rectangles with that first column are counted; the
/// caller applies the symmetry factor. A missing `cache` is built on the fly.
///
/// # Errors
/// Invalid dimensions, `r > 10`, an invalid first column, or a cache built for a
/// different `n`.
pub fn count_rectangles(
    r: usize,
    n: usize,
    first_column: Option<&[u8]>,
    cache: Option<&DerangementCache>,
) -> Result<SignedCount, LatinError> {
    check_dimensions(r, n)?;
    with_cache(n, cache, |counter| counter.count(r, first_column))
}

/// Counts `(n-1, n)` rectangles and their `(n, n)` completions in one pass.
///
/// # Errors
/// As [`count_rectangles`], plus [`LatinError::CompletionRequiresPenultimate`] and
/// [`LatinError::CompletionNotFound`].
pub fn count_rectangles_with_completion(
    r: usize,
    n: usize,
    first_column: Option<&[u8]>,
    cache: Option<&DerangementCache>,
) -> Result<CompletionCount, LatinError> {
    check_dimensions(r, n)?;
    if r + 1 != n {
        return Err(LatinError::CompletionRequiresPenultimate { r, n });
    }
    with_cache(n, cache, |counter| counter.count_with_completion(r, first_column))
}

/// Counts `(r, n)` rectangles whose second row is derangement-cache entry `index`.
///
/// # Errors
/// As [`count_rectangles`], plus [`LatinError::InvalidPartition`] for an
/// out-of-range index.
pub fn count_rectangles_with_second_row(
    r: usize,
    n: usize,
    index: usize,
    cache: Option<&DerangementCache>,
) -> Result<SignedCount, LatinError> {
    check_dimensions(r, n)?;
    with_cache(n, cache, |counter| counter.count_with_second_row(r, index))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_column::{enumerate_first_columns, get_symmetry_factor};
    use crate::rectangle::enumerate_normalized;

    fn brute(r: usize, n: usize) -> SignedCount {
        let mut count = SignedCount::default();
        for rect in enumerate_normalized(r, n).unwrap() {
            count.add_one(rect.compute_sign());
        }
        count
    }

    #[test]
    fn known_small_totals() {
        for (r, n, total) in [(2, 2, 1), (2, 3, 2), (2, 4, 9), (3, 3, 2), (3, 4, 24), (4, 4, 24), (5, 5, 1344)] {
            let count = count_rectangles(r, n, None, None).unwrap();
            assert_eq!(count.total(), total, "({r},{n})");
        }
    }

    #[test]
    fn two_row_signs() {
        assert_eq!(count_rectangles(2, 2, None, None).unwrap(), SignedCount::new(0, 1));
        assert_eq!(count_rectangles(2, 3, None, None).unwrap(), SignedCount::new(2, 0));
        assert_eq!(count_rectangles(2, 4, None, None).unwrap(), SignedCount::new(3, 6));
        assert_eq!(count_rectangles(3, 3, None, None).unwrap(), SignedCount::new(2, 0));
    }

    #[test]
    fn two_row_count_is_cache_sign_split() {
        for n in 2..=7 {
            let cache = DerangementCache::build(n).unwrap();
            let count = count_rectangles(2, n, None, Some(&cache)).unwrap();
            let plus = cache.entries().filter(|&(_, s)| s > 0).count() as u128;
            let minus = cache.entries().filter(|&(_, s)| s < 0).count() as u128;
            assert_eq!(count, SignedCount::new(plus, minus));
        }
    }

    #[test]
    fn matches_brute_force_enumeration() {
        for n in 2..=5 {
            for r in 2..=n {
                assert_eq!(count_rectangles(r, n, None, None).unwrap(), brute(r, n), "({r},{n})");
            }
        }
        assert_eq!(count_rectangles(3, 6, None, None).unwrap(), brute(3, 6));
    }

    #[test]
    fn canonical_columns_times_symmetry_factor_give_full_count() {
        for (r, n) in [(2, 4), (3, 4), (3, 5), (4, 5), (5, 5), (3, 6), (4, 6)] {
            let cache = DerangementCache::build(n).unwrap();
            let counter = RectangleCounter::new(&cache);
            let factor = get_symmetry_factor(r).unwrap();
            let canonical: SignedCount = enumerate_first_columns(r, n)
                .unwrap()
                .iter()
                .map(|col| counter.count(r, Some(col.as_slice())).unwrap().scaled(factor))
                .sum();
            assert_eq!(canonical, counter.count(r, None).unwrap(), "({r},{n})");
        }
    }

    #[test]
    fn three_by_four_canonical_totals() {
        let cols = enumerate_first_columns(3, 4).unwrap();
        let total: u128 = cols
            .iter()
            .map(|c| count_rectangles(3, 4, Some(c.as_slice()), None).unwrap().total())
            .sum();
        assert_eq!(total * get_symmetry_factor(3).unwrap(), 24);
    }

    #[test]
    fn completion_is_a_bijection() {
        for n in 3..=6 {
            let r = n - 1;
            let cache = DerangementCache::build(n).unwrap();
            let counter = RectangleCounter::new(&cache);
            let factor = get_symmetry_factor(r).unwrap();
            let both: CompletionCount = enumerate_first_columns(r, n)
                .unwrap()
                .iter()
                .map(|col| counter.count_with_completion(r, Some(col.as_slice())).unwrap().scaled(factor))
                .sum();
            assert!(both.is_bijective(), "n={n}: {both:?}");
            assert_eq!(both.rectangles, counter.count(r, None).unwrap(), "n={n}");
        }
    }

    #[test]
    fn completed_counts_equal_direct_square_counts() {
        for n in 3..=5 {
            let both = count_rectangles_with_completion(n - 1, n, None, None).unwrap();
            assert_eq!(both.completed, count_rectangles(n, n, None, None).unwrap(), "n={n}");
            assert_eq!(both.completed, brute(n, n), "n={n}");
        }
    }

    #[test]
    fn six_by_six_via_completion() {
        let cache = DerangementCache::build(6).unwrap();
        let counter = RectangleCounter::new(&cache);
        let direct = counter.count(6, Some(&[1, 2, 3, 4, 5, 6][..])).unwrap().scaled(get_symmetry_factor(6).unwrap());
        assert_eq!(direct.total(), 1_128_960);
        let factor = get_symmetry_factor(5).unwrap();
        let via: CompletionCount = enumerate_first_columns(5, 6)
            .unwrap()
            .iter()
            .map(|c| counter.count_with_completion(5, Some(c.as_slice())).unwrap().scaled(factor))
            .sum();
        assert_eq!(via.completed, direct);
        assert_eq!(via.rectangles.total(), 1_128_960);
    }

    #[test]
    fn first_column_count_matches_brute_force() {
        for (r, n) in [(3, 4), (3, 5), (4, 5)] {
            let all = enumerate_normalized(r, n).unwrap();
            for col in enumerate_first_columns(r, n).unwrap() {
                let mut want = SignedCount::default();
                for rect in all.iter().filter(|rect| (0..r).all(|i| rect.get(i, 0) == col[i])) {
                    want.add_one(rect.compute_sign());
                }
                assert_eq!(count_rectangles(r, n, Some(col.as_slice()), None).unwrap(), want, "{col:?}");
            }
        }
    }

    #[test]
    fn second_row_partition_sums_to_total() {
        for (r, n) in [(2, 4), (3, 5), (4, 5)] {
            let cache = DerangementCache::build(n).unwrap();
            let counter = RectangleCounter::new(&cache);
            let sum: SignedCount =
                (0..cache.len()).map(|i| counter.count_with_second_row(r, i).unwrap()).sum();
            assert_eq!(sum, counter.count(r, None).unwrap(), "({r},{n})");
        }
        let cache = DerangementCache::build(5).unwrap();
        let counter = RectangleCounter::new(&cache);
        let sum: CompletionCount =
            (0..cache.len()).map(|i| counter.count_with_second_row_completion(4, i).unwrap()).sum();
        assert!(sum.is_bijective());
        assert_eq!(sum.completed.total(), 1344);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(count_rectangles(1, 4, None, None), Err(LatinError::InvalidDimension { r: 1, n: 4 }));
        assert_eq!(count_rectangles(5, 4, None, None), Err(LatinError::InvalidDimension { r: 5, n: 4 }));
        assert_eq!(count_rectangles(11, 12, None, None), Err(LatinError::UnsupportedDepth { r: 11 }));
        assert!(matches!(
            count_rectangles(3, 4, Some(&[1, 3, 2][..]), None),
            Err(LatinError::InvalidFirstColumn { .. })
        ));
        assert!(matches!(
            count_rectangles(3, 4, Some(&[1, 2][..]), None),
            Err(LatinError::InvalidFirstColumn { .. })
        ));
        let cache = DerangementCache::build(5).unwrap();
        assert_eq!(
            count_rectangles(3, 4, None, Some(&cache)),
            Err(LatinError::CacheMismatch { expected: 4, got: 5 })
        );
        assert_eq!(
            count_rectangles_with_completion(3, 5, None, None),
            Err(LatinError::CompletionRequiresPenultimate { r: 3, n: 5 })
        );
        assert!(matches!(
            count_rectangles_with_second_row(3, 5, 44, Some(&cache)),
            Err(LatinError::InvalidPartition(_))
        ));
    }

    #[test]
    fn counter_is_reusable_and_deterministic() {
        let cache = DerangementCache::build(5).unwrap();
        let counter = RectangleCounter::new(&cache);
        let a = counter.count(4, Some(&[1, 2, 3, 4][..])).unwrap();
        let b = counter.count(4, Some(&[1, 2, 3, 4][..])).unwrap();
        assert_eq!(a, b);
        assert!(std::ptr::eq(counter.cache(), &cache));
    }

    #[test]
    fn signed_count_arithmetic() {
        let a = SignedCount::new(5, 3);
        let b = SignedCount::new(1, 4);
        assert_eq!(a + b, SignedCount::new(6, 7));
        assert_eq!(a.total(), 8);
        assert_eq!(b.difference(), -3);
        assert_eq!(a.scaled(3), SignedCount::new(15, 9));
        let mut c = SignedCount::default();
        c.add_split(-1, 2, 7);
        assert_eq!(c, SignedCount::new(7, 2));
        assert_eq!([a, b, c].into_iter().sum::<SignedCount>(), SignedCount::new(13, 9));
    }

    #[test]
    fn inconsistent_completion_is_an_error() {
        let cache = DerangementCache::build(3).unwrap();
        let counter = RectangleCounter::new(&cache);
        assert_eq!(cache.row(0), &[2, 3, 1]);

        let full = LevelTable::new(&cache, 0..cache.len());
        let mut only_first = IndexMask::zeros(full.len);
        only_first.set(0);

        let mut tally = CompletionCount::default();
        let identity_store = ConstraintStore::with_row(&identity(3));
        counter.resolve_last(&full, &only_first, 1, &identity_store, true, &mut tally).unwrap();
        assert_eq!(tally.completed, SignedCount::new(1, 0));

        // Placed rows [3,1,2] then [2,3,1] force the identity as the last row.
        let mut tally = CompletionCount::default();
        let store = ConstraintStore::with_row(&[3, 1, 2]);
        let err = counter.resolve_last(&full, &only_first, 1, &store, true, &mut tally).unwrap_err();
        assert_eq!(err, LatinError::CompletionNotFound { row: vec![1, 2, 3] });

        // Same through a restricted level whose local index 0 is cache entry 1.
        let tail = LevelTable::new(&cache, 1..2);
        assert_eq!(tail.offset, 1);
        let store = ConstraintStore::with_row(&[2, 3, 1]);
        let err = counter
            .resolve_last(&tail, &IndexMask::ones(tail.len), 1, &store, true, &mut CompletionCount::default())
            .unwrap_err();
        assert_eq!(err, LatinError::CompletionNotFound { row: vec![1, 2, 3] });
    }
}
