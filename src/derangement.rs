//! Per-order cache of every row-2 candidate (derangement) with its sign and the
//! reverse indices the counting engine intersects against.
//!
//! Index `i` of the cache is the canonical address of a derangement everywhere
//! else in the crate: position-value masks, sign masks and level tables all
//! refer to entries by this index. Entries are in lexicographic order, so the
//! same `n` always yields the same indices.

use crate::constraint::{generate_constrained_permutations_bitset, ConstraintStore};
use crate::error::{LatinError, MAX_ORDER};
use crate::mask::IndexMask;
use crate::permutation::{count_derangements, identity, sign};
use std::collections::HashMap;
use std::ops::Range;

/// Packs a row into a `u64`, four bits per cell (`value - 1`).
#[inline]
pub(crate) fn pack_row(row: &[u8]) -> u64 {
    debug_assert!(row.len() <= MAX_ORDER);
    row.iter().fold(0u64, |key, &v| (key << 4) | u64::from(v - 1))
}

// ============================================================================
// DerangementCache
// ============================================================================

/// All derangements of `[1..n]` with signs, position-value index and sign masks.
///
/// Immutable after [`DerangementCache::build`]; `Sync`, so one instance can be
/// shared by reference across worker threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerangementCache {
    n: usize,
    /// Row-major cells, `n` per entry.
    rows: Vec<u8>,
    signs: Vec<i8>,
    /// `position_value[col * n + (value - 1)]`: entries with `value` at `col`.
    position_value: Vec<IndexMask>,
    positive: IndexMask,
    negative: IndexMask,
    lookup: HashMap<u64, u32>,
}

/// Builds the derangement cache for order `n`.
///
/// # Errors
/// See [`DerangementCache::build`].
pub fn build_derangement_cache(n: usize) -> Result<DerangementCache, LatinError> {
    DerangementCache::build(n)
}

impl DerangementCache {
    /// Enumerates the derangements of `[1..n]` through a constraint store seeded
    /// with the identity row and indexes them.
    ///
    /// # Errors
    /// - [`LatinError::InvalidOrder`] if `n < 1`.
    /// - [`LatinError::DimensionTooLarge`] if `n > MAX_ORDER`.
    /// - [`LatinError::CacheInvariant`] if the number of generated rows differs from
    ///   `count_derangements(n)`.
    pub fn build(n: usize) -> Result<Self, LatinError> {
        if n < 1 {
            return Err(LatinError::InvalidOrder { n });
        }
        if n > MAX_ORDER {
            return Err(LatinError::DimensionTooLarge { n });
        }

        let mut store = ConstraintStore::try_new(n)?;
        store.add_row_constraints(&identity(n));
        let perms = generate_constrained_permutations_bitset(n, &store);
        let expected = count_derangements(n);
        if perms.len() as u128 != expected {
            return Err(LatinError::CacheInvariant { n, expected, got: perms.len() });
        }

        let len = perms.len();
        let mut rows = Vec::with_capacity(len * n);
        let mut signs = Vec::with_capacity(len);
        let mut position_value = vec![IndexMask::zeros(len); n * n];
        let mut positive = IndexMask::zeros(len);
        let mut negative = IndexMask::zeros(len);
        let mut lookup = HashMap::with_capacity(len);

        for (i, perm) in perms.iter().enumerate() {
            // Identity is even, so the two-row rectangle's sign is the row's own.
            let s = sign(perm);
            if s > 0 {
                positive.set(i);
            } else {
                negative.set(i);
            }
            for (col, &v) in perm.iter().enumerate() {
                position_value[col * n + usize::from(v) - 1].set(i);
            }
            lookup.insert(pack_row(perm), i as u32);
            rows.extend_from_slice(perm);
            signs.push(s);
        }

        Ok(Self { n, rows, signs, position_value, positive, negative, lookup })
    }

    /// Order of the cached permutations.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of cached derangements, `D(n)`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.signs.len()
    }

    /// `true` only for `n == 1`.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }

    /// Derangement at index `i`.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[u8] {
        &self.rows[i * self.n..(i + 1) * self.n]
    }

    /// Sign of the derangement at index `i`.
    #[inline(always)]
    pub fn sign(&self, i: usize) -> i8 {
        self.signs[i]
    }

    /// `(row, sign)` pairs in index order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&[u8], i8)> + '_ {
        self.rows.chunks_exact(self.n).zip(self.signs.iter().copied())
    }

    /// Owned copy of every `(derangement, sign)` pair in index order.
    pub fn get_all_derangements_with_signs(&self) -> Vec<(Vec<u8>, i8)> {
        self.entries().map(|(row, s)| (row.to_vec(), s)).collect()
    }

    /// Entries with `value` at column `col`.
    #[inline(always)]
    pub fn position_value_mask(&self, col: usize, value: u8) -> &IndexMask {
        &self.position_value[col * self.n + usize::from(value) - 1]
    }

    /// The whole position-value index, laid out as `col * n + (value - 1)`.
    #[inline(always)]
    pub(crate) fn position_value_index(&self) -> &[IndexMask] {
        &self.position_value
    }

    /// Entries that clash with `row` in at least one column.
    pub fn conflict_mask(&self, row: &[u8]) -> IndexMask {
        debug_assert_eq!(row.len(), self.n);
        let mut mask = IndexMask::zeros(self.len());
        for (col, &v) in row.iter().enumerate() {
            mask.or_assign(self.position_value_mask(col, v));
        }
        mask
    }

    /// Entries of sign `+1`.
    #[inline(always)]
    pub fn positive_mask(&self) -> &IndexMask {
        &self.positive
    }

    /// Entries of sign `-1`.
    #[inline(always)]
    pub fn negative_mask(&self) -> &IndexMask {
        &self.negative
    }

    /// Index of `row`, if it is a cached derangement.
    #[inline]
    pub fn index_of(&self, row: &[u8]) -> Option<usize> {
        if row.len() != self.n || row.iter().any(|&v| v == 0 || usize::from(v) > self.n) {
            return None;
        }
        self.index_of_key(pack_row(row))
    }

    #[inline(always)]
    pub(crate) fn index_of_key(&self, key: u64) -> Option<usize> {
        self.lookup.get(&key).map(|&i| i as usize)
    }

    /// Sign of `row`, if it is a cached derangement.
    #[inline]
    pub fn sign_of(&self, row: &[u8]) -> Option<i8> {
        self.index_of(row).map(|i| self.signs[i])
    }

    /// Contiguous index range of the entries whose first value is `value`.
    ///
    /// Empty for `value == 1` (no derangement fixes position 0) and for values
    /// outside `1..=n`.
    pub fn first_value_range(&self, value: u8) -> Range<usize> {
        let first = |i: usize| self.rows[i * self.n];
        let len = self.len();
        let start = partition_point(len, |i| first(i) < value);
        let end = partition_point(len, |i| first(i) <= value);
        start..end
    }
}

/// First index in `0..len` for which `pred` is false (`pred` monotone).
fn partition_point(len: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0usize, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

// ============================================================================
// Tests
// ============================================================================
