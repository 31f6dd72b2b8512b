//! Per-column forbidden-value bitmasks (`n <= 16`).
//!
//! Bit `v - 1` of `mask[col]` is set when value `v` is already used in column
//! `col`. The counting engine mutates one store in place (push a row, pop it on
//! backtrack); `Clone` gives the deep copy for callers that prefer branch
//! isolation.

use crate::error::{LatinError, MAX_ORDER};

#[inline(always)]
const fn bit(value: u8) -> u32 {
    1u32 << (value - 1)
}

/// Mask with the lowest `n` bits set.
#[inline(always)]
pub const fn all_values(n: usize) -> u32 {
    if n >= 32 { u32::MAX } else { (1u32 << n) - 1 }
}

// ============================================================================
// ConstraintStore
// ============================================================================

/// Forbidden values per column for an order-`n` rectangle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintStore {
    n: usize,
    masks: Vec<u32>,
}

impl ConstraintStore {
    /// Creates a store with nothing forbidden.
    ///
    /// # Errors
    /// Returns [`LatinError::DimensionTooLarge`] if `n > MAX_ORDER`.
    pub fn try_new(n: usize) -> Result<Self, LatinError> {
        if n > MAX_ORDER {
            return Err(LatinError::DimensionTooLarge { n });
        }
        Ok(Self { n, masks: vec![0; n] })
    }

    /// Infallible [`ConstraintStore::try_new`] for orders already checked by the caller.
    ///
    /// # Panics
    /// Panics if `n > MAX_ORDER`.
    pub fn new(n: usize) -> Self {
        assert!(n <= MAX_ORDER, "constraint store supports n <= {MAX_ORDER}");
        Self { n, masks: vec![0; n] }
    }

    /// Creates a store with every value of `row` forbidden in its column.
    ///
    /// # Panics
    /// Panics if `row.len() > MAX_ORDER`.
    pub fn with_row(row: &[u8]) -> Self {
        let mut store = Self::new(row.len());
        store.add_row_constraints(row);
        store
    }

    /// Order of the store.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Raw mask of column `col`.
    #[inline(always)]
    pub fn column_mask(&self, col: usize) -> u32 {
        self.masks[col]
    }

    /// Forbids `value` in column `col`.
    #[inline(always)]
    pub fn add_forbidden(&mut self, col: usize, value: u8) {
        debug_assert!((1..=self.n as u8).contains(&value));
        self.masks[col] |= bit(value);
    }

    /// Allows `value` in column `col` again.
    #[inline(always)]
    pub fn remove_forbidden(&mut self, col: usize, value: u8) {
        debug_assert!((1..=self.n as u8).contains(&value));
        self.masks[col] &= !bit(value);
    }

    /// Returns whether `value` is forbidden in column `col`.
    #[inline(always)]
    pub fn is_forbidden(&self, col: usize, value: u8) -> bool {
        self.masks[col] & bit(value) != 0
    }

    /// Number of values still allowed in column `col`.
    #[inline(always)]
    pub fn available_count(&self, col: usize) -> usize {
        self.n - self.masks[col].count_ones() as usize
    }

    /// Mask of values still allowed in column `col`.
    #[inline(always)]
    pub fn available_mask(&self, col: usize) -> u32 {
        all_values(self.n) & !self.masks[col]
    }

    /// Allowed values in column `col`, ascending.
    pub fn available_values(&self, col: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.available_count(col));
        let mut m = self.available_mask(col);
        while m != 0 {
            out.push(m.trailing_zeros() as u8 + 1);
            m &= m - 1;
        }
        out
    }

    /// The single allowed value of column `col`, or `None` unless exactly one remains.
    #[inline]
    pub fn missing_value(&self, col: usize) -> Option<u8> {
        let m = self.available_mask(col);
        if m.count_ones() == 1 {
            Some(m.trailing_zeros() as u8 + 1)
        } else {
            None
        }
    }

    /// Forbids `row[c]` in every column `c`.
    #[inline]
    pub fn add_row_constraints(&mut self, row: &[u8]) {
        debug_assert_eq!(row.len(), self.n);
        for (mask, &v) in self.masks.iter_mut().zip(row) {
            debug_assert_eq!(*mask & bit(v), 0, "value {v} already forbidden");
            *mask |= bit(v);
        }
    }

    /// Undoes [`ConstraintStore::add_row_constraints`] for the same row.
    #[inline]
    pub fn remove_row_constraints(&mut self, row: &[u8]) {
        debug_assert_eq!(row.len(), self.n);
        for (mask, &v) in self.masks.iter_mut().zip(row) {
            *mask &= !bit(v);
        }
    }

    /// Whether `row` can be placed without repeating a value in any column.
    ///
    /// `row` is assumed to be a permutation; only the column constraint is checked.
    #[inline]
    pub fn admits_row(&self, row: &[u8]) -> bool {
        self.masks.iter().zip(row).all(|(&m, &v)| m & bit(v) == 0)
    }
}

// ============================================================================
// Bitset generator
// ============================================================================

/// Generates every permutation of `1..=n` whose value at each column is not
/// forbidden by `store`, in lexicographic order.
///
/// Yields the same set as [`crate::permutation::generate_constrained_permutations`]
/// given equivalent forbidden sets.
pub fn generate_constrained_permutations_bitset(n: usize, store: &ConstraintStore) -> Vec<Vec<u8>> {
    debug_assert_eq!(store.n(), n);
    let order: Vec<usize> = (0..n).collect();
    permutations_in_order(store, &order)
}

/// Like [`generate_constrained_permutations_bitset`], but fills columns in `order`.
///
/// Any order produces the same set of permutations; only the enumeration order
/// changes (lexicographic when `order` is `0..n`).
///
/// # Panics
/// Panics if `order` is not a permutation of `0..n`.
pub fn permutations_in_order(store: &ConstraintStore, order: &[usize]) -> Vec<Vec<u8>> {
    let n = store.n();
    assert_eq!(order.len(), n, "order must list every column once");
    let mut out = Vec::new();
    let mut row = vec![0u8; n];
    extend_bitset(store, order, 0, 0, &mut row, &mut out);
    out
}

fn extend_bitset(
    store: &ConstraintStore,
    order: &[usize],
    depth: usize,
    used: u32,
    row: &mut [u8],
    out: &mut Vec<Vec<u8>>,
) {
    if depth == order.len() {
        out.push(row.to_vec());
        return;
    }
    let col = order[depth];
    let mut candidates = store.available_mask(col) & !used;
    while candidates != 0 {
        let b = candidates.trailing_zeros();
        candidates &= candidates - 1;
        row[col] = b as u8 + 1;
        extend_bitset(store, order, depth + 1, used | (1 << b), row, out);
    }
}

/// Columns sorted by `available_count`, most constrained first (ties by index).
pub fn optimize_constraint_order(store: &ConstraintStore) -> Vec<usize> {
    let mut order: Vec<usize> = (0..store.n()).collect();
    order.sort_by_key(|&c| store.available_count(c));
    order
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::{generate_constrained_permutations, identity, is_derangement};
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use std::collections::BTreeSet;

    fn random_store<R: Rng>(rng: &mut R, n: usize, density: f64) -> (ConstraintStore, Vec<BTreeSet<u8>>) {
        let mut store = ConstraintStore::new(n);
        let mut sets = vec![BTreeSet::new(); n];
        for col in 0..n {
            for v in 1..=n as u8 {
                if rng.random_bool(density) {
                    store.add_forbidden(col, v);
                    sets[col].insert(v);
                }
            }
        }
        (store, sets)
    }

    #[test]
    fn add_remove_query() {
        let mut store = ConstraintStore::new(5);
        assert_eq!(store.available_count(2), 5);
        store.add_forbidden(2, 3);
        store.add_forbidden(2, 5);
        assert!(store.is_forbidden(2, 3));
        assert!(!store.is_forbidden(2, 4));
        assert!(!store.is_forbidden(1, 3));
        assert_eq!(store.available_count(2), 3);
        assert_eq!(store.available_values(2), vec![1, 2, 4]);
        store.remove_forbidden(2, 3);
        assert_eq!(store.available_values(2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn row_constraints_push_and_pop() {
        let mut store = ConstraintStore::with_row(&identity(4));
        let before = store.clone();
        store.add_row_constraints(&[2, 1, 4, 3]);
        assert_eq!(store.available_values(0), vec![3, 4]);
        assert!(store.admits_row(&[3, 4, 1, 2]));
        assert!(!store.admits_row(&[2, 4, 1, 3]));
        store.remove_row_constraints(&[2, 1, 4, 3]);
        assert_eq!(store, before);
    }

    #[test]
    fn missing_value_needs_exactly_one_slot() {
        let mut store = ConstraintStore::with_row(&[1, 2, 3]);
        assert_eq!(store.missing_value(0), None);
        store.add_row_constraints(&[2, 3, 1]);
        assert_eq!(store.missing_value(0), Some(3));
        assert_eq!(store.missing_value(1), Some(1));
        assert_eq!(store.missing_value(2), Some(2));
    }

    #[test]
    fn clone_is_deep() {
        let mut a = ConstraintStore::new(3);
        let b = a.clone();
        a.add_forbidden(0, 1);
        assert!(!b.is_forbidden(0, 1));
    }

    #[test]
    fn identity_constraints_generate_derangements() {
        for n in 1..=7 {
            let store = ConstraintStore::with_row(&identity(n));
            let perms = generate_constrained_permutations_bitset(n, &store);
            assert!(perms.iter().all(|p| is_derangement(p)));
            assert_eq!(perms.len() as u128, crate::permutation::count_derangements(n));
            assert!(perms.windows(2).all(|w| w[0] < w[1]), "lexicographic for n={n}");
        }
    }

    #[test]
    fn bitset_generator_matches_naive_generator() {
        let mut rng = XorShiftRng::seed_from_u64(0x1A71_5EED);
        for trial in 0..200 {
            let n = rng.random_range(1..=6);
            let density = rng.random_range(0.0..0.5);
            let (store, sets) = random_store(&mut rng, n, density);
            let naive: BTreeSet<Vec<u8>> =
                generate_constrained_permutations(n, &sets).into_iter().collect();
            let fast: BTreeSet<Vec<u8>> =
                generate_constrained_permutations_bitset(n, &store).into_iter().collect();
            assert_eq!(naive, fast, "trial {trial}: n={n}");
        }
    }

    #[test]
    fn column_order_does_not_change_the_set() {
        let mut rng = XorShiftRng::seed_from_u64(0x0DE7);
        for _ in 0..100 {
            let n = rng.random_range(2..=6);
            let (store, _) = random_store(&mut rng, n, 0.3);
            let order = optimize_constraint_order(&store);
            let lex: BTreeSet<Vec<u8>> =
                generate_constrained_permutations_bitset(n, &store).into_iter().collect();
            let ordered: BTreeSet<Vec<u8>> = permutations_in_order(&store, &order).into_iter().collect();
            assert_eq!(lex, ordered);
        }
    }

    #[test]
    fn optimize_order_is_most_constrained_first() {
        let mut store = ConstraintStore::new(4);
        store.add_forbidden(2, 1);
        store.add_forbidden(2, 2);
        store.add_forbidden(2, 3);
        store.add_forbidden(0, 4);
        let order = optimize_constraint_order(&store);
        assert_eq!(order, vec![2, 0, 1, 3]);
        let counts: Vec<usize> = order.iter().map(|&c| store.available_count(c)).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn all_values_mask() {
        assert_eq!(all_values(0), 0);
        assert_eq!(all_values(3), 0b111);
        assert_eq!(all_values(16), 0xFFFF);
    }

    #[test]
    fn fallible_constructor_rejects_wide_orders() {
        assert_eq!(ConstraintStore::try_new(17), Err(LatinError::DimensionTooLarge { n: 17 }));
        let store = ConstraintStore::try_new(16).unwrap();
        assert_eq!(store.n(), 16);
        assert_eq!(store.available_mask(15), all_values(16));
        assert_eq!(ConstraintStore::try_new(4).unwrap(), ConstraintStore::new(4));
    }
}
