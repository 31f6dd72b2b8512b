//! Permutation parity, derangements, and the naive reference generator.
//!
//! Everything here is O(n²) or worse and stays off the hot path; the counting
//! engine only uses these to build its caches and to cross-check results.

use std::collections::BTreeSet;

// ============================================================================
// Parity
// ============================================================================

/// Returns the parity of `perm` as `+1` (even) or `-1` (odd).
///
/// Counts inversions `i < j` with `perm[i] > perm[j]`. Sequences of length 0 or 1
/// are even.
pub fn sign(perm: &[u8]) -> i8 {
    let mut inversions = 0usize;
    for i in 0..perm.len() {
        for j in (i + 1)..perm.len() {
            if perm[i] > perm[j] {
                inversions += 1;
            }
        }
    }
    if inversions % 2 == 0 { 1 } else { -1 }
}

/// Returns `true` iff `perm` has no fixed point (`perm[i] != i + 1` for all `i`).
pub fn is_derangement(perm: &[u8]) -> bool {
    perm.iter().enumerate().all(|(i, &v)| usize::from(v) != i + 1)
}

/// Returns `true` iff `perm` is a permutation of `1..=perm.len()`.
pub fn is_permutation(perm: &[u8]) -> bool {
    let n = perm.len();
    let mut seen = vec![false; n];
    for &v in perm {
        let v = usize::from(v);
        if v == 0 || v > n || seen[v - 1] {
            return false;
        }
        seen[v - 1] = true;
    }
    true
}

/// Identity permutation `[1, 2, ..., n]`.
pub fn identity(n: usize) -> Vec<u8> {
    (1..=n).map(|v| v as u8).collect()
}

// ============================================================================
// Closed forms
// ============================================================================

/// Number of derangements of `n` elements: `D(n) = (n-1)(D(n-1) + D(n-2))`.
pub fn count_derangements(n: usize) -> u128 {
    let (mut prev, mut cur) = (1u128, 0u128); // D(0), D(1)
    if n == 0 {
        return prev;
    }
    for k in 2..=n {
        let next = (k as u128 - 1) * (cur + prev);
        prev = cur;
        cur = next;
    }
    cur
}

/// `k!`
pub fn factorial(k: usize) -> u128 {
    (1..=k as u128).product()
}

/// Binomial coefficient `C(n, k)`; zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc = 1u128;
    for i in 0..k {
        // Exact at every step: acc * (n - i) is divisible by (i + 1).
        acc = acc * (n - i) as u128 / (i as u128 + 1);
    }
    acc
}

// ============================================================================
// Determinant (alternate sign method)
// ============================================================================

/// 0/1 matrix with a one at `(i, perm[i] - 1)`; its determinant equals [`sign`].
pub fn permutation_matrix(perm: &[u8]) -> Vec<Vec<i64>> {
    let n = perm.len();
    let mut m = vec![vec![0i64; n]; n];
    for (i, &v) in perm.iter().enumerate() {
        m[i][usize::from(v) - 1] = 1;
    }
    m
}

/// Determinant by cofactor expansion along the first row.
///
/// Exponential; meant for cross-checks on matrices up to about 8×8. The empty
/// matrix has determinant 1.
pub fn determinant(matrix: &[Vec<i64>]) -> i64 {
    let n = matrix.len();
    match n {
        0 => 1,
        1 => matrix[0][0],
        2 => matrix[0][0] * matrix[1][1] - matrix[0][1] * matrix[1][0],
        _ => {
            let mut total = 0i64;
            for col in 0..n {
                let a = matrix[0][col];
                if a == 0 {
                    continue;
                }
                let minor: Vec<Vec<i64>> = matrix[1..]
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|&(j, _)| j != col)
                            .map(|(_, &x)| x)
                            .collect()
                    })
                    .collect();
                let cofactor = determinant(&minor);
                if col % 2 == 0 {
                    total += a * cofactor;
                } else {
                    total -= a * cofactor;
                }
            }
            total
        }
    }
}

// ============================================================================
// Naive constrained generator
// ============================================================================

/// Generates every permutation of `1..=n` that avoids `forbidden[i]` at position `i`.
///
/// Plain set-based backtracking; the output is in lexicographic order. This is the
/// reference the bitset generator in [`crate::constraint`] must agree with.
///
/// # Panics
/// Panics if `forbidden.len() != n`.
pub fn generate_constrained_permutations(n: usize, forbidden: &[BTreeSet<u8>]) -> Vec<Vec<u8>> {
    assert_eq!(forbidden.len(), n, "need one forbidden set per position");
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(n);
    let mut used = BTreeSet::new();
    extend_naive(n, forbidden, &mut current, &mut used, &mut out);
    out
}

fn extend_naive(
    n: usize,
    forbidden: &[BTreeSet<u8>],
    current: &mut Vec<u8>,
    used: &mut BTreeSet<u8>,
    out: &mut Vec<Vec<u8>>,
) {
    let pos = current.len();
    if pos == n {
        out.push(current.clone());
        return;
    }
    for v in 1..=n as u8 {
        if used.contains(&v) || forbidden[pos].contains(&v) {
            continue;
        }
        used.insert(v);
        current.push(v);
        extend_naive(n, forbidden, current, used, out);
        current.pop();
        used.remove(&v);
    }
}

/// All permutations of `1..=n` in lexicographic order.
pub fn all_permutations(n: usize) -> Vec<Vec<u8>> {
    generate_constrained_permutations(n, &vec![BTreeSet::new(); n])
}

// ============================================================================
// Tests
// ============================================================================
