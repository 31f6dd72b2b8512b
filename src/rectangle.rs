//! Materialized Latin rectangles and the slow reference enumeration used to
//! cross-check the bitmask engine.

use crate::error::{check_dimensions, LatinError};
use crate::permutation::{
    determinant, generate_constrained_permutations, identity, is_permutation, permutation_matrix,
    sign,
};
use std::collections::BTreeSet;
use std::fmt;

/// An `r × n` array with values in `1..=n`, stored row-major.
///
/// Construction only checks the shape; [`Rectangle::is_valid`] and
/// [`Rectangle::is_normalized`] check the Latin property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    r: usize,
    n: usize,
    cells: Vec<u8>,
}

impl Rectangle {
    /// Builds a rectangle from equal-length rows.
    ///
    /// # Errors
    /// Returns [`LatinError::InvalidDimension`] if there are no rows, the rows are
    /// empty, or their lengths differ.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, LatinError> {
        let r = rows.len();
        let n = rows.first().map_or(0, Vec::len);
        if r == 0 || n == 0 || rows.iter().any(|row| row.len() != n) {
            return Err(LatinError::InvalidDimension { r, n });
        }
        let cells = rows.iter().flatten().copied().collect();
        Ok(Self { r, n, cells })
    }

    /// Number of rows.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Number of columns (the order).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if `row >= r` or `col >= n`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.r && col < self.n, "index out of bounds");
        self.cells[row * self.n + col]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[u8] {
        &self.cells[i * self.n..(i + 1) * self.n]
    }

    /// Rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.cells.chunks_exact(self.n)
    }

    /// Every row is a permutation of `1..=n` and no column repeats a value.
    pub fn is_valid(&self) -> bool {
        if !self.rows().all(is_permutation) {
            return false;
        }
        let mut seen = vec![false; self.n];
        for col in 0..self.n {
            seen.fill(false);
            for row in 0..self.r {
                let v = usize::from(self.get(row, col)) - 1;
                if seen[v] {
                    return false;
                }
                seen[v] = true;
            }
        }
        true
    }

    /// Valid, and the first row is the identity.
    pub fn is_normalized(&self) -> bool {
        self.is_valid() && self.row(0) == identity(self.n).as_slice()
    }

    /// Product of the row parities (inversion counting).
    pub fn compute_sign(&self) -> i8 {
        self.rows().map(sign).product()
    }

    /// Product of the determinants of the rows' permutation matrices.
    ///
    /// Same value as [`Rectangle::compute_sign`] by an independent route.
    pub fn compute_sign_by_determinant(&self) -> i8 {
        let det: i64 = self.rows().map(|row| determinant(&permutation_matrix(row))).product();
        if det > 0 { 1 } else { -1 }
    }

    /// For an `(n-1) × n` rectangle, the unique row that completes it to a square.
    ///
    /// Returns `None` for any other shape or if the rectangle is not valid.
    pub fn completion(&self) -> Option<Vec<u8>> {
        if self.r + 1 != self.n || !self.is_valid() {
            return None;
        }
        let full: u32 = (1..=self.n as u32).sum();
        let row = (0..self.n)
            .map(|col| {
                let used: u32 = (0..self.r).map(|i| u32::from(self.get(i, col))).sum();
                (full - used) as u8
            })
            .collect();
        Some(row)
    }

    /// A copy with `row` appended.
    ///
    /// # Errors
    /// Returns [`LatinError::InvalidDimension`] if `row` has the wrong length.
    pub fn with_row(&self, row: &[u8]) -> Result<Self, LatinError> {
        if row.len() != self.n {
            return Err(LatinError::InvalidDimension { r: self.r + 1, n: row.len() });
        }
        let mut cells = self.cells.clone();
        cells.extend_from_slice(row);
        Ok(Self { r: self.r + 1, n: self.n, cells })
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(u8::to_string).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Reference enumeration
// ============================================================================

/// Every normalized `r × n` rectangle, built row by row with the naive set-based
/// generator. Exponential; for cross-checks with `n <= 6`.
///
/// # Errors
/// Returns [`LatinError::InvalidDimension`] for `r < 2` or `r > n`.
pub fn enumerate_normalized(r: usize, n: usize) -> Result<Vec<Rectangle>, LatinError> {
    check_dimensions(r, n)?;
    let mut rows = vec![identity(n)];
    let mut forbidden: Vec<BTreeSet<u8>> = rows[0].iter().map(|&v| BTreeSet::from([v])).collect();
    let mut out = Vec::new();
    extend_rows(r, n, &mut rows, &mut forbidden, &mut out)?;
    Ok(out)
}

fn extend_rows(
    r: usize,
    n: usize,
    rows: &mut Vec<Vec<u8>>,
    forbidden: &mut [BTreeSet<u8>],
    out: &mut Vec<Rectangle>,
) -> Result<(), LatinError> {
    if rows.len() == r {
        out.push(Rectangle::from_rows(rows)?);
        return Ok(());
    }
    for perm in generate_constrained_permutations(n, forbidden) {
        for (set, &v) in forbidden.iter_mut().zip(&perm) {
            set.insert(v);
        }
        rows.push(perm);
        extend_rows(r, n, rows, forbidden, out)?;
        if let Some(perm) = rows.pop() {
            for (set, v) in forbidden.iter_mut().zip(perm) {
                set.remove(&v);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
