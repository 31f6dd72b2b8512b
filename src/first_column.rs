//! Canonical first columns and the row-interchange symmetry factor.
//!
//! Permuting rows `2..r` of a normalized rectangle gives another normalized
//! rectangle with the same sign (the sign is a product over rows). Every first
//! column is therefore equivalent to exactly one column `[1, a2, ..., ar]` with
//! `a2 < ... < ar`, and each class has `(r-1)!` members.

use crate::error::{LatinError, MAX_ORDER, MAX_ROWS};
use crate::permutation::{binomial, factorial};

// Column entries are `u8`; the order cap keeps the odometer from wrapping.
fn check_shape(r: usize, n: usize) -> Result<(), LatinError> {
    if r < 2 || n < r {
        return Err(LatinError::InvalidDimension { r, n });
    }
    if n > MAX_ORDER {
        return Err(LatinError::DimensionTooLarge { n });
    }
    Ok(())
}

/// All canonical first columns for `(r, n)`, in lexicographic order.
///
/// # Errors
/// Returns [`LatinError::InvalidDimension`] if `r < 2` or `n < r`, and
/// [`LatinError::DimensionTooLarge`] if `n > MAX_ORDER`.
pub fn enumerate_first_columns(r: usize, n: usize) -> Result<Vec<Vec<u8>>, LatinError> {
    check_shape(r, n)?;
    let k = r - 1;
    let mut out = Vec::new();
    // Lexicographic k-combinations of {2..=n}, kept as an index odometer.
    let mut tail: Vec<u8> = (2..2 + k as u8).collect();
    loop {
        let mut column = Vec::with_capacity(r);
        column.push(1);
        column.extend_from_slice(&tail);
        out.push(column);

        // Rightmost slot that can still advance; slot i tops out at n - (k - 1 - i).
        let Some(i) = (0..k).rev().find(|&i| usize::from(tail[i]) < n - (k - 1 - i)) else {
            break;
        };
        tail[i] += 1;
        for j in (i + 1)..k {
            tail[j] = tail[j - 1] + 1;
        }
    }
    Ok(out)
}

/// `C(n-1, r-1)`, the number of canonical first columns.
///
/// # Errors
/// As [`enumerate_first_columns`].
pub fn count_first_columns(r: usize, n: usize) -> Result<u128, LatinError> {
    check_shape(r, n)?;
    Ok(binomial(n - 1, r - 1))
}

/// `(r-1)!`, the number of first columns each canonical column stands for.
///
/// Zero rows still returns 1 so callers never multiply by zero.
///
/// # Errors
/// Returns [`LatinError::UnsupportedDepth`] if `r > MAX_ROWS`.
pub fn get_symmetry_factor(r: usize) -> Result<u128, LatinError> {
    if r > MAX_ROWS {
        return Err(LatinError::UnsupportedDepth { r });
    }
    Ok(factorial(r.saturating_sub(1)))
}

/// Returns `true` iff `column` is a canonical first column for `(r, n)`.
pub fn validate_first_column(column: &[u8], r: usize, n: usize) -> bool {
    check_first_column(column, r, n).is_ok()
}

/// Like [`validate_first_column`], reporting what is wrong.
///
/// # Errors
/// Returns [`LatinError::InvalidFirstColumn`] naming the failed rule.
pub fn check_first_column(column: &[u8], r: usize, n: usize) -> Result<(), LatinError> {
    let fail = |reason| {
        Err(LatinError::InvalidFirstColumn { column: column.to_vec(), reason })
    };
    if column.len() != r {
        return fail("length must equal the number of rows");
    }
    if column.first() != Some(&1) {
        return fail("first entry must be 1");
    }
    if column[1..].iter().any(|&v| v < 2 || usize::from(v) > n) {
        return fail("entries after the first must lie in 2..=n");
    }
    if column.windows(2).skip(1).any(|w| w[0] == w[1]) {
        return fail("duplicate entries");
    }
    if column.windows(2).any(|w| w[0] > w[1]) {
        return fail("entries must be strictly increasing");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinalities() {
        for (r, n, want) in [(3, 4, 3), (3, 5, 6), (4, 5, 4), (5, 8, 35), (2, 2, 1), (6, 6, 1)] {
            let cols = enumerate_first_columns(r, n).unwrap();
            assert_eq!(cols.len(), want, "({r},{n})");
            assert_eq!(count_first_columns(r, n).unwrap(), want as u128);
        }
        for n in 2..=10 {
            for r in 2..=n {
                let cols = enumerate_first_columns(r, n).unwrap();
                assert_eq!(cols.len() as u128, count_first_columns(r, n).unwrap());
            }
        }
    }

    #[test]
    fn enumeration_is_lexicographic_and_valid() {
        let cols = enumerate_first_columns(3, 5).unwrap();
        assert_eq!(
            cols,
            vec![
                vec![1, 2, 3],
                vec![1, 2, 4],
                vec![1, 2, 5],
                vec![1, 3, 4],
                vec![1, 3, 5],
                vec![1, 4, 5],
            ]
        );
        for (r, n) in [(4, 7), (5, 8), (2, 9)] {
            let cols = enumerate_first_columns(r, n).unwrap();
            assert!(cols.windows(2).all(|w| w[0] < w[1]));
            assert!(cols.iter().all(|c| validate_first_column(c, r, n)));
        }
    }

    #[test]
    fn enumeration_is_reproducible() {
        assert_eq!(enumerate_first_columns(4, 8).unwrap(), enumerate_first_columns(4, 8).unwrap());
    }

    #[test]
    fn shape_errors() {
        assert_eq!(enumerate_first_columns(1, 4), Err(LatinError::InvalidDimension { r: 1, n: 4 }));
        assert_eq!(enumerate_first_columns(5, 4), Err(LatinError::InvalidDimension { r: 5, n: 4 }));
        assert!(count_first_columns(3, 2).is_err());
    }

    #[test]
    fn orders_past_the_cell_width_are_rejected() {
        assert_eq!(enumerate_first_columns(2, 17), Err(LatinError::DimensionTooLarge { n: 17 }));
        assert_eq!(enumerate_first_columns(2, 300), Err(LatinError::DimensionTooLarge { n: 300 }));
        assert_eq!(count_first_columns(3, 257), Err(LatinError::DimensionTooLarge { n: 257 }));
        let widest = enumerate_first_columns(2, 16).unwrap();
        assert_eq!(widest.len(), 15);
        assert_eq!(widest.last(), Some(&vec![1, 16]));
    }

    #[test]
    fn symmetry_factor_is_factorial() {
        assert_eq!(get_symmetry_factor(2), Ok(1));
        assert_eq!(get_symmetry_factor(3), Ok(2));
        assert_eq!(get_symmetry_factor(5), Ok(24));
        assert_eq!(get_symmetry_factor(10), Ok(362_880));
    }

    #[test]
    fn symmetry_factor_stops_at_the_row_limit() {
        assert_eq!(get_symmetry_factor(11), Err(LatinError::UnsupportedDepth { r: 11 }));
        assert_eq!(get_symmetry_factor(40), Err(LatinError::UnsupportedDepth { r: 40 }));
    }

    #[test]
    fn first_column_validation() {
        assert!(validate_first_column(&[1, 2, 4], 3, 4));
        assert!(!validate_first_column(&[1, 2], 3, 4));
        assert!(!validate_first_column(&[2, 3, 4], 3, 4));
        assert!(!validate_first_column(&[1, 1, 4], 3, 4));
        assert!(!validate_first_column(&[1, 3, 3], 3, 4));
        assert!(!validate_first_column(&[1, 4, 2], 3, 4));
        assert!(!validate_first_column(&[1, 2, 5], 3, 4));
        let err = check_first_column(&[1, 3, 3], 3, 4).unwrap_err();
        assert_eq!(
            err,
            LatinError::InvalidFirstColumn { column: vec![1, 3, 3], reason: "duplicate entries" }
        );
    }
}
