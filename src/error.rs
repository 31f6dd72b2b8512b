//! Error taxonomy shared by every counting entry point.

use std::fmt;

/// Largest supported order `n`; column masks are `u32` and packed row keys use
/// four bits per cell.
pub const MAX_ORDER: usize = 16;

/// Deepest rectangle (number of rows) the counting engine accepts.
pub const MAX_ROWS: usize = 10;

/// Errors raised by the enumeration and counting functions.
///
/// All of them are local and synchronous: they are detected at entry (or, for
/// [`LatinError::CompletionNotFound`], at the point an invariant breaks) and are
/// never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LatinError {
    /// `r < 2`, `r > n`, or `n < 1`.
    InvalidDimension {
        /// Requested number of rows.
        r: usize,
        /// Requested order.
        n: usize,
    },
    /// `n < 1`: no permutations to enumerate.
    InvalidOrder {
        /// Requested order.
        n: usize,
    },
    /// `n` exceeds [`MAX_ORDER`].
    DimensionTooLarge {
        /// Requested order.
        n: usize,
    },
    /// The prescribed first column is malformed.
    InvalidFirstColumn {
        /// The offending column as given.
        column: Vec<u8>,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// `r` exceeds [`MAX_ROWS`].
    UnsupportedDepth {
        /// Requested number of rows.
        r: usize,
    },
    /// A supplied derangement cache was built for a different order.
    CacheMismatch {
        /// Order the caller asked for.
        expected: usize,
        /// Order the cache was built for.
        got: usize,
    },
    /// The derangement cache disagrees with the closed-form derangement count.
    CacheInvariant {
        /// Order of the cache.
        n: usize,
        /// `count_derangements(n)`.
        expected: u128,
        /// Number of rows actually generated.
        got: usize,
    },
    /// A derived completion row is not in the derangement cache.
    CompletionNotFound {
        /// The completion row that failed the lookup.
        row: Vec<u8>,
    },
    /// Completion counting was requested with `r != n - 1`.
    CompletionRequiresPenultimate {
        /// Requested number of rows.
        r: usize,
        /// Requested order.
        n: usize,
    },
    /// A partition request that cannot be satisfied (zero parts, out-of-range index).
    InvalidPartition(String),
    /// The worker thread pool could not be started.
    ThreadPool(String),
}

impl fmt::Display for LatinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatinError::InvalidDimension { r, n } => write!(
                f,
                "invalid dimensions r={r}, n={n}: need 2 <= r <= n"
            ),
            LatinError::InvalidOrder { n } => write!(f, "invalid order n={n}: need n >= 1"),
            LatinError::DimensionTooLarge { n } => {
                write!(f, "order n={n} is too large; supported n <= {MAX_ORDER}")
            }
            LatinError::InvalidFirstColumn { column, reason } => {
                write!(f, "invalid first column {column:?}: {reason}")
            }
            LatinError::UnsupportedDepth { r } => write!(
                f,
                "counting is not implemented for r={r}; supported r <= {MAX_ROWS}"
            ),
            LatinError::CacheMismatch { expected, got } => write!(
                f,
                "derangement cache order mismatch: expected n={expected}, got n={got}"
            ),
            LatinError::CacheInvariant { n, expected, got } => write!(
                f,
                "derangement cache for n={n} has {got} rows, expected D({n})={expected}"
            ),
            LatinError::CompletionNotFound { row } => write!(
                f,
                "completion row {row:?} is not a cached derangement (consistency check failed)"
            ),
            LatinError::CompletionRequiresPenultimate { r, n } => write!(
                f,
                "completion counting requires r = n - 1, got r={r}, n={n}"
            ),
            LatinError::InvalidPartition(msg) => write!(f, "invalid partition: {msg}"),
            LatinError::ThreadPool(msg) => write!(f, "thread pool error: {msg}"),
        }
    }
}

impl std::error::Error for LatinError {}

/// Checks `2 <= r <= n`, `n <= MAX_ORDER` and `r <= MAX_ROWS`.
///
/// # Errors
/// Returns the first violated constraint.
pub fn check_dimensions(r: usize, n: usize) -> Result<(), LatinError> {
    if n < 1 || r < 2 || r > n {
        return Err(LatinError::InvalidDimension { r, n });
    }
    if n > MAX_ORDER {
        return Err(LatinError::DimensionTooLarge { n });
    }
    if r > MAX_ROWS {
        return Err(LatinError::UnsupportedDepth { r });
    }
    Ok(())
}
