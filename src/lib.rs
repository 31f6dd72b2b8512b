//! # Signed Latin Rectangle Enumeration
//!
//! Counts normalized Latin rectangles (first row is the identity) split by sign,
//! where the sign of a rectangle is the product of its rows' permutation parities.
//!
//! This crate provides:
//! - A per-order **derangement cache**: every admissible second row with its sign,
//!   a position-value index of bitmasks and positive/negative sign masks.
//! - A depth-first **bitmask counter** that places rows by intersecting candidate
//!   masks and resolves the last row with two popcounts.
//! - **Canonical first columns**: the `(r-1)!` row-interchange symmetry is factored
//!   out by counting only first columns `[1, a2 < ... < ar]`.
//! - A **completion pass** for `r = n - 1`: each rectangle's unique last row is
//!   looked up and its sign folded into the `(n, n)` counts.
//! - Parallel drivers (rayon pool or a lock-free work queue) over the canonical
//!   columns.
//!
//! ## Quick Start
//!
//! ```
//! use latin_rect::counter::count_rectangles;
//!
//! let counts = count_rectangles(3, 4, None, None).unwrap();
//! assert_eq!(counts.total(), 24);
//! assert_eq!(counts.positive + counts.negative, 24);
//! ```
//!
//! ## Completion
//!
//! ```
//! use latin_rect::counter::count_rectangles_with_completion;
//!
//! let both = count_rectangles_with_completion(4, 5, None, None).unwrap();
//! assert_eq!(both.rectangles.total(), 1344);
//! assert!(both.is_bijective());
//! ```
//!
//! ## Parallel Runs
//!
//! ```no_run
//! use latin_rect::partition::{run_count, CountConfig, Executor};
//!
//! let cfg = CountConfig {
//!     rows: 6,
//!     order: 7,
//!     completion: true,
//!     executor: Executor::Queue,
//!     report_every: 1,
//!     ..Default::default()
//! };
//! let report = run_count(&cfg).unwrap();
//! println!("{:?}", report.completed);
//! ```
//!
//! ## Reusing a Cache
//!
//! ```
//! use latin_rect::counter::RectangleCounter;
//! use latin_rect::derangement::DerangementCache;
//! use latin_rect::first_column::{enumerate_first_columns, get_symmetry_factor};
//!
//! let cache = DerangementCache::build(5).unwrap();
//! let counter = RectangleCounter::new(&cache);
//! let total: u128 = enumerate_first_columns(3, 5)
//!     .unwrap()
//!     .iter()
//!     .map(|col| counter.count(3, Some(col.as_slice())).unwrap().total())
//!     .sum::<u128>()
//!     * get_symmetry_factor(3).unwrap();
//! assert_eq!(total, 552);
//! ```
//!
//! ## Modules
//!
//! - [`permutation`]: parity, derangement counts, determinants, naive generation.
//! - [`constraint`]: per-column forbidden-value bitmasks.
//! - [`mask`]: growable bitsets over derangement-cache indices.
//! - [`derangement`]: the derangement cache.
//! - [`first_column`]: canonical first columns and the symmetry factor.
//! - [`counter`]: the bitmask counter and its completion extension.
//! - [`partition`]: work splitting, aggregation and parallel drivers.
//! - [`rectangle`]: materialized rectangles and the brute-force reference.
//! - [`validate`]: deterministic checks against known counts.
//!
//! ## Limits
//!
//! - Orders up to 16 (one `u32` column mask, four bits per packed cell).
//! - Up to 10 rows.
//! - For maximum performance, compile with: `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)] // Hot-path accessors
#![allow(clippy::many_single_char_names)] // r, n, k, v
#![allow(clippy::needless_range_loop)] // Column loops read clearer indexed
#![allow(clippy::doc_markdown)]
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod constraint;
pub mod counter;
pub mod derangement;
pub mod error;
pub mod first_column;
pub mod mask;
pub mod partition;
pub mod permutation;
pub mod rectangle;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::counter::{
        count_rectangles, count_rectangles_with_completion, count_rectangles_with_second_row,
        CompletionCount, RectangleCounter, SignedCount,
    };
    pub use crate::derangement::{build_derangement_cache, DerangementCache};
    pub use crate::error::LatinError;
    pub use crate::first_column::{
        enumerate_first_columns, get_symmetry_factor, validate_first_column,
    };
    pub use crate::partition::{run_count, CountConfig, CountReport, Executor, Partition};
    pub use crate::rectangle::Rectangle;
    pub use crate::validate::validate_known_counts;
}
