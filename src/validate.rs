//! Fast deterministic validation of known small rectangle counts.

use crate::counter::{
    count_rectangles, count_rectangles_with_completion, RectangleCounter, SignedCount,
};
use crate::derangement::DerangementCache;
use crate::first_column::{enumerate_first_columns, get_symmetry_factor};

/// One bundled regression fixture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnownCount {
    /// Rows.
    pub r: usize,
    /// Order.
    pub n: usize,
    /// Number of normalized `r × n` rectangles.
    pub total: u128,
    /// Sign split, when it is recorded.
    pub split: Option<SignedCount>,
}

// ============================================================================
// Public API
// ============================================================================

/// Validates the bundled counts and the structural identities:
/// - every fixture in `known_counts.txt` (totals, and sign splits where recorded)
/// - canonical first columns × `(r-1)!` equal the unreduced second-row sum
/// - every `(n-1, n)` rectangle has exactly one completion (`n = 3..=6`)
/// - two-row counts equal the sign split of the derangement cache
///
/// # Errors
/// Returns an error message naming the first failed check.
pub fn validate_known_counts() -> Result<(), String> {
    let fixtures = parse_fixtures(include_str!("../known_counts.txt"))
        .map_err(|e| format!("known_counts.txt: {e}"))?;
    for fixture in &fixtures {
        validate_fixture(fixture)?;
    }
    for (r, n) in [(3, 4), (3, 5), (4, 5), (4, 6)] {
        validate_symmetry(r, n)?;
    }
    for n in 3..=6 {
        validate_bijection(n)?;
    }
    for n in 2..=7 {
        validate_two_rows(n)?;
    }
    Ok(())
}

/// Parses fixture lines `r n total [positive negative]`; `#` starts a comment.
///
/// # Errors
/// Returns an error message with the 1-based line number of a malformed line.
pub fn parse_fixtures(text: &str) -> Result<Vec<KnownCount>, String> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<u128> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| format!("line {}: {e}", lineno + 1))?;
        let (r, n, total, split) = match fields.as_slice() {
            &[r, n, total] => (r, n, total, None),
            &[r, n, total, pos, neg] => (r, n, total, Some(SignedCount::new(pos, neg))),
            _ => {
                return Err(format!(
                    "line {}: expected 3 or 5 fields, found {}",
                    lineno + 1,
                    fields.len()
                ));
            }
        };
        if let Some(split) = split
            && split.total() != total
        {
            return Err(format!("line {}: split does not add up to {total}", lineno + 1));
        }
        out.push(KnownCount { r: r as usize, n: n as usize, total, split });
    }
    Ok(out)
}

/// Checks one fixture against the counting engine.
///
/// # Errors
/// Returns an error message if the engine disagrees.
pub fn validate_fixture(fixture: &KnownCount) -> Result<(), String> {
    let KnownCount { r, n, total, split } = *fixture;
    let got = count_rectangles(r, n, None, None).map_err(|e| format!("({r},{n}): {e}"))?;
    if got.total() != total {
        return Err(format!("({r},{n}): expected {total} rectangles, counted {}", got.total()));
    }
    if let Some(want) = split
        && got != want
    {
        return Err(format!(
            "({r},{n}): expected +{}/-{}, counted +{}/-{}",
            want.positive, want.negative, got.positive, got.negative
        ));
    }
    Ok(())
}

// ============================================================================
// Internal
// ============================================================================

fn validate_symmetry(r: usize, n: usize) -> Result<(), String> {
    let cache = DerangementCache::build(n).map_err(|e| format!("({r},{n}): {e}"))?;
    let counter = RectangleCounter::new(&cache);
    let factor = get_symmetry_factor(r).map_err(|e| format!("({r},{n}): {e}"))?;

    let mut reduced = SignedCount::default();
    for column in enumerate_first_columns(r, n).map_err(|e| e.to_string())? {
        reduced += counter
            .count(r, Some(column.as_slice()))
            .map_err(|e| format!("({r},{n}) column {column:?}: {e}"))?
            .scaled(factor);
    }

    let mut unreduced = SignedCount::default();
    for index in 0..cache.len() {
        unreduced +=
            counter.count_with_second_row(r, index).map_err(|e| format!("({r},{n}): {e}"))?;
    }

    if reduced != unreduced {
        return Err(format!(
            "({r},{n}): canonical × {factor} gives {reduced:?}, unreduced gives {unreduced:?}"
        ));
    }
    Ok(())
}

fn validate_bijection(n: usize) -> Result<(), String> {
    let r = n - 1;
    let both = count_rectangles_with_completion(r, n, None, None)
        .map_err(|e| format!("({r},{n}): {e}"))?;
    if !both.is_bijective() {
        return Err(format!(
            "({r},{n}): {} rectangles but {} completions",
            both.rectangles.total(),
            both.completed.total()
        ));
    }
    Ok(())
}

fn validate_two_rows(n: usize) -> Result<(), String> {
    let cache = DerangementCache::build(n).map_err(|e| format!("n={n}: {e}"))?;
    let want = SignedCount::new(
        cache.positive_mask().count_ones() as u128,
        cache.negative_mask().count_ones() as u128,
    );
    let got = count_rectangles(2, n, None, Some(&cache)).map_err(|e| format!("(2,{n}): {e}"))?;
    if got != want {
        return Err(format!("(2,{n}): counted {got:?}, cache sign split is {want:?}"));
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
    fn bundled_counts_are_valid() {
        validate_known_counts().unwrap();
    }

    #[test]
    fn bundled_fixtures_parse() {
        let fixtures = parse_fixtures(include_str!("../known_counts.txt")).unwrap();
        assert!(fixtures.len() >= 6);
        assert!(fixtures.contains(&KnownCount { r: 5, n: 5, total: 1344, split: None }));
        assert!(fixtures.contains(&KnownCount {
            r: 2,
            n: 4,
            total: 9,
            split: Some(SignedCount::new(3, 6)),
        }));
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# header\n\n3 4 24   # trailing\n  2 2 1 0 1\n";
        let fixtures = parse_fixtures(text).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0], KnownCount { r: 3, n: 4, total: 24, split: None });
        assert_eq!(fixtures[1].split, Some(SignedCount::new(0, 1)));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(parse_fixtures("3 4").unwrap_err().contains("line 1"));
        assert!(parse_fixtures("3 4 24\n3 x 24").unwrap_err().contains("line 2"));
        assert!(parse_fixtures("2 4 9 3 5").unwrap_err().contains("add up"));
    }

    #[test]
    fn wrong_fixture_is_reported() {
        let bad = KnownCount { r: 3, n: 4, total: 25, split: None };
        assert!(validate_fixture(&bad).unwrap_err().contains("expected 25"));

        let bad_split = KnownCount { r: 2, n: 4, total: 9, split: Some(SignedCount::new(6, 3)) };
        assert!(validate_fixture(&bad_split).unwrap_err().contains("+6/-3"));

        let bad_shape = KnownCount { r: 5, n: 4, total: 0, split: None };
        assert!(validate_fixture(&bad_shape).is_err());
    }
}
