//! Fixed-length multi-word bitset over derangement-cache indices.
//!
//! `D(n)` exceeds 64 for `n >= 5`, so the conflict masks need more than one
//! machine word. Bits past `len` are always zero, which keeps `count_ones` and
//! `is_empty` exact without re-masking.

#[inline(always)]
const fn words_for(len: usize) -> usize {
    len.div_ceil(64)
}

/// A bitset with a fixed number of addressable bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexMask {
    len: usize,
    words: Vec<u64>,
}

impl IndexMask {
    /// All bits clear.
    pub fn zeros(len: usize) -> Self {
        Self { len, words: vec![0; words_for(len)] }
    }

    /// All `len` bits set.
    pub fn ones(len: usize) -> Self {
        let mut mask = Self { len, words: vec![u64::MAX; words_for(len)] };
        mask.clear_tail();
        mask
    }

    #[inline]
    fn clear_tail(&mut self) {
        let rem = self.len % 64;
        if rem != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << rem) - 1;
        }
    }

    /// Number of addressable bits.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Backing words, least significant first.
    #[inline(always)]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Sets bit `i`.
    #[inline(always)]
    pub fn set(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    /// Clears bit `i`.
    #[inline(always)]
    pub fn clear(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.words[i / 64] &= !(1u64 << (i % 64));
    }

    /// Returns bit `i`.
    #[inline(always)]
    pub fn contains(&self, i: usize) -> bool {
        i < self.len && (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Population count.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// `popcount(self & other)` without materializing the intersection.
    #[inline]
    pub fn count_and(&self, other: &IndexMask) -> usize {
        debug_assert_eq!(self.len, other.len);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Overwrites `self` with `other` (same length).
    #[inline]
    pub fn copy_from(&mut self, other: &IndexMask) {
        debug_assert_eq!(self.len, other.len);
        self.words.copy_from_slice(&other.words);
    }

    /// `self |= other`
    #[inline]
    pub fn or_assign(&mut self, other: &IndexMask) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// `self &= other`
    #[inline]
    pub fn and_assign(&mut self, other: &IndexMask) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    /// `self &= !other`
    #[inline]
    pub fn and_not_assign(&mut self, other: &IndexMask) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
    }

    /// Index of the lowest set bit at or above `from`.
    #[inline]
    pub fn next_one(&self, from: usize) -> Option<usize> {
        if from >= self.len {
            return None;
        }
        let mut w = from / 64;
        let mut word = self.words[w] & (u64::MAX << (from % 64));
        loop {
            if word != 0 {
                return Some(w * 64 + word.trailing_zeros() as usize);
            }
            w += 1;
            if w == self.words.len() {
                return None;
            }
            word = self.words[w];
        }
    }

    /// Iterator over set bit indices, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let b = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(w * 64 + b)
            })
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
