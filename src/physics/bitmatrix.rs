/// Equally sized rows of bits in one contiguous buffer.
///
/// Used for the columns and rows of the spatial grid
/// (one bit per collider in each) and for the layer matrix
/// (one bit per layer for each layer).
#[derive(Clone, Debug, Default)]
pub struct BitMatrix {
    words_per_row: usize,
    row_count: usize,
    words: Vec<u64>,
}

#[derive(Clone, Copy, Debug)]
pub struct BitMatrixParams {
    pub bits_per_row: usize,
    pub row_count: usize,
}

impl BitMatrix {
    /// Clear every bit and change the shape of the matrix.
    /// The buffer is reused, so rebuilding every tick with similar sizes doesn't allocate.
    pub fn reset(&mut self, params: BitMatrixParams) {
        self.words_per_row = params.bits_per_row / 64 + 1;
        self.row_count = params.row_count;
        self.words.clear();
        self.words.resize(self.words_per_row * self.row_count, 0);
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// # Panics
    /// Panics if the row doesn't exist.
    pub fn row(&self, idx: usize) -> Row<'_> {
        let start = idx * self.words_per_row;
        Row(&self.words[start..start + self.words_per_row])
    }

    /// Set a bit in a row.
    ///
    /// # Panics
    /// Panics if the row doesn't exist or the bit is past the row's length.
    #[inline]
    pub fn set(&mut self, row: usize, bit: usize) {
        assert!(bit / 64 < self.words_per_row, "bit {bit} out of range");
        self.words[row * self.words_per_row + bit / 64] |= 1 << (bit % 64);
    }
}

/// A view into a single row of a [`BitMatrix`][self::BitMatrix].
#[derive(Clone, Copy, Debug)]
pub struct Row<'a>(&'a [u64]);

impl<'a> Row<'a> {
    /// Check a bit. Bits past the end of the row read as unset.
    pub fn contains(&self, bit: usize) -> bool {
        self.0
            .get(bit / 64)
            .map_or(false, |word| word & (1 << (bit % 64)) != 0)
    }

    /// Indices of the set bits, in ascending order.
    pub fn ones(self) -> Ones<impl 'a + Iterator<Item = u64>> {
        Ones::new(self.0.iter().copied())
    }

    /// Indices of the bits set in both rows, in ascending order.
    pub fn and(self, other: Row<'a>) -> Ones<impl 'a + Iterator<Item = u64>> {
        Ones::new(self.0.iter().zip(other.0).map(|(a, b)| a & b))
    }
}

/// Iterator over the positions of the set bits in a sequence of words.
#[derive(Clone, Debug)]
pub struct Ones<W> {
    words: W,
    // bit index of the lowest bit of `curr_word`
    base: usize,
    next_base: usize,
    // remaining bits, cleared one by one as they're yielded
    curr_word: u64,
}

impl<W: Iterator<Item = u64>> Ones<W> {
    fn new(words: W) -> Self {
        Self {
            words,
            base: 0,
            next_base: 0,
            curr_word: 0,
        }
    }
}

impl<W: Iterator<Item = u64>> Iterator for Ones<W> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr_word == 0 {
            self.curr_word = self.words.next()?;
            self.base = self.next_base;
            self.next_base += 64;
        }
        let lowest = self.curr_word.trailing_zeros() as usize;
        // clear lowest set bit
        self.curr_word &= self.curr_word - 1;
        Some(self.base + lowest)
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_with(rows: &[&[usize]], bits_per_row: usize) -> BitMatrix {
        let mut m = BitMatrix::default();
        m.reset(BitMatrixParams {
            bits_per_row,
            row_count: rows.len(),
        });
        for (row, bits) in rows.iter().enumerate() {
            for &bit in *bits {
                m.set(row, bit);
            }
        }
        m
    }

    #[test]
    fn ones_are_ascending() {
        let m = matrix_with(&[&[0, 5, 3, 130, 120]], 200);
        itertools::assert_equal(m.row(0).ones(), [0, 3, 5, 120, 130]);
        assert!(m.row(0).contains(130));
        assert!(!m.row(0).contains(131));
        assert!(!m.row(0).contains(10_000));
    }

    #[test]
    fn row_intersection() {
        let m = matrix_with(
            &[&[0, 5, 128, 191, 2500], &[2, 5, 130, 120, 0, 191, 3000]],
            3000,
        );
        itertools::assert_equal(m.row(0).and(m.row(1)), [0, 5, 191]);
    }

    #[test]
    fn reset_changes_shape_and_clears() {
        let mut m = matrix_with(&[&[], &[7]], 10);
        assert!(m.row(1).contains(7));

        m.reset(BitMatrixParams {
            bits_per_row: 200,
            row_count: 5,
        });
        assert_eq!(m.row_count(), 5);
        assert!((0..5).all(|r| m.row(r).ones().next().is_none()));
        m.set(4, 199);
        itertools::assert_equal(m.row(4).ones(), [199]);
    }

    #[test]
    #[should_panic]
    fn setting_past_the_row_panics() {
        let mut m = matrix_with(&[&[]], 10);
        m.set(0, 64);
    }
}
