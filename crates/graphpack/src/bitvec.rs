//! Compact growable bit set.

/// A growable set of bits stored in 32-bit words.
///
/// The logical length is one past the highest set bit, so trailing clear
/// bits are never stored and two vectors with the same set bits compare
/// equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitVector {
    words: Vec<u32>,
}

impl BitVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from bit-indexed words, ignoring bits at or past `len`.
    pub fn from_words(mut words: Vec<u32>, len: usize) -> Self {
        words.truncate(len.div_ceil(32));
        let rem = len % 32;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u32 << rem) - 1;
            }
        }
        let mut bits = Self { words };
        bits.trim();
        bits
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// One past the highest set bit, or 0 if no bit is set.
    pub fn len(&self) -> usize {
        match self.words.last() {
            Some(&last) => (self.words.len() - 1) * 32 + (32 - last.leading_zeros() as usize),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> bool {
        self.words
            .get(index / 32)
            .is_some_and(|word| word & (1 << (index % 32)) != 0)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        let word = index / 32;
        if value {
            if word >= self.words.len() {
                self.words.resize(word + 1, 0);
            }
            self.words[word] |= 1 << (index % 32);
        } else if word < self.words.len() {
            self.words[word] &= !(1 << (index % 32));
            self.trim();
        }
    }

    /// Indices of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..32).filter(move |b| word & (1 << b) != 0).map(move |b| w * 32 + b)
        })
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<usize> for BitVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut bits = BitVector::new();
        for index in iter {
            bits.set(index, true);
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_is_highest_set_bit_plus_one() {
        let bits: BitVector = [0, 2, 5, 31, 32, 63, 64, 80].into_iter().collect();
        assert_eq!(bits.len(), 81);
        assert_eq!(bits.words(), &[0x8000_0025, 0x8000_0001, 0x0001_0001]);
        assert_eq!(
            bits.ones().collect::<Vec<_>>(),
            vec![0, 2, 5, 31, 32, 63, 64, 80]
        );
    }

    #[test]
    fn clearing_the_top_bit_shrinks() {
        let mut bits: BitVector = [3, 40].into_iter().collect();
        bits.set(40, false);
        assert_eq!(bits.len(), 4);
        assert_eq!(bits.words().len(), 1);
        bits.set(3, false);
        assert!(bits.is_empty());
        assert_eq!(bits.len(), 0);
    }

    #[test]
    fn from_words_masks_bits_past_len() {
        let bits = BitVector::from_words(vec![0xffff_ffff, 0xffff_ffff], 34);
        assert_eq!(bits.len(), 34);
        assert!(bits.get(33));
        assert!(!bits.get(34));
    }

    #[test]
    fn equality_ignores_construction_history() {
        let mut a: BitVector = [1, 100].into_iter().collect();
        a.set(100, false);
        let b: BitVector = [1].into_iter().collect();
        assert_eq!(a, b);
    }
}
