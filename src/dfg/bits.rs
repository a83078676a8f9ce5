//! Constant bit vectors.

use alloc::vec::Vec;
use core::fmt;

/// An arbitrary-width bit vector, the value of a constant vertex.
///
/// Bits above the width are always zero, so the derived equality and hash
/// compare values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    width: u32,
    /// Little-endian 64-bit words.
    words: Vec<u64>,
}

impl Bits {
    /// All zeros.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    pub fn zero(width: u32) -> Self {
        assert!(width > 0, "zero width constant");
        Self {
            width,
            words: vec![0; width.div_ceil(64) as usize],
        }
    }

    /// All ones.
    pub fn ones(width: u32) -> Self {
        let mut bits = Self::zero(width);
        bits.words.fill(u64::MAX);
        bits.mask();
        bits
    }

    /// The value truncated to `width` bits.
    pub fn from_u64(width: u32, value: u64) -> Self {
        let mut bits = Self::zero(width);
        bits.words[0] = value;
        bits.mask();
        bits
    }

    fn mask(&mut self) {
        let used = self.width % 64;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }

    /// Number of bits.
    pub fn width(&self) -> u32 { self.width }

    /// The 64-bit words, least significant first.
    pub fn words(&self) -> &[u64] { &self.words }

    /// Get a single bit.
    pub fn bit(&self, index: u32) -> bool {
        index < self.width && self.words[(index / 64) as usize] >> (index % 64) & 1 == 1
    }

    /// Set a single bit.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_bit(&mut self, index: u32, value: bool) {
        assert!(index < self.width, "bit {} out of range for width {}", index, self.width);
        let word = &mut self.words[(index / 64) as usize];
        if value {
            *word |= 1 << (index % 64);
        } else {
            *word &= !(1 << (index % 64));
        }
    }

    /// Check if all bits are zero.
    pub fn is_zero(&self) -> bool { self.words.iter().all(|word| *word == 0) }

    /// Check if all bits are one.
    pub fn is_ones(&self) -> bool { *self == Self::ones(self.width) }
}

impl fmt::Display for Bits {
    /// Formats as a sized hexadecimal literal, e.g. `8'h0f`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h", self.width)?;
        for nibble in (0..self.width.div_ceil(4)).rev() {
            let word = self.words[(nibble / 16) as usize];
            let digit = (word >> (nibble % 16 * 4)) & 0xf;
            write!(f, "{:x}", digit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits() {
        let three = Bits::from_u64(8, 3);
        assert_eq!(three.width(), 8);
        assert!(three.bit(0) && three.bit(1) && !three.bit(2));
        assert!(!three.is_zero());
        assert!(!three.is_ones());
        assert_eq!(format!("{}", three), "8'h03");

        assert_eq!(Bits::from_u64(4, 0x1f), Bits::ones(4));
        assert!(Bits::ones(70).is_ones());
        assert!(Bits::zero(70).is_zero());
        assert_eq!(format!("{}", Bits::ones(5)), "5'h1f");
    }

    #[test]
    fn test_wide_bits() {
        let mut wide = Bits::zero(100);
        wide.set_bit(99, true);
        wide.set_bit(0, true);
        assert_eq!(wide.words(), &[1, 1 << 35]);
        assert_eq!(format!("{}", wide), "100'h8000000000000000000000001");
        wide.set_bit(99, false);
        assert_eq!(wide, Bits::from_u64(100, 1));
    }

    #[test]
    #[should_panic(expected = "zero width")]
    fn test_zero_width() { Bits::zero(0); }
}
