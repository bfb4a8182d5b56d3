//! Bit-stream views of trie keys.

use crate::order::Binary;

/// Exposes the key of an element as a finite sequence of bits.
///
/// The [`Trie`](crate::Trie) only ever looks at elements through this view:
/// two elements are the same key exactly when their bit strings are equal.
/// Implementations must be deterministic and free of side effects.
pub trait BitView<T: ?Sized> {
    /// Returns the number of bits in the key of `element`.
    fn bit_len(&self, element: &T) -> usize;

    /// Returns bit `index` of the key of `element`, where `index` is less
    /// than [`bit_len`](BitView::bit_len).
    fn bit(&self, element: &T, index: usize) -> bool;
}

/// Views a [`Binary`] value as the bits below its highest set bit, most
/// significant first.
///
/// The leading one is implied by the length, so values with distinct bit
/// patterns always yield distinct keys. The all-zero value, which has no
/// leading one, yields `8 * WIDTH` zero bits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryBits;

impl BinaryBits {
    /// Returns the position of the highest set bit counted from the least
    /// significant end, or `None` for the all-zero value.
    fn highest_set_bit<T: Binary>(element: &T) -> Option<usize> {
        for index in 0..T::WIDTH {
            let byte = element.byte(index);
            if byte != 0 {
                let within = 7 - byte.leading_zeros() as usize;
                return Some((T::WIDTH - 1 - index) * 8 + within);
            }
        }
        None
    }

    #[inline]
    fn raw_bit<T: Binary>(element: &T, position: usize) -> bool {
        let byte = element.byte(T::WIDTH - 1 - position / 8);
        byte >> (position % 8) & 1 == 1
    }
}

impl<T: Binary> BitView<T> for BinaryBits {
    #[inline]
    fn bit_len(&self, element: &T) -> usize {
        Self::highest_set_bit(element).unwrap_or(T::WIDTH * 8)
    }

    #[inline]
    fn bit(&self, element: &T, index: usize) -> bool {
        let top = Self::highest_set_bit(element).unwrap_or(T::WIDTH * 8);
        Self::raw_bit(element, top - 1 - index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits<T: Binary>(value: T) -> ([bool; 128], usize) {
        let mut out = [false; 128];
        let len = BinaryBits.bit_len(&value);
        for (i, slot) in out.iter_mut().enumerate().take(len) {
            *slot = BinaryBits.bit(&value, i);
        }
        (out, len)
    }

    #[test]
    fn trims_to_highest_set_bit() {
        let (b, len) = bits(0b0000_0101u8);
        assert_eq!(len, 2);
        assert_eq!(&b[..2], &[false, true]);

        let (_, len) = bits(1u32);
        assert_eq!(len, 0);

        let (b, len) = bits(0x0100u16);
        assert_eq!(len, 8);
        assert!(b[..8].iter().all(|bit| !bit));
    }

    #[test]
    fn zero_has_full_width() {
        let (b, len) = bits(0u16);
        assert_eq!(len, 16);
        assert!(b[..16].iter().all(|bit| !bit));
    }

    #[test]
    fn distinct_values_yield_distinct_keys() {
        let mut seen = std::vec::Vec::new();
        for value in 0..=255u8 {
            let key = bits(value);
            assert!(!seen.contains(&key));
            seen.push(key);
        }
    }
}
