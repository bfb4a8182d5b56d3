//! Total orders for [`Tree`](crate::Tree) and the fixed-width binary view of
//! primitive values they default to.

use core::cmp::Ordering;

/// A fixed-width, big-endian byte view of a value's representation.
///
/// Signed integers are viewed as their two's complement bit pattern, so
/// orders derived from this view treat negative values as larger than
/// positive ones.
pub trait Binary {
    /// The number of bytes in the representation.
    const WIDTH: usize;

    /// Returns byte `index` of the representation, where byte 0 is the most
    /// significant one.
    ///
    /// Callers never pass an `index` of `WIDTH` or more.
    fn byte(&self, index: usize) -> u8;
}

macro_rules! binary_int {
    ($($ty:ty),*) => {$(
        impl Binary for $ty {
            const WIDTH: usize = core::mem::size_of::<$ty>();

            #[inline]
            fn byte(&self, index: usize) -> u8 {
                self.to_be_bytes()[index]
            }
        }
    )*};
}

binary_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Binary for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn byte(&self, _index: usize) -> u8 {
        *self as u8
    }
}

impl Binary for char {
    const WIDTH: usize = 4;

    #[inline]
    fn byte(&self, index: usize) -> u8 {
        (*self as u32).to_be_bytes()[index]
    }
}

impl<const N: usize> Binary for [u8; N] {
    const WIDTH: usize = N;

    #[inline]
    fn byte(&self, index: usize) -> u8 {
        self[index]
    }
}

/// A total order over `T`, injected into a [`Tree`](crate::Tree).
///
/// Implementations must be consistent (a total order) and free of side
/// effects observable by the tree. Any `Fn(&T, &T) -> Ordering` qualifies:
///
/// ```
/// use sheaf::Tree;
///
/// let mut tree = Tree::with_compare(|a: &i32, b: &i32| b.cmp(a)).unwrap();
/// for x in [3, 1, 2] {
///     tree.add_right(x).unwrap();
/// }
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
/// ```
pub trait Compare<T: ?Sized> {
    /// Compares two elements.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders values by unsigned lexicographic comparison of their [`Binary`]
/// representation, most significant byte first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryOrder;

impl<T: Binary> Compare<T> for BinaryOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        for index in 0..T::WIDTH {
            match a.byte(index).cmp(&b.byte(index)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_order_is_unsigned() {
        assert_eq!(BinaryOrder.compare(&1u32, &2u32), Ordering::Less);
        assert_eq!(BinaryOrder.compare(&0x0100u16, &0x00FFu16), Ordering::Greater);
        assert_eq!(BinaryOrder.compare(&7u64, &7u64), Ordering::Equal);
        assert_eq!(BinaryOrder.compare(&-1i8, &1i8), Ordering::Greater);
        assert_eq!(BinaryOrder.compare(&[1u8, 0], &[0u8, 255]), Ordering::Greater);
        assert_eq!(BinaryOrder.compare(&'a', &'b'), Ordering::Less);
    }

    #[test]
    fn closures_compare() {
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        assert_eq!(by_len.compare(&"abc", &"de"), Ordering::Greater);
    }
}
