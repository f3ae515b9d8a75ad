//! Memory layout and the flat-offset <-> coordinate bijection.

/// Canonical order in which a dense buffer's elements correspond to
/// increasing flat offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Last axis varies fastest (C order).
    #[default]
    RowMajor,
    /// First axis varies fastest (Fortran order).
    ColMajor,
}

impl Order {
    /// Dense strides for a freshly allocated buffer of the given shape.
    ///
    /// Zero-extent axes are treated as extent 1 so the remaining strides stay
    /// well formed; such a buffer holds no elements anyway.
    pub fn strides<const N: usize>(self, shape: &[usize; N]) -> [isize; N] {
        let mut strides = [0isize; N];
        let mut acc = 1isize;
        match self {
            Order::RowMajor => {
                for i in (0..N).rev() {
                    strides[i] = acc;
                    acc *= shape[i].max(1) as isize;
                }
            }
            Order::ColMajor => {
                for i in 0..N {
                    strides[i] = acc;
                    acc *= shape[i].max(1) as isize;
                }
            }
        }
        strides
    }
}

/// Convert a coordinate to its flat offset within a dense buffer of the given
/// shape and order.
///
/// `ravel_index` and [`unravel_index`] are mutual inverses for every valid
/// coordinate/offset pair.
#[inline]
pub fn ravel_index<const N: usize>(index: &[usize; N], shape: &[usize; N], order: Order) -> usize {
    let strides = order.strides(shape);
    let mut flat = 0usize;
    for i in 0..N {
        flat += index[i] * strides[i] as usize;
    }
    flat
}

/// Convert a flat offset back to a coordinate. Inverse of [`ravel_index`].
#[inline]
pub fn unravel_index<const N: usize>(mut flat: usize, shape: &[usize; N], order: Order) -> [usize; N] {
    let mut index = [0usize; N];
    match order {
        Order::RowMajor => {
            for i in (0..N).rev() {
                let extent = shape[i].max(1);
                index[i] = flat % extent;
                flat /= extent;
            }
        }
        Order::ColMajor => {
            for i in 0..N {
                let extent = shape[i].max(1);
                index[i] = flat % extent;
                flat /= extent;
            }
        }
    }
    index
}
