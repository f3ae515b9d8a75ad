//! Index-sequence generation over a shape.

use crate::order::Order;

/// Yields every coordinate within `[0, shape)` exactly once, in the requested
/// traversal order.
///
/// The iterator is finite and restartable: a fresh call to [`indices`] (or
/// [`IndexIter::new`]) produces a fresh traversal. It can be fully collected
/// or consumed incrementally for large shapes.
#[derive(Debug, Clone)]
pub struct IndexIter<const N: usize> {
    shape: [usize; N],
    order: Order,
    next: [usize; N],
    remaining: usize,
}

impl<const N: usize> IndexIter<N> {
    pub fn new(shape: [usize; N], order: Order) -> Self {
        Self {
            shape,
            order,
            next: [0; N],
            remaining: shape.iter().product(),
        }
    }

    pub fn row_major(shape: [usize; N]) -> Self {
        Self::new(shape, Order::RowMajor)
    }

    pub fn col_major(shape: [usize; N]) -> Self {
        Self::new(shape, Order::ColMajor)
    }

    /// Advance the coordinate by one step in the traversal order, with carry.
    #[inline]
    fn advance(&mut self) {
        match self.order {
            Order::RowMajor => {
                for i in (0..N).rev() {
                    self.next[i] += 1;
                    if self.next[i] < self.shape[i] {
                        return;
                    }
                    self.next[i] = 0;
                }
            }
            Order::ColMajor => {
                for i in 0..N {
                    self.next[i] += 1;
                    if self.next[i] < self.shape[i] {
                        return;
                    }
                    self.next[i] = 0;
                }
            }
        }
    }
}

impl<const N: usize> Iterator for IndexIter<N> {
    type Item = [usize; N];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.advance();
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const N: usize> ExactSizeIterator for IndexIter<N> {}

impl<const N: usize> std::iter::FusedIterator for IndexIter<N> {}

/// Produce the index sequence for a shape in the given traversal order.
pub fn indices<const N: usize>(shape: [usize; N], order: Order) -> IndexIter<N> {
    IndexIter::new(shape, order)
}
