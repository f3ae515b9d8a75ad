//! Binary persistence.
//!
//! The on-disk format is a `u64` little-endian element count followed by the
//! raw little-endian bytes of each element in row-major order. Shape is not
//! persisted; readers recover a rank-1 tensor and reshape as needed. Writes
//! go element by element, so hand the writer a `BufWriter` for anything
//! large.

use crate::dense::Tensor;
use crate::expr::Expression;
use crate::order::Order;
use crate::{NdError, Result};
use num_complex::Complex;
use std::io::{Read, Write};

/// An element type with a fixed-width little-endian byte encoding.
pub trait Pod: Copy {
    /// Encoded width in bytes.
    const BYTES: usize;

    /// Encode into the first [`Pod::BYTES`] bytes of `buf`.
    fn write_le(self, buf: &mut [u8]);

    /// Decode from the first [`Pod::BYTES`] bytes of `buf`.
    fn read_le(buf: &[u8]) -> Self;
}

macro_rules! impl_pod {
    ($($t:ty),* $(,)?) => {$(
        impl Pod for $t {
            const BYTES: usize = std::mem::size_of::<$t>();

            #[inline]
            fn write_le(self, buf: &mut [u8]) {
                buf[..Self::BYTES].copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(buf: &[u8]) -> Self {
                let mut bytes = [0u8; std::mem::size_of::<$t>()];
                bytes.copy_from_slice(&buf[..Self::BYTES]);
                Self::from_le_bytes(bytes)
            }
        }
    )*};
}

impl_pod!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Real and imaginary parts in sequence, each in the scalar encoding.
impl<T: Pod> Pod for Complex<T> {
    const BYTES: usize = 2 * T::BYTES;

    #[inline]
    fn write_le(self, buf: &mut [u8]) {
        self.re.write_le(&mut buf[..T::BYTES]);
        self.im.write_le(&mut buf[T::BYTES..]);
    }

    #[inline]
    fn read_le(buf: &[u8]) -> Self {
        Complex::new(T::read_le(&buf[..T::BYTES]), T::read_le(&buf[T::BYTES..]))
    }
}

/// Write an expression's elements to `writer`: a `u64` count, then each
/// element's bytes in row-major order.
///
/// # Errors
/// Propagates I/O failures as [`NdError::Io`].
pub fn write_tensor<E, T, W, const N: usize>(writer: &mut W, src: E) -> Result<()>
where
    E: Expression<N, Elem = T>,
    T: Pod,
    W: Write,
{
    writer.write_all(&(src.size() as u64).to_le_bytes())?;
    let mut buf = vec![0u8; T::BYTES];
    for value in src.iter() {
        value.write_le(&mut buf);
        writer.write_all(&buf)?;
    }
    Ok(())
}

/// Read a tensor previously written with [`write_tensor`], as rank 1.
///
/// # Errors
/// Propagates I/O failures (including truncation, surfaced by `read_exact`)
/// as [`NdError::Io`], and a count too large to buffer as
/// [`NdError::AllocationFailure`].
pub fn read_vector<T, R>(reader: &mut R) -> Result<Tensor<T, 1>>
where
    T: Pod,
    R: Read,
{
    let mut header = [0u8; 8];
    reader.read_exact(&mut header)?;
    let requested = u64::from_le_bytes(header) as usize;
    let mut data = Vec::new();
    data.try_reserve_exact(requested)
        .map_err(|_| NdError::AllocationFailure { requested })?;
    let mut buf = vec![0u8; T::BYTES];
    for _ in 0..requested {
        reader.read_exact(&mut buf)?;
        data.push(T::read_le(&buf));
    }
    Ok(Tensor::from_parts(data, [requested], Order::RowMajor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::io::Cursor;

    #[test]
    fn test_round_trip_f64() {
        let t = Tensor::from_fn([2, 3], |[i, j]| (i * 3 + j) as f64);
        let mut buf = Vec::new();
        write_tensor(&mut buf, &t).unwrap();
        assert_eq!(buf.len(), 8 + 6 * 8);
        assert_eq!(&buf[..8], &6u64.to_le_bytes());

        let back: Tensor<f64, 1> = read_vector(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.shape(), &[6]);
        assert_eq!(back.as_slice(), t.as_slice());
    }

    #[test]
    fn test_round_trip_complex() {
        let t = Tensor::from_vec(
            [2],
            vec![Complex64::new(1.0, -2.0), Complex64::new(0.5, 3.5)],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_tensor(&mut buf, &t).unwrap();
        assert_eq!(buf.len(), 8 + 2 * 16);

        let back: Tensor<Complex64, 1> = read_vector(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.as_slice(), t.as_slice());
    }

    #[test]
    fn test_writes_expression_in_row_major_order() {
        let t = Tensor::from_fn_in([2, 2], Order::ColMajor, |[i, j]| (i * 2 + j) as i32);
        let mut buf = Vec::new();
        write_tensor(&mut buf, &t).unwrap();
        let back: Tensor<i32, 1> = read_vector(&mut Cursor::new(buf)).unwrap();
        // Row-major element order regardless of the source layout.
        assert_eq!(back.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_truncated_stream_is_an_io_error() {
        let t = Tensor::from_vec([3], vec![1.0f64, 2.0, 3.0]).unwrap();
        let mut buf = Vec::new();
        write_tensor(&mut buf, &t).unwrap();
        buf.truncate(buf.len() - 4);
        let err = read_vector::<f64, _>(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, NdError::Io(_)));
    }
}
