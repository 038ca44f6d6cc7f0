extern crate std;

use std::io::{self, IoSlice, Write};

use crate::HybridVec;

/// Write is implemented for `HybridVec<u8, N>` by appending to the vector.
/// The vector grows as needed; allocation failure surfaces as
/// [`io::ErrorKind::OutOfMemory`] rather than aborting.
impl<const N: usize> Write for HybridVec<u8, N> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_reserve_for(buf.len())?;
        for &byte in buf {
            // SAFETY: capacity was reserved above.
            unsafe { self.push_unchecked(byte) };
        }
        Ok(buf.len())
    }

    #[inline(always)]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[inline]
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let num = bufs.iter().map(|b| b.len()).sum::<usize>();
        self.try_reserve_for(num)?;
        for buf in bufs {
            for &byte in buf.iter() {
                // SAFETY: capacity was reserved above.
                unsafe { self.push_unchecked(byte) };
            }
        }
        Ok(num)
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write(self, buf)?;
        Ok(())
    }
}

impl<const N: usize> HybridVec<u8, N> {
    /// Reserves room for `additional` more bytes, mapping allocation failure
    /// into an [`io::Error`].
    ///
    /// When growth is needed, requests geometric headroom rather than an
    /// exact fit, so a stream of small writes reallocates O(log n) times
    /// instead of once per call. Falls back to the exact amount if the
    /// larger allocation is refused.
    #[inline]
    fn try_reserve_for(&mut self, additional: usize) -> io::Result<()> {
        let required = self
            .len()
            .checked_add(additional)
            .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "capacity overflow"))?;
        if required <= self.capacity() {
            return Ok(());
        }
        let target = required.max(self.capacity().saturating_mul(2));
        self.try_reserve(target)
            .or_else(|_| self.try_reserve(required))
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))
    }
}
