use std::fmt;
use std::io::SeekFrom;

use crate::error::{Result, UadbError};
use crate::storage::source::ReadSeek;

/// One cursor over a source. Checked out of the [`Pool`](crate::storage::pool::Pool)
/// by exactly one caller at a time.
pub struct Reader {
    id: usize,
    stream: Box<dyn ReadSeek>,
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("id", &self.id).finish()
    }
}

impl Reader {
    pub fn new(id: usize, stream: Box<dyn ReadSeek>) -> Self {
        Self { id, stream }
    }

    /// Stable identity of this reader within its pool
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.stream.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf)?;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read `count` consecutive little-endian i32 values
    pub fn read_i32_array(&mut self, count: usize) -> Result<Vec<i32>> {
        let bytes = self.read_bytes(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Read a count field, rejecting negative values
    pub fn read_count_i32(&mut self, what: &'static str) -> Result<u32> {
        let count = self.read_i32()?;
        u32::try_from(count).map_err(|_| UadbError::ImpossibleCount {
            what,
            count: count as i64,
        })
    }

    /// Read a 16-bit count field, rejecting negative values
    pub fn read_count_i16(&mut self, what: &'static str) -> Result<u32> {
        let count = self.read_i16()?;
        u32::try_from(count).map_err(|_| UadbError::ImpossibleCount {
            what,
            count: count as i64,
        })
    }
}
