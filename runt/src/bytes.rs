use log::{debug, warn};

use crate::{ByteId, VmError, VmResult};

/// Bump allocator over a caller supplied byte buffer.
///
/// Allocations are never reclaimed individually, the only way to get
/// memory back is [`ByteArena::reset`]. There is no alignment beyond byte
/// granularity; typed data is stored little-endian.
pub struct ByteArena<'a> {
    data: &'a mut [u8],
    used: usize,
}

impl<'a> ByteArena<'a> {
    /// Binds `data` as backing storage and zero fills it.
    pub fn new(data: &'a mut [u8]) -> Self {
        let mut arena = Self { data, used: 0 };
        arena.reset();
        arena
    }

    pub fn reset(&mut self) {
        self.data.fill(0);
        self.used = 0;
        debug!("byte arena configured with {} bytes", self.data.len());
    }

    /// Reserves `size` bytes and returns the 1-based id of the first one.
    /// A failed allocation leaves the arena untouched.
    pub fn allocate(&mut self, size: usize) -> VmResult<ByteId> {
        let full = VmError::ByteArenaFull {
            requested: size,
            used: self.used,
            capacity: self.data.len(),
        };

        let end = match self.used.checked_add(size) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                warn!("{full}");
                return Err(full);
            }
        };

        let id = u32::try_from(self.used + 1)
            .ok()
            .and_then(ByteId::new)
            .ok_or(full)?;
        self.used = end;
        Ok(id)
    }

    /// Reserves `bytes.len()` bytes and copies `bytes` into them.
    pub fn allocate_copy(&mut self, bytes: &[u8]) -> VmResult<ByteId> {
        let id = self.allocate(bytes.len())?;
        self.bytes_mut(id, bytes.len())?.copy_from_slice(bytes);
        Ok(id)
    }

    pub fn bytes(&self, id: ByteId, len: usize) -> VmResult<&[u8]> {
        let start = id.offset();
        let end = self.checked_end(start, len)?;
        Ok(&self.data[start..end])
    }

    pub fn bytes_mut(&mut self, id: ByteId, len: usize) -> VmResult<&mut [u8]> {
        let start = id.offset();
        let end = self.checked_end(start, len)?;
        Ok(&mut self.data[start..end])
    }

    pub(crate) fn read_u32(&self, id: ByteId, at: usize) -> VmResult<u32> {
        let start = id.offset() + at;
        let end = self.checked_end(start, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.data[start..end]);
        Ok(u32::from_le_bytes(raw))
    }

    pub(crate) fn write_u32(&mut self, id: ByteId, at: usize, value: u32) -> VmResult<()> {
        let start = id.offset() + at;
        let end = self.checked_end(start, 4)?;
        self.data[start..end].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    // only memory handed out so far is addressable
    fn checked_end(&self, start: usize, len: usize) -> VmResult<usize> {
        match start.checked_add(len) {
            Some(end) if end <= self.used => Ok(end),
            _ => Err(VmError::InvalidHandle),
        }
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }
}
