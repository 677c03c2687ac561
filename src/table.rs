use crate::{
    StationError,
    helpers::{block_span, range_span},
};

/// RAM mirror of the EEPROM with block-granular dirty tracking.
pub(crate) struct EepromTable<const TS: usize, const BS: usize, const BC: usize>
where
    bitmaps::BitsImpl<BC>: bitmaps::Bits,
{
    bytes: [u8; TS],
    dirty: bitmaps::Bitmap<BC>,
}

impl<const TS: usize, const BS: usize, const BC: usize> EepromTable<TS, BS, BC>
where
    bitmaps::BitsImpl<BC>: bitmaps::Bits,
{
    pub(crate) fn new() -> Self {
        debug_assert!(
            TS == BS * BC,
            "Total size must match block size x block count",
        );

        Self {
            // Erased EEPROM cells read back as 0xFF.
            bytes: [0xFF; TS],
            dirty: bitmaps::Bitmap::new(),
        }
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn read(&self, addr: u16, buf: &mut [u8]) -> Result<(), StationError> {
        let (offset, end) = range_span::<TS>(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes[offset..end]);
        Ok(())
    }

    /// Writes and marks the touched blocks dirty. Unchanged bytes leave
    /// their blocks clean.
    pub(crate) fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError> {
        let (offset, end) = range_span::<TS>(addr, data.len())?;
        if self.bytes[offset..end] == *data {
            return Ok(());
        }
        self.bytes[offset..end].copy_from_slice(data);
        self.mark_dirty(addr, data.len())
    }

    /// Writes without marking dirty, for seeding from the physical medium.
    pub(crate) fn load(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError> {
        let (offset, end) = range_span::<TS>(addr, data.len())?;
        self.bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    pub(crate) fn iter_dirty<F>(&self, mut f: F) -> Result<(), StationError>
    where
        F: FnMut(u16, &[u8]) -> Result<(), StationError>,
    {
        let mut idx = self.dirty.first_index();
        while let Some(block) = idx {
            let off = block * BS;
            let buf = &self.bytes[off..(off + BS)];
            f(off as u16, buf)?;
            idx = self.dirty.next_index(block);
        }
        Ok(())
    }

    pub(crate) fn is_dirty(&self, addr: u16, len: usize) -> Result<bool, StationError> {
        let (sb, eb) = block_span::<TS, BS, BC>(addr, len)?;
        Ok((sb..=eb).any(|block| self.dirty.get(block)))
    }

    pub(crate) fn any_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub(crate) fn clear_all_dirty(&mut self) {
        self.dirty = bitmaps::Bitmap::new();
    }

    fn mark_dirty(&mut self, addr: u16, len: usize) -> Result<(), StationError> {
        let (sb, eb) = block_span::<TS, BS, BC>(addr, len)?;
        for block in sb..=eb {
            self.dirty.set(block, true);
        }
        Ok(())
    }
}
