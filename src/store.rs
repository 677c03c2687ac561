use crate::{StationError, flush::FlushSink, table::EepromTable};

/// Byte-addressable non-volatile memory holding the station image.
pub trait NonVolatileStore {
    /// The whole current image, `capacity()` bytes long.
    fn image(&self) -> &[u8];
    fn read(&self, addr: u16, buf: &mut [u8]) -> Result<(), StationError>;
    /// Stages `data` at `addr`; durable only after [`commit`](Self::commit).
    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError>;
    fn commit(&mut self) -> Result<(), StationError>;
    fn capacity(&self) -> usize;
}

/// EEPROM mirrored in RAM, flushed block by block on commit.
///
/// # Const Generics
/// - `TS`: Total size of the EEPROM in bytes
/// - `BS`: Block size in bytes for dirty tracking granularity
/// - `BC`: Block count (must equal `TS / BS`)
pub struct ShadowEeprom<const TS: usize, const BS: usize, const BC: usize, F>
where
    F: FlushSink,
    bitmaps::BitsImpl<BC>: bitmaps::Bits,
{
    table: EepromTable<TS, BS, BC>,
    sink: F,
}

impl<const TS: usize, const BS: usize, const BC: usize, F> ShadowEeprom<TS, BS, BC, F>
where
    F: FlushSink,
    bitmaps::BitsImpl<BC>: bitmaps::Bits,
{
    pub fn new(sink: F) -> Self {
        Self {
            table: EepromTable::new(),
            sink,
        }
    }

    /// Seeds the mirror from the physical medium without marking dirty.
    ///
    /// Use this at boot, before the persistence layer reads the image.
    pub fn load(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError> {
        self.table.load(addr, data)
    }

    /// Returns true if any byte in the range differs from the last commit.
    pub fn is_dirty(&self, addr: u16, len: usize) -> Result<bool, StationError> {
        self.table.is_dirty(addr, len)
    }

    pub fn any_dirty(&self) -> bool {
        self.table.any_dirty()
    }

    pub fn sink(&self) -> &F {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut F {
        &mut self.sink
    }
}

impl<const TS: usize, const BS: usize, const BC: usize, F> NonVolatileStore
    for ShadowEeprom<TS, BS, BC, F>
where
    F: FlushSink,
    bitmaps::BitsImpl<BC>: bitmaps::Bits,
{
    fn image(&self) -> &[u8] {
        self.table.bytes()
    }

    fn read(&self, addr: u16, buf: &mut [u8]) -> Result<(), StationError> {
        self.table.read(addr, buf)
    }

    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError> {
        self.table.write(addr, data)
    }

    /// Flushes dirty blocks in address order. Dirty state is kept if the
    /// sink fails so a later commit retries.
    fn commit(&mut self) -> Result<(), StationError> {
        if !self.table.any_dirty() {
            return Ok(());
        }
        let sink = &mut self.sink;
        self.table
            .iter_dirty(|addr, data| sink.flush_block(addr, data))?;
        self.sink.finish()?;
        self.table.clear_all_dirty();
        ::log::debug!("eeprom commit complete");
        Ok(())
    }

    #[inline]
    fn capacity(&self) -> usize {
        TS
    }
}
