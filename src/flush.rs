use crate::StationError;

/// Receives dirty blocks when the EEPROM mirror is committed.
pub trait FlushSink {
    /// Programs one block of the physical medium at `addr`.
    fn flush_block(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError>;
    /// Called once after all dirty blocks of a commit were flushed.
    fn finish(&mut self) -> Result<(), StationError> {
        Ok(())
    }
}

/// Sink that discards flushes; the RAM mirror is the only copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFlush;

impl FlushSink for NoFlush {
    fn flush_block(&mut self, _addr: u16, _data: &[u8]) -> Result<(), StationError> {
        Ok(())
    }
}
