use core::marker::PhantomData;

use bitmaps::{Bits, BitsImpl};

use crate::{
    flush::{FlushSink, NoFlush},
    store::ShadowEeprom,
};

// Builder states
pub struct NeedTotalSize;
pub struct NeedBlockSize;
pub struct NeedBlockCount;
pub struct NeedFlushSink;
pub struct Ready;

/// Typestate builder for [`ShadowEeprom`].
///
/// ```
/// use access_station::prelude::*;
///
/// // 8 KiB EEPROM flushed in 64-byte pages
/// let store = EepromBuilder::new()
///     .total_size::<8192>()
///     .block_size::<64>()
///     .block_count::<128>()
///     .no_flush()
///     .build();
/// assert_eq!(store.capacity(), 8192);
/// ```
pub struct EepromBuilder<const TS: usize, const BS: usize, const BC: usize, F, State> {
    sink: Option<F>,
    _phantom: PhantomData<State>,
}

impl EepromBuilder<0, 0, 0, (), NeedTotalSize> {
    pub fn new() -> Self {
        EepromBuilder {
            sink: None,
            _phantom: PhantomData,
        }
    }

    pub fn total_size<const TS: usize>(self) -> EepromBuilder<TS, 0, 0, (), NeedBlockSize> {
        EepromBuilder {
            sink: None,
            _phantom: PhantomData,
        }
    }
}

impl Default for EepromBuilder<0, 0, 0, (), NeedTotalSize> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const TS: usize> EepromBuilder<TS, 0, 0, (), NeedBlockSize> {
    /// Sets the flush granularity, typically the EEPROM page size.
    pub fn block_size<const BS: usize>(self) -> EepromBuilder<TS, BS, 0, (), NeedBlockCount> {
        EepromBuilder {
            sink: None,
            _phantom: PhantomData,
        }
    }
}

impl<const TS: usize, const BS: usize> EepromBuilder<TS, BS, 0, (), NeedBlockCount> {
    /// Set the number of blocks.
    ///
    /// # Panics
    /// Panics at runtime if TS != BS * BC.
    pub fn block_count<const BC: usize>(self) -> EepromBuilder<TS, BS, BC, (), NeedFlushSink> {
        assert_eq!(
            TS,
            BS * BC,
            "Total size {} does not match block_size {} * block_count {} = {}",
            TS,
            BS,
            BC,
            BS * BC
        );

        EepromBuilder {
            sink: None,
            _phantom: PhantomData,
        }
    }
}

impl<const TS: usize, const BS: usize, const BC: usize>
    EepromBuilder<TS, BS, BC, (), NeedFlushSink>
{
    /// Set the sink that programs dirty blocks into the physical medium.
    pub fn flush_sink<F: FlushSink>(self, sink: F) -> EepromBuilder<TS, BS, BC, F, Ready> {
        EepromBuilder {
            sink: Some(sink),
            _phantom: PhantomData,
        }
    }

    /// Keep the image in RAM only.
    pub fn no_flush(self) -> EepromBuilder<TS, BS, BC, NoFlush, Ready> {
        self.flush_sink(NoFlush)
    }
}

impl<const TS: usize, const BS: usize, const BC: usize, F>
    EepromBuilder<TS, BS, BC, F, Ready>
where
    F: FlushSink,
    BitsImpl<BC>: Bits,
{
    pub fn build(self) -> ShadowEeprom<TS, BS, BC, F> {
        match self.sink {
            Some(sink) => ShadowEeprom::new(sink),
            // Ready is only reachable through flush_sink.
            None => unreachable!("flush sink not set"),
        }
    }
}
