//! Test support utilities - only compiled in test builds.

use core::cell::Cell;

use heapless::{Deque, Vec};

use crate::{
    StationError,
    clock::{TickClock, TickSource},
    flush::FlushSink,
    persistence::PersistenceManager,
    store::ShadowEeprom,
    sync::{Delay, Listener, Socket},
};

/// Standard test configuration: 512 bytes, 32-byte blocks, 16 blocks
pub type TestEeprom = ShadowEeprom<512, 32, 16, RecordingSink>;
pub type TestClock = TickClock<ManualTicks>;
pub type TestManager = PersistenceManager<TestEeprom, TestClock>;

const MEDIUM_SIZE: usize = 512;

/// Helper to create a manager over a blank store with an unset clock.
pub fn test_manager() -> TestManager {
    PersistenceManager::new(
        TestEeprom::new(RecordingSink::default()),
        TickClock::new(ManualTicks::new(0)),
    )
}

/// Helper to create a manager whose store already holds `image`.
pub fn test_manager_with_image(image: &[u8]) -> TestManager {
    let mut store = TestEeprom::new(RecordingSink::default());
    store.load(0, image).unwrap();
    PersistenceManager::new(store, TickClock::new(ManualTicks::new(0)))
}

/// Flush sink that mirrors flushed blocks into a fake medium.
pub struct RecordingSink {
    pub medium: [u8; MEDIUM_SIZE],
    pub blocks: Vec<u16, 16>,
    pub finished: usize,
    fail: bool,
}

impl RecordingSink {
    /// A sink whose every flush fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            medium: [0xFF; MEDIUM_SIZE],
            blocks: Vec::new(),
            finished: 0,
            fail: false,
        }
    }
}

impl FlushSink for RecordingSink {
    fn flush_block(&mut self, addr: u16, data: &[u8]) -> Result<(), StationError> {
        if self.fail {
            return Err(StationError::OutOfBounds);
        }
        let start = addr as usize;
        self.medium
            .get_mut(start..start + data.len())
            .ok_or(StationError::OutOfBounds)?
            .copy_from_slice(data);
        self.blocks.push(addr).map_err(|_| StationError::Full)
    }

    fn finish(&mut self) -> Result<(), StationError> {
        self.finished += 1;
        Ok(())
    }
}

/// Millisecond counter advanced by hand.
pub struct ManualTicks {
    now: Cell<u32>,
}

impl ManualTicks {
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl TickSource for ManualTicks {
    fn millis(&self) -> u32 {
        self.now.get()
    }
}

/// In-memory peer connection with scripted input.
pub struct MemorySocket {
    input: Deque<u8, 1024>,
    pub output: Vec<u8, 1024>,
    pub writes: usize,
    read_limit: usize,
    consumed: usize,
    gap_after: Option<usize>,
}

impl MemorySocket {
    pub fn new(input: &[u8]) -> Self {
        let mut queue = Deque::new();
        for b in input {
            queue.push_back(*b).unwrap();
        }
        Self {
            input: queue,
            output: Vec::new(),
            writes: 0,
            read_limit: usize::MAX,
            consumed: 0,
            gap_after: None,
        }
    }

    /// Caps how many bytes one `read_bytes` call returns.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit;
        self
    }

    /// Input runs dry once after `n` bytes, as if the rest arrived later.
    pub fn with_gap_after(mut self, n: usize) -> Self {
        self.gap_after = Some(n);
        self
    }

    fn at_gap(&mut self) -> bool {
        if self.gap_after == Some(self.consumed) {
            self.gap_after = None;
            return true;
        }
        false
    }
}

impl Socket for MemorySocket {
    fn available(&mut self) -> usize {
        match self.gap_after {
            Some(gap) => gap.saturating_sub(self.consumed),
            None => self.input.len(),
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.at_gap() {
            return None;
        }
        let b = self.input.pop_front()?;
        self.consumed += 1;
        Some(b)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        if self.at_gap() {
            return 0;
        }
        let mut n = buf.len().min(self.read_limit).min(self.input.len());
        if let Some(gap) = self.gap_after {
            n = n.min(gap - self.consumed);
        }
        for slot in buf.iter_mut().take(n) {
            *slot = self.input.pop_front().unwrap();
        }
        self.consumed += n;
        n
    }

    fn write(&mut self, data: &[u8]) -> Result<(), StationError> {
        self.writes += 1;
        self.output
            .extend_from_slice(data)
            .map_err(|_| StationError::Socket)
    }
}

/// Delay that only records how long it was asked to wait.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl Delay for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

/// Listener that hands out at most one connection.
pub struct OneShotListener {
    socket: Option<MemorySocket>,
}

impl OneShotListener {
    pub fn new(socket: MemorySocket) -> Self {
        Self {
            socket: Some(socket),
        }
    }

    pub fn empty() -> Self {
        Self { socket: None }
    }
}

impl Listener for OneShotListener {
    type Socket = MemorySocket;

    fn accept(&mut self) -> Option<MemorySocket> {
        self.socket.take()
    }
}
