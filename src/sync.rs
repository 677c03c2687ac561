//! Request/response exchange of the EEPROM image with a peer station.
//!
//! A request is `<cmd> <size> ` on the stream: one command byte, one
//! separator byte, decimal digits, one terminating byte.
//!
//! | cmd | meaning                  | response                              |
//! |-----|--------------------------|---------------------------------------|
//! | `N` | dump image               | `size` raw bytes, or `0\n` if oversize|
//! | `T` | fetch wall clock         | decimal seconds + `\n`, `0\n` if unset|
//! | `M` | ingest peer image        | none; `size` raw bytes follow request |

use core::fmt::Write as _;

use heapless::Vec;

use crate::{
    StationError,
    clock::Clock,
    persistence::{MergeOutcome, PersistenceManager},
    store::NonVolatileStore,
};

/// Reply sent when a request cannot be served.
pub const SENTINEL: &str = "0\n";

/// Byte stream to one connected peer.
pub trait Socket {
    /// Bytes that can be read without waiting.
    fn available(&mut self) -> usize;
    /// Next byte, or `None` if nothing has arrived yet or the peer closed.
    ///
    /// Must not block. The request parser waits one grace period on `None`
    /// before treating the request line as complete.
    fn read_byte(&mut self) -> Option<u8>;
    /// Reads up to `buf.len()` bytes; returns how many were read.
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize;
    fn write(&mut self, data: &[u8]) -> Result<(), StationError>;
    fn print(&mut self, text: &str) -> Result<(), StationError> {
        self.write(text.as_bytes())
    }
}

/// Source of incoming peer connections.
pub trait Listener {
    type Socket: Socket;
    fn accept(&mut self) -> Option<Self::Socket>;
}

pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

/// Protocol tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Wait before giving up on a connection with no pending bytes.
    pub grace_delay_ms: u32,
    /// Bytes moved per socket call while streaming an image.
    pub chunk_size: usize,
    /// Consecutive empty reads after which an ingest is abandoned.
    /// `None` waits for the full image indefinitely.
    pub stall_limit: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grace_delay_ms: 5,
            chunk_size: 8,
            stall_limit: None,
        }
    }
}

/// Parsed request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub command: u8,
    pub size: usize,
}

/// What one poll step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No connection, or no bytes arrived within the grace delay.
    Idle,
    /// `N`: streamed this many image bytes.
    Dumped { bytes: usize },
    /// `N` or `M` asked for more than the store holds.
    Oversize { requested: usize },
    /// `T`: replied with this value (0 if the clock was never set).
    TimeSent { seconds: u32 },
    /// `M`: image received and handed to the persistence layer.
    Ingested(MergeOutcome),
    /// `M`: peer stopped sending before the full image arrived.
    Stalled { received: usize },
    /// Unrecognized command byte; no reply sent.
    Unknown(u8),
}

/// Services one sync command per call.
///
/// `RX` bounds the receive buffer for `M`; it should equal the store
/// capacity.
pub struct SyncProtocol<D: Delay, const RX: usize> {
    delay: D,
    config: SyncConfig,
    rx: Vec<u8, RX>,
}

impl<D: Delay, const RX: usize> SyncProtocol<D, RX> {
    pub fn new(delay: D) -> Self {
        Self::with_config(delay, SyncConfig::default())
    }

    pub fn with_config(delay: D, mut config: SyncConfig) -> Self {
        config.chunk_size = config.chunk_size.clamp(1, 64);
        Self {
            delay,
            config,
            rx: Vec::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Accepts at most one pending connection and services one command.
    pub fn handle_clients<L, S, C>(
        &mut self,
        listener: &mut L,
        manager: &mut PersistenceManager<S, C>,
    ) -> Result<PollOutcome, StationError>
    where
        L: Listener,
        S: NonVolatileStore,
        C: Clock,
    {
        match listener.accept() {
            Some(mut socket) => self.process(&mut socket, manager),
            None => Ok(PollOutcome::Idle),
        }
    }

    /// Reads one request from `socket` and answers it.
    pub fn process<K, S, C>(
        &mut self,
        socket: &mut K,
        manager: &mut PersistenceManager<S, C>,
    ) -> Result<PollOutcome, StationError>
    where
        K: Socket,
        S: NonVolatileStore,
        C: Clock,
    {
        if socket.available() == 0 {
            self.delay.delay_ms(self.config.grace_delay_ms);
        }
        if socket.available() == 0 {
            return Ok(PollOutcome::Idle);
        }

        let Some(request) = self.read_request(socket) else {
            return Ok(PollOutcome::Idle);
        };
        ::log::debug!("sync request {:?}", request);

        match request.command {
            b'N' => self.send_image(socket, manager.store(), request.size),
            b'T' => send_time(socket, manager.clock()),
            b'M' => self.receive_image(socket, manager, request.size),
            other => {
                ::log::warn!("unknown sync command 0x{:02x}", other);
                Ok(PollOutcome::Unknown(other))
            }
        }
    }

    fn send_image<K: Socket, S: NonVolatileStore>(
        &mut self,
        socket: &mut K,
        store: &S,
        size: usize,
    ) -> Result<PollOutcome, StationError> {
        if size > store.capacity() {
            ::log::warn!("dump of {} bytes exceeds capacity {}", size, store.capacity());
            socket.print(SENTINEL)?;
            return Ok(PollOutcome::Oversize { requested: size });
        }

        for chunk in store.image()[..size].chunks(self.config.chunk_size) {
            socket.write(chunk)?;
        }
        ::log::info!("sent {} image bytes", size);
        Ok(PollOutcome::Dumped { bytes: size })
    }

    fn receive_image<K, S, C>(
        &mut self,
        socket: &mut K,
        manager: &mut PersistenceManager<S, C>,
        size: usize,
    ) -> Result<PollOutcome, StationError>
    where
        K: Socket,
        S: NonVolatileStore,
        C: Clock,
    {
        if size > manager.store().capacity() || size > RX {
            ::log::warn!("ingest of {} bytes exceeds capacity, ignored", size);
            return Ok(PollOutcome::Oversize { requested: size });
        }

        self.rx.clear();
        self.rx.resize(size, 0).map_err(|_| StationError::Full)?;

        let mut received = 0;
        let mut empty_reads = 0;
        while received < size {
            let end = (received + self.config.chunk_size).min(size);
            let n = socket.read_bytes(&mut self.rx[received..end]);
            if n == 0 {
                empty_reads += 1;
                if self.config.stall_limit.is_some_and(|limit| empty_reads >= limit) {
                    ::log::warn!("ingest stalled after {} of {} bytes", received, size);
                    return Ok(PollOutcome::Stalled { received });
                }
                self.delay.delay_ms(self.config.grace_delay_ms);
                continue;
            }
            empty_reads = 0;
            received += n;
        }

        Ok(PollOutcome::Ingested(
            manager.extract_list_from_eeprom_image(&self.rx[..received]),
        ))
    }

    /// Parses `<cmd><sep><digits><term>`, consuming the terminator.
    ///
    /// Missing digits read as size 0; oversized numbers saturate.
    fn read_request<K: Socket>(&mut self, socket: &mut K) -> Option<Request> {
        let command = self.next_byte(socket)?;
        let _separator = self.next_byte(socket);

        let mut size: usize = 0;
        while let Some(b) = self.next_byte(socket) {
            if !b.is_ascii_digit() {
                break;
            }
            size = size
                .saturating_mul(10)
                .saturating_add(usize::from(b - b'0'));
        }
        Some(Request { command, size })
    }

    /// A request line may arrive split across segments: wait one grace
    /// period before giving up on the next byte.
    fn next_byte<K: Socket>(&mut self, socket: &mut K) -> Option<u8> {
        if let Some(b) = socket.read_byte() {
            return Some(b);
        }
        self.delay.delay_ms(self.config.grace_delay_ms);
        socket.read_byte()
    }
}

fn send_time<K: Socket, C: Clock>(socket: &mut K, clock: &C) -> Result<PollOutcome, StationError> {
    if !clock.is_set() {
        socket.print(SENTINEL)?;
        return Ok(PollOutcome::TimeSent { seconds: 0 });
    }

    let seconds = clock.get();
    let mut line: heapless::String<12> = heapless::String::new();
    writeln!(line, "{}", seconds).map_err(|_| StationError::Full)?;
    socket.print(&line)?;
    Ok(PollOutcome::TimeSent { seconds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record::Uid,
        test_support::{MemorySocket, NoDelay, OneShotListener, test_manager},
    };

    type Proto = SyncProtocol<NoDelay, 512>;

    #[test]
    fn idle_after_grace_delay() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(b"");

        assert_eq!(proto.process(&mut socket, &mut m), Ok(PollOutcome::Idle));
        assert!(socket.output.is_empty());
        assert_eq!(proto.delay.total_ms, 5);
    }

    #[test]
    fn dump_full_image() {
        let mut m = test_manager();
        m.initialize();
        m.lists_mut().auth.add(Uid::from_bytes([3; 10]), "Ann", 0, 0).unwrap();
        m.update_eeprom_from_list().unwrap();

        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(b"N 512\n");

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Dumped { bytes: 512 })
        );
        assert_eq!(socket.output.as_slice(), m.store().image());
        assert_eq!(socket.writes, 64);
    }

    #[test]
    fn dump_oversize_replies_sentinel() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(b"N 9999\n");

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Oversize { requested: 9999 })
        );
        assert_eq!(socket.output.as_slice(), b"0\n");
    }

    #[test]
    fn time_before_and_after_set() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());

        let mut socket = MemorySocket::new(b"T 0\n");
        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::TimeSent { seconds: 0 })
        );
        assert_eq!(socket.output.as_slice(), b"0\n");

        m.clock().set(3600);
        let mut socket = MemorySocket::new(b"T 0\n");
        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::TimeSent { seconds: 3600 })
        );
        assert_eq!(socket.output.as_slice(), b"3600\n");
    }

    #[test]
    fn ingest_with_partial_reads_merges_log() {
        let mut peer = test_manager();
        peer.initialize();
        peer.lists_mut().log.add(Uid::from_bytes([7; 10]), 42, true);
        peer.lists_mut().auth.add(Uid::from_bytes([8; 10]), "peer", 0, 0).unwrap();
        peer.update_eeprom_from_list().unwrap();

        let mut request: heapless::Vec<u8, 600> = heapless::Vec::new();
        request.extend_from_slice(b"M 512 ").unwrap();
        request.extend_from_slice(peer.store().image()).unwrap();

        let mut m = test_manager();
        m.initialize();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(&request).with_read_limit(3);

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Ingested(MergeOutcome::Merged { log: 1 }))
        );
        assert!(socket.output.is_empty());
        assert_eq!(m.lists().log[0].timestamp(), 42);
        assert!(m.lists().auth.is_empty());
    }

    #[test]
    fn ingest_oversize_is_silent() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(b"M 4096 ");

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Oversize { requested: 4096 })
        );
        assert!(socket.output.is_empty());
    }

    #[test]
    fn ingest_stall_limit_abandons() {
        let mut m = test_manager();
        m.initialize();
        let config = SyncConfig {
            stall_limit: Some(3),
            ..SyncConfig::default()
        };
        let mut proto: Proto = SyncProtocol::with_config(NoDelay::default(), config);
        let mut socket = MemorySocket::new(b"M 100 abcdefghij");

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Stalled { received: 10 })
        );
        assert!(m.lists().log.is_empty());
    }

    #[test]
    fn unknown_command_is_ignored() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(b"X 1\n");

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Unknown(b'X'))
        );
        assert!(socket.output.is_empty());
    }

    #[test]
    fn handle_clients_without_connection_is_idle() {
        let mut m = test_manager();
        let mut proto = Proto::new(NoDelay::default());
        let mut listener = OneShotListener::empty();

        assert_eq!(
            proto.handle_clients(&mut listener, &mut m),
            Ok(PollOutcome::Idle)
        );
    }

    #[test]
    fn handle_clients_services_one_command() {
        let mut m = test_manager();
        m.clock().set(7);
        let mut proto = Proto::new(NoDelay::default());
        let mut listener = OneShotListener::new(MemorySocket::new(b"T 0\nT 0\n"));

        assert_eq!(
            proto.handle_clients(&mut listener, &mut m),
            Ok(PollOutcome::TimeSent { seconds: 7 })
        );
        assert_eq!(
            proto.handle_clients(&mut listener, &mut m),
            Ok(PollOutcome::Idle)
        );
    }

    #[test]
    fn chunk_size_is_clamped() {
        let config = SyncConfig {
            chunk_size: 0,
            ..SyncConfig::default()
        };
        let proto: Proto = SyncProtocol::with_config(NoDelay::default(), config);
        assert_eq!(proto.config().chunk_size, 1);
    }

    #[test]
    fn request_parsing_saturates() {
        let mut socket = MemorySocket::new(b"N 99999999999999999999999999\n");
        let mut proto = Proto::new(NoDelay::default());
        let request = proto.read_request(&mut socket).unwrap();
        assert_eq!(request.command, b'N');
        assert_eq!(request.size, usize::MAX);

        let mut socket = MemorySocket::new(b"T");
        assert_eq!(
            proto.read_request(&mut socket),
            Some(Request {
                command: b'T',
                size: 0
            })
        );
    }

    #[test]
    fn split_request_line_waits_for_rest() {
        let mut peer = test_manager();
        peer.initialize();
        peer.lists_mut().log.add(Uid::from_bytes([7; 10]), 42, true);
        peer.update_eeprom_from_list().unwrap();

        // "M 5" arrives first, "12 " plus the image in a later segment.
        let mut request: heapless::Vec<u8, 600> = heapless::Vec::new();
        request.extend_from_slice(b"M 512 ").unwrap();
        request.extend_from_slice(peer.store().image()).unwrap();

        let mut m = test_manager();
        m.initialize();
        let mut proto = Proto::new(NoDelay::default());
        let mut socket = MemorySocket::new(&request).with_gap_after(3);

        assert_eq!(
            proto.process(&mut socket, &mut m),
            Ok(PollOutcome::Ingested(MergeOutcome::Merged { log: 1 }))
        );
        assert_eq!(proto.delay.total_ms, 5);
        assert_eq!(m.lists().log[0].timestamp(), 42);
    }
}
