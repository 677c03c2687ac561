//! A `no_std`, no-alloc data core for an RFID access-control station.
//!
//! This crate keeps the authorized-tag registry and the access log, persists
//! both into a fixed EEPROM image layout, and exchanges that same image with
//! a peer station over a byte stream.
//!
//! # Features
//!
//! - **Zero heap allocation** - Registries and buffers are statically sized
//! - **Bit-exact image format** - 14-byte header, 30-byte tag and 15-byte log records
//! - **Block-based dirty tracking** - Commits flush only changed EEPROM pages
//! - **Log-only sync** - A peer can push access logs but never authorization rules
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  update_eeprom_from_list  ┌──────────────────┐
//! │   DataLists    │──────────────────────────▶│ NonVolatileStore │
//! │  auth  │  log  │◀──────────────────────────│   (image bytes)  │
//! └────────────────┘        initialize         └──────────────────┘
//!         ▲                                             │
//!         │ extract_list_from_eeprom_image (log only)   │ N: dump
//!         │                                             ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │                 SyncProtocol  (N / T / M requests)             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use access_station::prelude::*;
//!
//! struct Millis;
//! impl TickSource for Millis {
//!     fn millis(&self) -> u32 {
//!         0 // read the hardware timer here
//!     }
//! }
//!
//! let store = EepromBuilder::new()
//!     .total_size::<8192>()
//!     .block_size::<64>()
//!     .block_count::<128>()
//!     .no_flush()
//!     .build();
//!
//! let mut manager = PersistenceManager::new(store, TickClock::new(Millis));
//! manager.initialize();
//!
//! let uid: Uid = "0123456789abcdef0011".parse().unwrap();
//! manager.lists_mut().auth.add(uid, "Front desk", 8 * 3600, 18 * 3600).unwrap();
//! assert!(manager.record_attempt(uid));
//! manager.update_eeprom_from_list().unwrap();
//! ```

#![deny(unsafe_code)]
#![no_std]

pub mod builder;
pub mod clock;
pub mod error;
pub mod flush;
pub mod helpers;
pub mod image;
pub mod persistence;
pub mod record;
pub mod registry;
pub mod ring;
pub mod slice;
pub mod store;
pub mod sync;
pub(crate) mod table;

#[cfg(test)]
mod test_support;

pub use builder::EepromBuilder;
pub use clock::{Clock, TickClock, TickSource};
pub use error::StationError;
pub use flush::{FlushSink, NoFlush};
pub use image::{ImageHeader, ImageLayout};
pub use persistence::{ImageStatus, MergeOutcome, PersistenceManager};
pub use record::{AccessLogRecord, AuthenticationRecord, TagName, Uid};
pub use registry::{AccessLogRegistry, AuthenticationRegistry, DataLists};
pub use ring::RingStore;
pub use slice::{ROSlice, RWSlice};
pub use store::{NonVolatileStore, ShadowEeprom};
pub use sync::{Delay, Listener, PollOutcome, Socket, SyncConfig, SyncProtocol};

pub mod prelude {
    pub use super::{
        AccessLogRecord, AccessLogRegistry, AuthenticationRecord, AuthenticationRegistry, Clock,
        DataLists, Delay, EepromBuilder, FlushSink, ImageHeader, ImageLayout, ImageStatus,
        Listener, MergeOutcome, NoFlush, NonVolatileStore, PersistenceManager, PollOutcome,
        RingStore, ShadowEeprom, Socket, StationError, SyncConfig, SyncProtocol, TagName,
        TickClock, TickSource, Uid,
    };
}
