//! UID-keyed registries backed by [`RingStore`](crate::RingStore).

pub mod auth;
pub mod access_log;

pub use auth::{AUTH_CAPACITY, AuthenticationRegistry};
pub use access_log::{AccessLogRegistry, LOG_CAPACITY};

use crate::{
    record::{AccessLogRecord, AuthenticationRecord, Uid},
    ring::RingStore,
};

/// Records that are looked up by tag UID.
pub trait Keyed {
    fn key(&self) -> &Uid;
}

impl Keyed for AuthenticationRecord {
    fn key(&self) -> &Uid {
        self.uid()
    }
}

impl Keyed for AccessLogRecord {
    fn key(&self) -> &Uid {
        self.uid()
    }
}

/// Position of the first record whose key equals `uid`.
pub(crate) fn position_of<T: Keyed, const N: usize>(
    ring: &RingStore<T, N>,
    uid: &Uid,
) -> Option<usize> {
    ring.iter().position(|item| item.key() == uid)
}

/// Removes the first record whose key equals `uid`; absent keys are a no-op.
pub(crate) fn remove_key<T: Keyed, const N: usize>(
    ring: &mut RingStore<T, N>,
    uid: &Uid,
) -> Option<T> {
    position_of(ring, uid).and_then(|index| ring.remove(index))
}

/// Both registries of one station.
#[derive(Debug, Default)]
pub struct DataLists {
    pub auth: AuthenticationRegistry,
    pub log: AccessLogRegistry,
}

impl DataLists {
    pub const fn new() -> Self {
        Self {
            auth: AuthenticationRegistry::new(),
            log: AccessLogRegistry::new(),
        }
    }

    /// Authenticates a presented tag and logs the attempt at `now`.
    pub fn check_in(&mut self, uid: Uid, now: u32) -> bool {
        let authorized = self.auth.authenticate(&uid);
        self.log.add(uid, now, authorized);
        ::log::info!("tag {} presented, authorized={}", uid, authorized);
        authorized
    }

    pub fn clear(&mut self) {
        self.auth.clear();
        self.log.clear();
    }
}
