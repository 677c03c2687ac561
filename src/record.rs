//! Value types held in the registries.

use crate::StationError;

/// Length of a tag UID in bytes.
pub const UID_LEN: usize = 10;
/// Maximum stored length of a tag owner's name in bytes.
pub const NAME_LEN: usize = 16;
/// Seconds in one day; interval values lie in `0..SECONDS_PER_DAY`.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Opaque 10-byte identifier of a physical RFID tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uid([u8; UID_LEN]);

impl Uid {
    #[inline]
    pub const fn from_bytes(bytes: [u8; UID_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; UID_LEN] {
        &self.0
    }
}

impl From<[u8; UID_LEN]> for Uid {
    fn from(bytes: [u8; UID_LEN]) -> Self {
        Self(bytes)
    }
}

impl core::str::FromStr for Uid {
    type Err = StationError;

    /// Parses exactly 20 hex digits, upper or lower case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; UID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| StationError::InvalidUid)?;
        Ok(Self(bytes))
    }
}

impl core::fmt::Display for Uid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl core::fmt::LowerHex for Uid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Fixed 16-byte, NUL-padded name label.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TagName([u8; NAME_LEN]);

impl TagName {
    /// Builds a name from text, truncating to 16 bytes.
    pub fn new(name: &str) -> Self {
        Self::from_raw(name.as_bytes())
    }

    /// Builds a name from raw bytes, stopping at the first NUL or after 16 bytes.
    pub fn from_raw(raw: &[u8]) -> Self {
        let mut bytes = [0u8; NAME_LEN];
        for (dst, src) in bytes.iter_mut().zip(raw.iter().take_while(|b| **b != 0)) {
            *dst = *src;
        }
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; NAME_LEN] {
        &self.0
    }

    /// Returns the text up to the first NUL.
    ///
    /// Truncation can split a multi-byte character; the longest valid UTF-8
    /// prefix is returned in that case.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        let raw = &self.0[..end];
        match core::str::from_utf8(raw) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl core::fmt::Debug for TagName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Stored rule granting a tag access during a daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthenticationRecord {
    uid: Uid,
    name: TagName,
    interval_start: u32,
    interval_end: u32,
}

impl AuthenticationRecord {
    /// `interval_start` and `interval_end` are seconds since local midnight.
    pub fn new(uid: Uid, name: &str, interval_start: u32, interval_end: u32) -> Self {
        Self::with_name(uid, TagName::new(name), interval_start, interval_end)
    }

    pub const fn with_name(uid: Uid, name: TagName, interval_start: u32, interval_end: u32) -> Self {
        Self {
            uid,
            name,
            interval_start,
            interval_end,
        }
    }

    #[inline]
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    #[inline]
    pub fn name(&self) -> &TagName {
        &self.name
    }

    #[inline]
    pub fn interval_start(&self) -> u32 {
        self.interval_start
    }

    #[inline]
    pub fn interval_end(&self) -> u32 {
        self.interval_end
    }

    pub fn set_interval_start(&mut self, seconds: u32) {
        self.interval_start = seconds;
    }

    pub fn set_interval_end(&mut self, seconds: u32) {
        self.interval_end = seconds;
    }

    /// Returns true if `second_of_day` falls inside the daily window.
    ///
    /// Windows with `start > end` wrap past midnight. Advisory only: the
    /// registry authorizes by presence, not by window.
    pub fn covers(&self, second_of_day: u32) -> bool {
        let t = second_of_day % SECONDS_PER_DAY;
        if self.interval_start <= self.interval_end {
            (self.interval_start..=self.interval_end).contains(&t)
        } else {
            t >= self.interval_start || t <= self.interval_end
        }
    }
}

impl core::fmt::Display for AuthenticationRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {:>16} {:010} {:010}",
            self.uid,
            self.name.as_str(),
            self.interval_start,
            self.interval_end
        )
    }
}

/// One access attempt and its outcome. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessLogRecord {
    uid: Uid,
    timestamp: u32,
    authorized: bool,
}

impl AccessLogRecord {
    pub const fn new(uid: Uid, timestamp: u32, authorized: bool) -> Self {
        Self {
            uid,
            timestamp,
            authorized,
        }
    }

    #[inline]
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Wall-clock seconds of the attempt.
    #[inline]
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    #[inline]
    pub fn authorized(&self) -> bool {
        self.authorized
    }
}

impl core::fmt::Display for AccessLogRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:x} {:010} {}",
            self.uid, self.timestamp, self.authorized as u8
        )
    }
}
