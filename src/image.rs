//! Binary layout of the persisted EEPROM image.
//!
//! ```text
//! 0            14                      capacity/2                  capacity
//! ┌────────────┬───────────────────────┬───────────────────────────┐
//! │   header   │ auth records (30 B)   │ log records (15 B)        │
//! └────────────┴───────────────────────┴───────────────────────────┘
//! ```
//!
//! Header fields, all big-endian:
//!
//! | offset | size | field            |
//! |--------|------|------------------|
//! | 0      | 2    | header size (14) |
//! | 2      | 2    | auth bytes used  |
//! | 4      | 2    | auth base (14)   |
//! | 6      | 2    | log count × 14   |
//! | 8      | 2    | log base         |
//! | 10     | 4    | last time update |
//!
//! Authentication record: `uid[10] name[16] begin_hour begin_minute end_hour
//! end_minute`. Log record: `uid[10] timestamp:u32be authorized:u8`.
//!
//! The log length field counts records in units of [`LOG_LENGTH_UNIT`], one
//! byte short of the stored record stride. Peers read it the same way, so the
//! unit is part of the format.

use crate::{
    record::{AccessLogRecord, AuthenticationRecord, NAME_LEN, SECONDS_PER_DAY, TagName, UID_LEN, Uid},
    slice::{ROSlice, RWSlice},
};

/// Size of the image header in bytes; also the authentication base address.
pub const HEADER_SIZE: u16 = 14;
/// On-disk size of one authentication record.
pub const AUTH_RECORD_SIZE: usize = 30;
/// On-disk size of one access log record.
pub const LOG_RECORD_SIZE: usize = 15;
/// Bytes per log record as counted by the header's log length field.
pub const LOG_LENGTH_UNIT: usize = 14;

const HEADER_SIZE_ADDR: usize = 0;
const AUTH_LENGTH_ADDR: usize = 2;
const AUTH_BASE_ADDR: usize = 4;
const LOG_LENGTH_ADDR: usize = 6;
const LOG_BASE_ADDR: usize = 8;
const LAST_TIME_UPDATE_ADDR: usize = 10;

const NAME_ADDR: usize = UID_LEN;
const BEGIN_HOUR_ADDR: usize = NAME_ADDR + NAME_LEN;
const TIMESTAMP_ADDR: usize = UID_LEN;
const AUTHORIZED_ADDR: usize = TIMESTAMP_ADDR + 4;

/// Decoded image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub header_size: u16,
    /// Bytes used by the authentication region.
    pub auth_length: u16,
    pub auth_base: u16,
    /// Log record count times [`LOG_LENGTH_UNIT`].
    pub log_length: u16,
    pub log_base: u16,
    pub last_time_update: u32,
}

impl ImageHeader {
    /// Decodes the header at the start of `image`.
    ///
    /// Returns `None` if `image` is shorter than [`HEADER_SIZE`].
    pub fn decode(image: &[u8]) -> Option<Self> {
        let raw = image.get(..HEADER_SIZE as usize)?;
        let slice = ROSlice::new(raw);
        Some(Self {
            header_size: slice.read_u16_be_at(HEADER_SIZE_ADDR),
            auth_length: slice.read_u16_be_at(AUTH_LENGTH_ADDR),
            auth_base: slice.read_u16_be_at(AUTH_BASE_ADDR),
            log_length: slice.read_u16_be_at(LOG_LENGTH_ADDR),
            log_base: slice.read_u16_be_at(LOG_BASE_ADDR),
            last_time_update: slice.read_u32_be_at(LAST_TIME_UPDATE_ADDR),
        })
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut out = [0u8; HEADER_SIZE as usize];
        let mut slice = RWSlice::new(&mut out);
        slice.write_u16_be_at(HEADER_SIZE_ADDR, self.header_size);
        slice.write_u16_be_at(AUTH_LENGTH_ADDR, self.auth_length);
        slice.write_u16_be_at(AUTH_BASE_ADDR, self.auth_base);
        slice.write_u16_be_at(LOG_LENGTH_ADDR, self.log_length);
        slice.write_u16_be_at(LOG_BASE_ADDR, self.log_base);
        slice.write_u32_be_at(LAST_TIME_UPDATE_ADDR, self.last_time_update);
        out
    }
}

/// Static partitioning of an image of a given capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    capacity: usize,
    log_base: u16,
}

impl ImageLayout {
    /// The log region always starts at half the capacity.
    pub const fn for_capacity(capacity: usize) -> Self {
        let half = capacity / 2;
        let log_base = if half > u16::MAX as usize {
            u16::MAX
        } else {
            half as u16
        };
        Self { capacity, log_base }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub const fn auth_base(&self) -> u16 {
        HEADER_SIZE
    }

    #[inline]
    pub const fn log_base(&self) -> u16 {
        self.log_base
    }

    /// Number of authentication records that fit before the log region.
    pub const fn auth_slots(&self) -> usize {
        (self.log_base as usize).saturating_sub(HEADER_SIZE as usize) / AUTH_RECORD_SIZE
    }

    /// Number of log records that fit before the end of the image.
    pub const fn log_slots(&self) -> usize {
        self.capacity.saturating_sub(self.log_base as usize) / LOG_RECORD_SIZE
    }

    /// True if the structural fields match this layout.
    pub fn is_compatible(&self, header: &ImageHeader) -> bool {
        header.header_size == HEADER_SIZE
            && header.auth_base == self.auth_base()
            && header.log_base == self.log_base
    }

    /// Header of an empty image stamped with `now`.
    pub fn fresh_header(&self, now: u32) -> ImageHeader {
        ImageHeader {
            header_size: HEADER_SIZE,
            auth_length: 0,
            auth_base: self.auth_base(),
            log_length: 0,
            log_base: self.log_base,
            last_time_update: now,
        }
    }
}

/// Encodes an authentication record; the window keeps hour and minute only.
pub fn encode_auth(record: &AuthenticationRecord) -> [u8; AUTH_RECORD_SIZE] {
    let mut out = [0u8; AUTH_RECORD_SIZE];
    let (begin_hour, begin_minute) = hour_minute(record.interval_start());
    let (end_hour, end_minute) = hour_minute(record.interval_end());

    let mut slice = RWSlice::new(&mut out);
    slice.copy_from_slice_at(0, record.uid().as_bytes());
    slice.copy_from_slice_at(NAME_ADDR, record.name().as_bytes());
    slice.write_u8_at(BEGIN_HOUR_ADDR, begin_hour);
    slice.write_u8_at(BEGIN_HOUR_ADDR + 1, begin_minute);
    slice.write_u8_at(BEGIN_HOUR_ADDR + 2, end_hour);
    slice.write_u8_at(BEGIN_HOUR_ADDR + 3, end_minute);
    out
}

/// Decodes one authentication record.
///
/// # Panics
/// Panics if `raw` is shorter than [`AUTH_RECORD_SIZE`].
pub fn decode_auth(raw: &[u8]) -> AuthenticationRecord {
    let slice = ROSlice::new(raw);
    let uid = Uid::from_bytes(slice.read_array_at::<UID_LEN>(0));
    let name = TagName::from_raw(&slice.read_array_at::<NAME_LEN>(NAME_ADDR));
    let start = seconds_of(
        slice.read_u8_at(BEGIN_HOUR_ADDR),
        slice.read_u8_at(BEGIN_HOUR_ADDR + 1),
    );
    let end = seconds_of(
        slice.read_u8_at(BEGIN_HOUR_ADDR + 2),
        slice.read_u8_at(BEGIN_HOUR_ADDR + 3),
    );
    AuthenticationRecord::with_name(uid, name, start, end)
}

pub fn encode_log(record: &AccessLogRecord) -> [u8; LOG_RECORD_SIZE] {
    let mut out = [0u8; LOG_RECORD_SIZE];
    let mut slice = RWSlice::new(&mut out);
    slice.copy_from_slice_at(0, record.uid().as_bytes());
    slice.write_u32_be_at(TIMESTAMP_ADDR, record.timestamp());
    slice.write_u8_at(AUTHORIZED_ADDR, record.authorized() as u8);
    out
}

/// Decodes one log record; any non-zero flag byte means authorized.
///
/// # Panics
/// Panics if `raw` is shorter than [`LOG_RECORD_SIZE`].
pub fn decode_log(raw: &[u8]) -> AccessLogRecord {
    let slice = ROSlice::new(raw);
    AccessLogRecord::new(
        Uid::from_bytes(slice.read_array_at::<UID_LEN>(0)),
        slice.read_u32_be_at(TIMESTAMP_ADDR),
        slice.read_u8_at(AUTHORIZED_ADDR) != 0,
    )
}

/// Authentication records described by `header`, clamped to the bytes
/// between the auth base and the log base that `image` actually holds.
pub fn auth_records<'a>(
    image: &'a [u8],
    header: ImageHeader,
) -> impl Iterator<Item = AuthenticationRecord> + 'a {
    let region = region(
        image,
        header.auth_base,
        usize::from(header.auth_length) / AUTH_RECORD_SIZE,
        header.log_base as usize,
        AUTH_RECORD_SIZE,
    );
    region.chunks_exact(AUTH_RECORD_SIZE).map(decode_auth)
}

/// Log records described by `header`, clamped to the end of `image`.
pub fn log_records<'a>(
    image: &'a [u8],
    header: ImageHeader,
) -> impl Iterator<Item = AccessLogRecord> + 'a {
    let region = region(
        image,
        header.log_base,
        usize::from(header.log_length) / LOG_LENGTH_UNIT,
        image.len(),
        LOG_RECORD_SIZE,
    );
    region.chunks_exact(LOG_RECORD_SIZE).map(decode_log)
}

/// Header length fields encoded for `auth_count` and `log_count` records.
pub const fn region_lengths(auth_count: usize, log_count: usize) -> (u16, u16) {
    (
        (auth_count * AUTH_RECORD_SIZE) as u16,
        (log_count * LOG_LENGTH_UNIT) as u16,
    )
}

fn region(image: &[u8], base: u16, wanted: usize, end: usize, record_size: usize) -> &[u8] {
    let start = base as usize;
    let available = end.min(image.len()).saturating_sub(start) / record_size;
    let count = wanted.min(available);
    if count < wanted {
        ::log::warn!(
            "region at {} claims {} records, only {} fit",
            base,
            wanted,
            count
        );
    }
    image
        .get(start..start + count * record_size)
        .unwrap_or_default()
}

fn hour_minute(seconds: u32) -> (u8, u8) {
    let hour = seconds % SECONDS_PER_DAY / 3600;
    let minute = seconds % 3600 / 60;
    (hour as u8, minute as u8)
}

/// Out-of-range bytes from a damaged image clamp to 23:59.
fn seconds_of(hour: u8, minute: u8) -> u32 {
    if hour > 23 || minute > 59 {
        ::log::warn!("auth window {}:{} out of range, clamped", hour, minute);
    }
    (u32::from(hour.min(23)) * 60 + u32::from(minute.min(59))) * 60
}
