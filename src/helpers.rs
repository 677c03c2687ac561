//! Address and page arithmetic for the EEPROM mirror.

use crate::StationError;

/// Pages touched by a write of `len` bytes at `addr`.
///
/// Returns the first and last page index, both inclusive. `TS` is the image
/// capacity, `BS` the page size and `BC` the page count.
///
/// # Errors
/// * [`StationError::ZeroLength`] - if `len` is 0
/// * [`StationError::OutOfBounds`] - if the write runs past the image
///
/// # Example
/// ```
/// use access_station::helpers::block_span;
///
/// // 8 KiB image in 64-byte pages: the fifth log record (4156..4171)
/// // straddles pages 64 and 65.
/// assert_eq!(block_span::<8192, 64, 128>(4096 + 4 * 15, 15), Ok((64, 65)));
/// ```
pub fn block_span<const TS: usize, const BS: usize, const BC: usize>(
    addr: u16,
    len: usize,
) -> Result<(usize, usize), StationError> {
    let (start, end) = range_span::<TS>(addr, len)?;
    let first = start / BS;
    let last = (end - 1) / BS;
    if last >= BC {
        return Err(StationError::OutOfBounds);
    }
    Ok((first, last))
}

/// Byte range `start..end` of a `len`-byte access at `addr` inside a
/// `TS`-byte image.
///
/// # Errors
/// * [`StationError::ZeroLength`] - if `len` is 0
/// * [`StationError::OutOfBounds`] - if `addr + len` exceeds `TS`
pub fn range_span<const TS: usize>(addr: u16, len: usize) -> Result<(usize, usize), StationError> {
    if len == 0 {
        return Err(StationError::ZeroLength);
    }
    let start = usize::from(addr);
    match start.checked_add(len) {
        Some(end) if end <= TS => Ok((start, end)),
        _ => Err(StationError::OutOfBounds),
    }
}
