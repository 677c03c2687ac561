use super::macros::{impl_read_be, impl_slice_common, impl_slice_ro};

/// Read-only view over an image region.
///
/// Decodes the fixed-width big-endian fields of the EEPROM image.
pub struct ROSlice<'a>(&'a [u8]);

impl<'a> ROSlice<'a> {
    #[inline]
    pub fn new(slice: &'a [u8]) -> Self {
        Self(slice)
    }

    impl_slice_common!();
    impl_slice_ro!();
}
