use super::macros::{
    impl_read_be, impl_slice_common, impl_slice_ro, impl_slice_wo, impl_write_be,
};

/// Read-write view over an image region.
#[derive(Debug)]
pub struct RWSlice<'a>(&'a mut [u8]);

impl<'a> RWSlice<'a> {
    #[inline]
    pub fn new(slice: &'a mut [u8]) -> Self {
        Self(slice)
    }

    impl_slice_common!();
    impl_slice_ro!();
    impl_slice_wo!();
}
