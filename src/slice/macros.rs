/// Emits `read_<ty>_be_at`. Image header and record fields are big-endian.
macro_rules! impl_read_be {
    ($type:ty, $size:literal) => {
        paste::paste! {
            #[doc = "Big-endian `" $type "` image field at `offset`."]
            #[doc = ""]
            #[doc = "# Panics"]
            #[doc = "Panics if `offset + " $size " > len()`."]
            #[inline]
            pub fn [<read_ $type _be_at>](&self, offset: usize) -> $type {
                assert!(
                    offset + $size <= self.0.len(),
                    "read out of bounds: offset {} + size {} > len {}",
                    offset, $size, self.0.len()
                );
                let mut raw = [0u8; $size];
                raw.copy_from_slice(&self.0[offset..offset + $size]);
                <$type>::from_be_bytes(raw)
            }
        }
    };
}

/// Emits `write_<ty>_be_at`, the encoding half of `impl_read_be`.
macro_rules! impl_write_be {
    ($type:ty, $size:literal) => {
        paste::paste! {
            #[doc = "Stores `value` as a big-endian `" $type "` image field."]
            #[doc = ""]
            #[doc = "# Panics"]
            #[doc = "Panics if `offset + " $size " > len()`."]
            #[inline]
            pub fn [<write_ $type _be_at>](&mut self, offset: usize, value: $type) {
                assert!(
                    offset + $size <= self.0.len(),
                    "write out of bounds: offset {} + size {} > len {}",
                    offset, $size, self.0.len()
                );
                self.0[offset..offset + $size].copy_from_slice(&value.to_be_bytes());
            }
        }
    };
}

/// `len` and `is_empty` for both views.
macro_rules! impl_slice_common {
    () => {
        #[inline]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    };
}

/// Field getters shared by `ROSlice` and `RWSlice`.
macro_rules! impl_slice_ro {
    () => {
        /// Single-byte field, e.g. an hour or the authorized flag.
        #[inline]
        pub fn read_u8_at(&self, offset: usize) -> u8 {
            self.0[offset]
        }

        /// Fixed-width byte field such as a UID or a tag name.
        #[inline]
        pub fn read_array_at<const N: usize>(&self, offset: usize) -> [u8; N] {
            let mut out = [0u8; N];
            out.copy_from_slice(&self.0[offset..offset + N]);
            out
        }

        impl_read_be!(u16, 2);
        impl_read_be!(u32, 4);
    };
}

/// Field setters for `RWSlice`.
macro_rules! impl_slice_wo {
    () => {
        #[inline]
        pub fn write_u8_at(&mut self, offset: usize, value: u8) {
            self.0[offset] = value;
        }

        /// Panics if `src` runs past the end of the view.
        #[inline]
        pub fn copy_from_slice_at(&mut self, offset: usize, src: &[u8]) {
            self.0[offset..offset + src.len()].copy_from_slice(src);
        }

        impl_write_be!(u16, 2);
        impl_write_be!(u32, 4);
    };
}

pub(super) use impl_read_be;
pub(super) use impl_slice_common;
pub(super) use impl_slice_ro;
pub(super) use impl_slice_wo;
pub(super) use impl_write_be;
