//! Message digests.

use crate::{
    allocator::GlibAllocator,
    bindings::{GChecksum, GChecksumType, Glib},
    bytes::Bytes,
    error::Result,
    marshal::string,
};

/// Supported hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumType {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Sha384,
}

impl ChecksumType {
    /// Returns the length of the digest in bytes, or `None` if the loaded library does not
    /// support the hash function.
    pub fn digest_len(self) -> Result<Option<usize>> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let len = unsafe { (glib.g_checksum_type_get_length)(self.into()) };
        Ok(usize::try_from(len).ok())
    }
}

impl From<ChecksumType> for GChecksumType {
    fn from(value: ChecksumType) -> Self {
        match value {
            ChecksumType::Md5 => GChecksumType::G_CHECKSUM_MD5,
            ChecksumType::Sha1 => GChecksumType::G_CHECKSUM_SHA1,
            ChecksumType::Sha256 => GChecksumType::G_CHECKSUM_SHA256,
            ChecksumType::Sha512 => GChecksumType::G_CHECKSUM_SHA512,
            ChecksumType::Sha384 => GChecksumType::G_CHECKSUM_SHA384,
        }
    }
}

bound_type! {
    /// Incremental computation of a digest.
    unique Checksum(GChecksum) = g_checksum_free
}

// Safety: A `GChecksum` is not bound to a thread; it is not synchronized, so only `Send`.
unsafe impl Send for Checksum {}

impl Checksum {
    /// Starts a new computation.
    ///
    /// Returns `None` if the loaded library does not support `checksum_type`.
    pub fn new(checksum_type: ChecksumType) -> Result<Option<Self>> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let ptr = unsafe { (glib.g_checksum_new)(checksum_type.into()) };
        // Safety: Returns null or a new object.
        Ok(unsafe { Self::from_raw_full(glib, ptr) })
    }

    /// Feeds `data` into the computation.
    ///
    /// Has no effect once the digest was read with [`string`](Self::string) or
    /// [`digest`](Self::digest), which closes the computation.
    pub fn update(&mut self, data: &[u8]) {
        // Feed oversized inputs in chunks, the native length is signed.
        for chunk in data.chunks(isize::MAX as usize) {
            // Safety: `chunk` is valid for `chunk.len()` bytes.
            unsafe {
                (self.glib.g_checksum_update)(self.as_raw(), chunk.as_ptr(), chunk.len() as isize);
            }
        }
    }

    /// Resets the computation to its initial state.
    pub fn reset(&mut self) {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_checksum_reset)(self.as_raw()) };
    }

    /// Closes the computation and returns the digest as a lowercase hexadecimal string.
    ///
    /// No more data can be fed in afterwards, until the checksum is [`reset`](Self::reset).
    pub fn string(&mut self) -> String {
        // Safety: The string is owned by the checksum and copied immediately.
        unsafe { string::from_borrowed((self.glib.g_checksum_get_string)(self.as_raw())) }
            .unwrap_or_default()
    }

    /// Closes the computation and returns the raw digest.
    ///
    /// No more data can be fed in afterwards, until the checksum is [`reset`](Self::reset).
    pub fn digest(&mut self) -> Vec<u8> {
        // The digest length of every supported type fits into 64 bytes.
        let mut buffer = [0u8; 64];
        let mut len = buffer.len();
        // Safety: The buffer is large enough for every supported digest.
        unsafe { (self.glib.g_checksum_get_digest)(self.as_raw(), buffer.as_mut_ptr(), &mut len) };
        buffer[..len.min(buffer.len())].to_vec()
    }

    /// Computes the hexadecimal digest of `data` in one step.
    ///
    /// Returns `None` if the loaded library does not support `checksum_type`.
    pub fn compute_for_data(checksum_type: ChecksumType, data: &[u8]) -> Result<Option<String>> {
        let glib = Glib::get()?;
        // Safety: The result is owned by us and allocated with `g_malloc`.
        Ok(unsafe {
            let digest =
                (glib.g_compute_checksum_for_data)(checksum_type.into(), data.as_ptr(), data.len());
            string::from_owned(&GlibAllocator::new(glib), digest)
        })
    }

    /// Computes the hexadecimal digest of the contents of `bytes` in one step.
    ///
    /// Returns `None` if the loaded library does not support `checksum_type`.
    pub fn compute_for_bytes(checksum_type: ChecksumType, bytes: &Bytes) -> Result<Option<String>> {
        let glib = Glib::get()?;
        // Safety: The result is owned by us and allocated with `g_malloc`.
        Ok(unsafe {
            let digest = (glib.g_compute_checksum_for_bytes)(checksum_type.into(), bytes.as_raw());
            string::from_owned(&GlibAllocator::new(glib), digest)
        })
    }
}

impl Clone for Checksum {
    /// Copies the state of the computation.
    fn clone(&self) -> Self {
        // Safety: FFI call is safe.
        let ptr = unsafe { (self.glib.g_checksum_copy)(self.as_raw()) };
        // Safety: Returns a new object, `g_checksum_copy` never fails for a live checksum.
        match unsafe { Self::from_raw_full(self.glib, ptr) } {
            Some(copy) => copy,
            None => std::alloc::handle_alloc_error(std::alloc::Layout::new::<usize>()),
        }
    }
}
