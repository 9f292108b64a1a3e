//! Memory mapped files.

use crate::{
    bindings::{GMappedFile, Glib},
    bytes::Bytes,
    error::{to_result_indirect, Error, Result},
    marshal::{NativeBool, TransientStr},
};
use std::path::Path;

bound_type! {
    /// A file mapped into memory, shared by reference counting.
    ///
    /// Failures to open the file are reported in the file error domain.
    refcounted MappedFile(GMappedFile) = g_mapped_file
}

// Safety: The mapping is not bound to a thread and its reference count is atomic.
unsafe impl Send for MappedFile {}

// Safety: The contents are only exposed as shared slices.
unsafe impl Sync for MappedFile {}

impl MappedFile {
    /// Maps the file at `path`.
    ///
    /// A `writable` mapping is private: modifications are never written back to the file.
    pub fn open(path: impl AsRef<Path>, writable: bool) -> Result<Self> {
        let glib = Glib::get()?;
        let path = TransientStr::from_path(path.as_ref())?;
        // Safety: The path is nul-terminated.
        let ptr = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_mapped_file_new)(path.as_ptr(), NativeBool::new(writable), error)
            })
        }?;
        // Safety: Returns a new reference.
        let file = unsafe { Self::from_raw_full(glib, ptr) };
        tracing::debug!(path = ?path, writable, mapped = file.is_some(), "mapped file");
        file.ok_or(Error::NullReturn {
            symbol: "g_mapped_file_new",
        })
    }

    /// Returns the length of the mapping.
    pub fn len(&self) -> usize {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_mapped_file_get_length)(self.as_raw()) }
    }

    /// Returns whether the mapped file is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the mapped contents.
    pub fn contents(&self) -> &[u8] {
        let len = self.len();
        // Safety: FFI call is safe.
        let data = unsafe { (self.glib.g_mapped_file_get_contents)(self.as_raw()) };
        if data.is_null() || len == 0 {
            return &[];
        }
        // Safety: The mapping holds `len` bytes and lives as long as `self`.
        unsafe { std::slice::from_raw_parts(data.cast::<u8>().cast_const(), len) }
    }

    /// Returns a buffer sharing the mapping, which keeps it alive.
    pub fn bytes(&self) -> Result<Bytes> {
        // Safety: FFI call is safe.
        let ptr = unsafe { (self.glib.g_mapped_file_get_bytes)(self.as_raw()) };
        // Safety: Returns a new reference.
        unsafe { Bytes::from_raw_full(self.glib, ptr) }.ok_or(Error::NullReturn {
            symbol: "g_mapped_file_get_bytes",
        })
    }
}
