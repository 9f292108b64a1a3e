//! Native memory allocators.
//!
//! Buffers handed to or received from the native side must be allocated and freed by the
//! native allocator, never by the Rust global allocator.

use std::ffi::c_void;

use crate::bindings::Glib;

/// An allocator whose memory can be freed by the native library.
///
/// # Safety
///
/// Memory returned by [`alloc`](Self::alloc) must be suitably aligned for any fundamental type
/// and must be releasable by [`free`](Self::free).
pub unsafe trait NativeAllocator {
    /// Allocates `size` bytes.
    ///
    /// May return null for a `size` of zero, or if the allocation fails.
    fn alloc(&self, size: usize) -> *mut c_void;

    /// Frees memory returned by [`alloc`](Self::alloc). Null is ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator and must not be used afterwards.
    unsafe fn free(&self, ptr: *mut c_void);
}

// Safety: Forwards to the referenced allocator.
unsafe impl<A: NativeAllocator + ?Sized> NativeAllocator for &A {
    fn alloc(&self, size: usize) -> *mut c_void {
        (**self).alloc(size)
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // Safety: Upheld by the caller.
        unsafe { (**self).free(ptr) }
    }
}

/// Alignment guaranteed by every [`NativeAllocator`].
#[cfg(windows)]
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Alignment guaranteed by every [`NativeAllocator`].
#[cfg(not(windows))]
pub const DEFAULT_ALIGNMENT: usize = core::mem::align_of::<libc::max_align_t>();

/// The GLib allocator, `g_malloc` and `g_free`.
#[derive(Debug, Clone, Copy)]
pub struct GlibAllocator(&'static Glib);

impl GlibAllocator {
    /// Constructs the allocator of `glib`.
    pub const fn new(glib: &'static Glib) -> Self {
        Self(glib)
    }
}

// Safety: `g_malloc` returns memory aligned for any type and `g_free` releases it.
unsafe impl NativeAllocator for GlibAllocator {
    fn alloc(&self, size: usize) -> *mut c_void {
        // Safety: `g_malloc` aborts on failure and returns null for zero bytes.
        unsafe { (self.0.g_malloc)(size) }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // Safety: Upheld by the caller.
        unsafe { (self.0.g_free)(ptr) }
    }
}

/// The C runtime allocator, `malloc` and `free`.
///
/// Usable with native libraries that release memory with the C runtime `free`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemAllocator;

// Safety: `malloc` returns memory aligned to `max_align_t` and `free` releases it.
unsafe impl NativeAllocator for SystemAllocator {
    fn alloc(&self, size: usize) -> *mut c_void {
        if size == 0 {
            return std::ptr::null_mut();
        }
        // Safety: `malloc` has no preconditions.
        unsafe { libc::malloc(size) }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // Safety: Upheld by the caller; `free(NULL)` is a no-op.
        unsafe { libc::free(ptr) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_allocator() {
        let ptr = SystemAllocator.alloc(32).cast::<u8>();
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % DEFAULT_ALIGNMENT, 0);

        // Safety: `ptr` points to 32 writable bytes.
        unsafe {
            ptr.write_bytes(0xAB, 32);
            assert_eq!(*ptr.add(31), 0xAB);
            SystemAllocator.free(ptr.cast());
        }

        assert!(SystemAllocator.alloc(0).is_null());
        // Safety: Null is ignored.
        unsafe { SystemAllocator.free(std::ptr::null_mut()) };
    }
}
