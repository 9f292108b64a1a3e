//! Immutable byte buffers.

use crate::{
    allocator::GlibAllocator,
    bindings::{gpointer, GBytes, Glib},
    error::{Error, Result},
    marshal::array::{self, BufferOwnership},
    panic::abort_on_panic,
};
use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
    ops::Range,
};

unsafe extern "C" fn drop_owner<O>(owner: gpointer) {
    abort_on_panic(|| {
        // Safety: `owner` was leaked from a `Box<O>` by `Bytes::from_owner`.
        drop(unsafe { Box::from_raw(owner.cast::<O>()) });
    });
}

bound_type! {
    /// An immutable byte buffer, shared by reference counting.
    refcounted Bytes(GBytes) = g_bytes
}

// Safety: A `GBytes` is immutable and its reference count is atomic.
unsafe impl Send for Bytes {}

// Safety: See above.
unsafe impl Sync for Bytes {}

impl Bytes {
    /// Copies `data` into a new buffer.
    pub fn new(data: &[u8]) -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: `data` is valid for `data.len()` bytes and copied.
        let ptr = unsafe { (glib.g_bytes_new)(data.as_ptr().cast(), data.len()) };
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(glib, ptr) }.ok_or(Error::NullReturn {
            symbol: "g_bytes_new",
        })
    }

    /// Constructs a buffer viewing the contents of `owner` without copying them.
    ///
    /// `owner` is dropped when the last reference to the buffer is released.
    pub fn from_owner<O>(owner: O) -> Result<Self>
    where
        O: AsRef<[u8]> + Send + 'static,
    {
        let glib = Glib::get()?;
        let owner = Box::into_raw(Box::new(owner));
        // Safety: The box is live until `drop_owner` runs.
        let data = unsafe { (*owner).as_ref() };
        let destroy = drop_owner::<O> as unsafe extern "C" fn(gpointer);
        // Safety: The contents stay unchanged and live until the owner is dropped.
        let ptr = unsafe {
            (glib.g_bytes_new_with_free_func)(
                data.as_ptr().cast(),
                data.len(),
                Some(destroy),
                owner.cast(),
            )
        };
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(glib, ptr) }.ok_or(Error::NullReturn {
            symbol: "g_bytes_new_with_free_func",
        })
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_bytes_get_size)(self.as_raw()) }
    }

    /// Returns whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the contents.
    pub fn as_slice(&self) -> &[u8] {
        let mut len = 0;
        // Safety: FFI call is safe.
        let data = unsafe { (self.glib.g_bytes_get_data)(self.as_raw(), &mut len) };
        if data.is_null() || len == 0 {
            return &[];
        }
        // Safety: The contents are immutable and live as long as `self`.
        unsafe { std::slice::from_raw_parts(data.cast::<u8>(), len) }
    }

    /// Copies the contents.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Returns a buffer sharing the bytes in `range`, or `None` if it is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range.start > range.end || range.end > self.len() {
            return None;
        }
        // Safety: The range lies within the buffer.
        let ptr = unsafe {
            (self.glib.g_bytes_new_from_bytes)(self.as_raw(), range.start, range.end - range.start)
        };
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(self.glib, ptr) }
    }

    /// Consumes the reference and returns the contents.
    ///
    /// If this was the last reference, the buffer is taken over without copying.
    pub fn into_vec(self) -> Vec<u8> {
        let glib = self.glib;
        // Fail on released buffers before giving up the handle.
        let _ = self.as_raw();
        let ptr = self.handle.into_raw();
        let mut len = 0;
        // Safety: The reference is transferred, the returned buffer is owned by us.
        unsafe {
            let data = (glib.g_bytes_unref_to_data)(ptr, &mut len);
            array::decode_counted(
                &GlibAllocator::new(glib),
                data.cast::<u8>(),
                len,
                BufferOwnership::Owned,
            )
        }
        .unwrap_or_default()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        // Safety: Both buffers are live.
        unsafe {
            (self.glib.g_bytes_equal)(
                self.as_raw().cast_const().cast(),
                other.as_raw().cast_const().cast(),
            )
        }
        .get()
    }
}

impl Eq for Bytes {}

impl PartialOrd for Bytes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bytes {
    fn cmp(&self, other: &Self) -> Ordering {
        // Safety: Both buffers are live.
        let order = unsafe {
            (self.glib.g_bytes_compare)(
                self.as_raw().cast_const().cast(),
                other.as_raw().cast_const().cast(),
            )
        };
        order.cmp(&0)
    }
}

impl Hash for Bytes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_bytes_hash)(self.as_raw().cast_const().cast()) }.hash(state);
    }
}
