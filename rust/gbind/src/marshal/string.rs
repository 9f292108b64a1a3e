//! String adapters.
//!
//! Outbound strings are either lent for the duration of one call ([`TransientStr`]) or
//! transferred in a buffer of the native allocator ([`to_native_owned`]). Inbound strings
//! are always copied into a Rust [`String`] before the call site returns; owned inbound
//! buffers are released through the native allocator right after the copy.

use crate::{allocator::NativeAllocator, error::Error};
use std::{
    ffi::{c_char, CStr, CString},
    path::Path,
    ptr::NonNull,
};

/// Nul-terminated copy of a Rust string, lent to the native side for one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransientStr(CString);

impl TransientStr {
    /// Copies `value` into a nul-terminated buffer.
    ///
    /// Fails with [`Error::InteriorNul`] if `value` contains a nul byte.
    pub fn new(value: &str) -> Result<Self, Error> {
        CString::new(value)
            .map(Self)
            .map_err(|err| Error::InteriorNul {
                position: err.nul_position(),
            })
    }

    /// Copies a file system path.
    ///
    /// On Unix the path is passed as its raw bytes, elsewhere as UTF-8.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        #[cfg(unix)]
        let bytes = std::os::unix::ffi::OsStrExt::as_bytes(path.as_os_str()).to_vec();
        #[cfg(not(unix))]
        let bytes = path.to_string_lossy().into_owned().into_bytes();
        CString::new(bytes)
            .map(Self)
            .map_err(|err| Error::InteriorNul {
                position: err.nul_position(),
            })
    }

    /// Like [`new`](Self::new), mapping `None` to an absent string.
    pub fn new_optional(value: Option<&str>) -> Result<Option<Self>, Error> {
        value.map(Self::new).transpose()
    }

    /// Returns the address of the buffer.
    ///
    /// The address is valid for as long as `self` is.
    pub fn as_ptr(&self) -> *const c_char {
        self.0.as_ptr()
    }

    /// Returns the address of an optional buffer, or null.
    pub fn optional_ptr(this: Option<&Self>) -> *const c_char {
        this.map_or(std::ptr::null(), Self::as_ptr)
    }
}

/// Null-terminated vector of strings, lent to the native side for one call.
#[derive(Debug)]
pub struct TransientStrv {
    _strings: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl TransientStrv {
    /// Copies `values`.
    ///
    /// Fails with [`Error::InteriorNul`] if one of the strings contains a nul byte.
    pub fn new<S: AsRef<str>>(values: &[S]) -> Result<Self, Error> {
        let strings = values
            .iter()
            .map(|value| TransientStr::new(value.as_ref()).map(|s| s.0))
            .collect::<Result<Vec<_>, _>>()?;
        let ptrs = strings
            .iter()
            .map(|s| s.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();
        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    /// Returns the address of the null-terminated pointer array.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    /// Returns the number of strings, excluding the terminator.
    pub fn len(&self) -> usize {
        self.ptrs.len() - 1
    }

    /// Returns whether the vector contains no strings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Copies `value` into a buffer of the native allocator, whose ownership is transferred to
/// the caller.
pub fn to_native_owned(
    alloc: &impl NativeAllocator,
    value: &str,
) -> Result<NonNull<c_char>, Error> {
    if let Some(position) = value.bytes().position(|b| b == 0) {
        return Err(Error::InteriorNul { position });
    }

    let len = value.len();
    let buffer = NonNull::new(alloc.alloc(len + 1).cast::<c_char>())
        .unwrap_or_else(|| alloc_failed(len + 1));
    // Safety: The buffer holds `len + 1` bytes and does not overlap `value`.
    unsafe {
        std::ptr::copy_nonoverlapping(value.as_ptr().cast::<c_char>(), buffer.as_ptr(), len);
        buffer.as_ptr().add(len).write(0);
    }
    Ok(buffer)
}

#[cold]
fn alloc_failed(size: usize) -> ! {
    let layout =
        std::alloc::Layout::from_size_align(size, 1).unwrap_or(std::alloc::Layout::new::<u8>());
    std::alloc::handle_alloc_error(layout)
}

/// Copies a string borrowed from the native side.
///
/// Returns `None` for null. Invalid UTF-8 is replaced lossily.
///
/// # Safety
///
/// `ptr` must be null or point to a nul-terminated string that stays unchanged for the
/// duration of the call.
pub unsafe fn from_borrowed(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // Safety: Upheld by the caller.
    let value = unsafe { CStr::from_ptr(ptr) };
    Some(value.to_string_lossy().into_owned())
}

/// Copies a string owned by the caller and frees it through `alloc`.
///
/// Returns `None` for null.
///
/// # Safety
///
/// `ptr` must be null or point to a nul-terminated string allocated by `alloc`, whose
/// ownership is transferred to this function.
pub unsafe fn from_owned(alloc: &impl NativeAllocator, ptr: *mut c_char) -> Option<String> {
    // Safety: Upheld by the caller.
    let value = unsafe { from_borrowed(ptr) };
    if value.is_some() {
        // Safety: The string was copied and is not used anymore.
        unsafe { alloc.free(ptr.cast()) };
    }
    value
}

/// Copies a null-terminated string vector owned by the caller and frees it through `alloc`.
///
/// The strings are collected up to the first null or empty entry. Every element up to the
/// null terminator is freed, followed by the vector itself. Returns `None` for null.
///
/// # Safety
///
/// `ptr` must be null or point to a null-terminated array of strings, where the array and
/// all of its elements were allocated by `alloc` and ownership is transferred to this
/// function.
pub unsafe fn from_owned_strv(
    alloc: &impl NativeAllocator,
    ptr: *mut *mut c_char,
) -> Option<Vec<String>> {
    if ptr.is_null() {
        return None;
    }

    let mut values = Vec::new();
    let mut collecting = true;
    let mut cursor = ptr;
    loop {
        // Safety: The array is null-terminated, so `cursor` stays in bounds.
        let element = unsafe { *cursor };
        if element.is_null() {
            break;
        }
        // Safety: `element` is a live, nul-terminated string.
        if collecting && unsafe { *element } == 0 {
            collecting = false;
        }
        if collecting {
            // Safety: See above.
            values.extend(unsafe { from_borrowed(element) });
        }
        // Safety: The element was copied and is owned by us.
        unsafe {
            alloc.free(element.cast());
            cursor = cursor.add(1);
        }
    }
    // Safety: All elements were released, the array is owned by us.
    unsafe { alloc.free(ptr.cast()) };
    Some(values)
}
