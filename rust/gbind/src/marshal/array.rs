//! Array adapter.
//!
//! Arrays cross the boundary either as a `(pointer, length)` pair with an explicit 32-bit
//! length, or as a sequence terminated by a [`Sentinel`] element. Decoding always copies the
//! elements into a [`Vec`]; buffers owned by the caller are freed through the native
//! allocator, never through the Rust allocator.

use crate::{allocator::NativeAllocator, error::Error};
use std::{
    ffi::{c_char, c_void},
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ptr::NonNull,
};

/// Contiguous native array with an explicit length.
#[repr(C)]
#[derive(Debug)]
pub struct NativeSlice<T> {
    pub ptr: *mut T,
    pub len: u32,
}

impl<T> Clone for NativeSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativeSlice<T> {}

static_assertions::assert_eq_size!(NativeSlice<u8>, [usize; 2]);

/// Which side frees a buffer returned by a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferOwnership {
    /// The buffer stays owned by the native side and must not be freed.
    Borrowed,
    /// Ownership of the buffer is transferred to the caller, who frees it.
    Owned,
}

/// Element types with a reserved terminator value.
///
/// # Safety
///
/// [`is_sentinel`](Self::is_sentinel) must return `true` for [`SENTINEL`](Self::SENTINEL).
pub unsafe trait Sentinel: Copy {
    /// Value written after the last element.
    const SENTINEL: Self;

    /// Returns whether `self` terminates the sequence.
    ///
    /// # Safety
    ///
    /// `self` must have been read from a live sequence.
    unsafe fn is_sentinel(&self) -> bool;
}

// Safety: Null is the sentinel.
unsafe impl Sentinel for *mut c_void {
    const SENTINEL: Self = std::ptr::null_mut();

    unsafe fn is_sentinel(&self) -> bool {
        self.is_null()
    }
}

// Safety: Null is the sentinel.
unsafe impl Sentinel for *const c_char {
    const SENTINEL: Self = std::ptr::null();

    unsafe fn is_sentinel(&self) -> bool {
        // Safety: A non-null element points to a live string.
        self.is_null() || unsafe { **self == 0 }
    }
}

// Safety: Null is the sentinel.
unsafe impl Sentinel for *mut c_char {
    const SENTINEL: Self = std::ptr::null_mut();

    unsafe fn is_sentinel(&self) -> bool {
        // Safety: Upheld by the caller.
        unsafe { self.cast_const().is_sentinel() }
    }
}

// Safety: Zero is the sentinel.
unsafe impl Sentinel for u8 {
    const SENTINEL: Self = 0;

    unsafe fn is_sentinel(&self) -> bool {
        *self == 0
    }
}

/// Array in a buffer of the native allocator `A`.
///
/// The buffer is freed when the array is dropped, unless it was handed out with
/// [`into_raw`](Self::into_raw).
pub struct NativeArray<T: Copy, A: NativeAllocator> {
    ptr: Option<NonNull<T>>,
    len: u32,
    alloc: A,
    _phantom: PhantomData<T>,
}

impl<T: Copy, A: NativeAllocator> NativeArray<T, A> {
    /// Returns the elements.
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // Safety: The buffer holds `len` initialized elements.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len as usize) },
            None => &[],
        }
    }

    /// Returns the number of elements, excluding a terminator.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns whether the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lends the array to the native side.
    pub fn as_native_slice(&self) -> NativeSlice<T> {
        NativeSlice {
            ptr: self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr),
            len: self.len,
        }
    }

    /// Transfers the buffer to the caller, who must free it through the native allocator.
    pub fn into_raw(self) -> NativeSlice<T> {
        let this = std::mem::ManuallyDrop::new(self);
        let slice = this.as_native_slice();
        // Safety: The allocator is read once and `this` is never dropped.
        drop(unsafe { std::ptr::read(&this.alloc) });
        slice
    }
}

impl<T: Copy, A: NativeAllocator> Drop for NativeArray<T, A> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // Safety: The buffer was allocated by `alloc` and is owned by the array.
            unsafe { self.alloc.free(ptr.as_ptr().cast()) };
        }
    }
}

impl<T: Copy + Debug, A: NativeAllocator> Debug for NativeArray<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

fn allocate<T: Copy, A: NativeAllocator>(
    alloc: &A,
    count: usize,
) -> Result<Option<NonNull<T>>, Error> {
    const { assert!(size_of::<T>() != 0, "zero-sized elements can not be marshalled") };
    if count == 0 {
        return Ok(None);
    }
    let size = count
        .checked_mul(size_of::<T>())
        .ok_or(Error::LengthOverflow { len: count })?;
    match NonNull::new(alloc.alloc(size).cast::<T>()) {
        Some(ptr) => Ok(Some(ptr)),
        None => {
            let layout = std::alloc::Layout::array::<T>(count)
                .map_err(|_overflow| Error::LengthOverflow { len: count })?;
            std::alloc::handle_alloc_error(layout)
        }
    }
}

/// Copies `values` into a buffer of `alloc` with an explicit length.
///
/// Fails with [`Error::LengthOverflow`] if the length does not fit into 32 bits. An empty
/// input yields an array with a null buffer.
pub fn encode<T: Copy, A: NativeAllocator>(
    alloc: A,
    values: &[T],
) -> Result<NativeArray<T, A>, Error> {
    let len = u32::try_from(values.len()).map_err(|_overflow| Error::LengthOverflow {
        len: values.len(),
    })?;
    let ptr = allocate::<T, A>(&alloc, values.len())?;
    if let Some(ptr) = ptr {
        // Safety: The buffer holds `len` elements and does not overlap `values`.
        unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), ptr.as_ptr(), values.len()) };
    }
    Ok(NativeArray {
        ptr,
        len,
        alloc,
        _phantom: PhantomData,
    })
}

/// Copies `values` into a buffer of `alloc`, followed by the sentinel element.
pub fn encode_terminated<T: Sentinel, A: NativeAllocator>(
    alloc: A,
    values: &[T],
) -> Result<NativeArray<T, A>, Error> {
    let len = u32::try_from(values.len()).map_err(|_overflow| Error::LengthOverflow {
        len: values.len(),
    })?;
    let count = values.len() + 1;
    let ptr = allocate::<T, A>(&alloc, count)?;
    if let Some(ptr) = ptr {
        // Safety: The buffer holds `len + 1` elements and does not overlap `values`.
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), ptr.as_ptr(), values.len());
            ptr.as_ptr().add(values.len()).write(T::SENTINEL);
        }
    }
    Ok(NativeArray {
        ptr,
        len,
        alloc,
        _phantom: PhantomData,
    })
}

/// Copies `len` elements returned by a native call.
///
/// A length of zero yields an empty vector. A null buffer with a non-zero length yields
/// `None`. With [`BufferOwnership::Owned`] the buffer is freed through `alloc`.
///
/// # Safety
///
/// `ptr` must be null or point to `len` initialized elements. With
/// [`BufferOwnership::Owned`] the buffer must have been allocated by `alloc`.
pub unsafe fn decode_counted<T: Copy>(
    alloc: &impl NativeAllocator,
    ptr: *mut T,
    len: usize,
    ownership: BufferOwnership,
) -> Option<Vec<T>> {
    let values = if ptr.is_null() {
        (len == 0).then(Vec::new)
    } else {
        // Safety: Upheld by the caller.
        Some(unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec())
    };
    if ownership == BufferOwnership::Owned && !ptr.is_null() {
        // Safety: The elements were copied and the buffer is owned by us.
        unsafe { alloc.free(ptr.cast()) };
    }
    values
}

/// Like [`decode_counted`], for a [`NativeSlice`].
///
/// # Safety
///
/// See [`decode_counted`].
pub unsafe fn decode_slice<T: Copy>(
    alloc: &impl NativeAllocator,
    slice: NativeSlice<T>,
    ownership: BufferOwnership,
) -> Option<Vec<T>> {
    // Safety: Upheld by the caller.
    unsafe { decode_counted(alloc, slice.ptr, slice.len as usize, ownership) }
}

/// Returns the number of elements preceding the sentinel.
///
/// # Safety
///
/// `ptr` must point to a sequence terminated by a sentinel element.
pub unsafe fn terminated_len<T: Sentinel>(ptr: *const T) -> usize {
    let mut len = 0;
    // Safety: The sequence is terminated, so every read stays in bounds.
    while !unsafe { (*ptr.add(len)).is_sentinel() } {
        len += 1;
    }
    len
}

/// Copies a sentinel-terminated sequence returned by a native call.
///
/// A null buffer yields `None`. With [`BufferOwnership::Owned`] only the buffer itself is
/// freed through `alloc`, the elements are copied as they are.
///
/// # Safety
///
/// `ptr` must be null or point to a terminated sequence. With [`BufferOwnership::Owned`]
/// the buffer must have been allocated by `alloc`.
pub unsafe fn decode_terminated<T: Sentinel>(
    alloc: &impl NativeAllocator,
    ptr: *mut T,
    ownership: BufferOwnership,
) -> Option<Vec<T>> {
    if ptr.is_null() {
        return None;
    }
    // Safety: Upheld by the caller.
    unsafe {
        let len = terminated_len(ptr);
        decode_counted(alloc, ptr, len, ownership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::CountingAllocator;

    fn round_trip(len: usize) {
        let alloc = CountingAllocator::new();
        let values = (0..len).map(|i| i as u64 * 3).collect::<Vec<_>>();

        let array = encode(&alloc, &values).unwrap();
        assert_eq!(array.len() as usize, len);
        assert_eq!(array.as_slice(), values);

        let raw = array.into_raw();
        // Safety: The buffer holds `len` elements owned by `alloc`.
        let decoded = unsafe { decode_slice(&alloc, raw, BufferOwnership::Owned) };
        assert_eq!(decoded.as_deref(), Some(&values[..]));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn round_trips() {
        round_trip(0);
        round_trip(1);
        round_trip(10_000);
    }

    #[test]
    fn drop_frees_the_buffer() {
        let alloc = CountingAllocator::new();
        drop(encode(&alloc, &[1u32, 2, 3]).unwrap());
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn null_buffer_with_length_is_absent() {
        let alloc = CountingAllocator::new();
        // Safety: Null buffers are never read.
        unsafe {
            assert_eq!(
                decode_counted::<u16>(&alloc, std::ptr::null_mut(), 0, BufferOwnership::Owned),
                Some(vec![])
            );
            assert_eq!(
                decode_counted::<u16>(&alloc, std::ptr::null_mut(), 4, BufferOwnership::Owned),
                None
            );
            assert_eq!(
                decode_terminated::<u8>(&alloc, std::ptr::null_mut(), BufferOwnership::Owned),
                None
            );
        }
        assert_eq!(alloc.frees(), 0);
    }

    #[test]
    fn borrowed_buffers_are_not_freed() {
        let alloc = CountingAllocator::new();
        let mut values = [5i32, 6, 7];
        // Safety: `values` is a live array of three elements.
        let decoded = unsafe {
            decode_counted(&alloc, values.as_mut_ptr(), values.len(), BufferOwnership::Borrowed)
        };
        assert_eq!(decoded, Some(values.to_vec()));
        assert_eq!(alloc.frees(), 0);
    }

    #[test]
    fn terminated_round_trip() {
        let alloc = CountingAllocator::new();
        let array = encode_terminated(&alloc, b"native").unwrap();
        assert_eq!(array.len(), 6);

        let raw = array.into_raw();
        // Safety: The buffer is terminated and owned by `alloc`.
        let decoded = unsafe { decode_terminated(&alloc, raw.ptr, BufferOwnership::Owned) };
        assert_eq!(decoded.as_deref(), Some(&b"native"[..]));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn string_sequences_stop_at_empty_entries() {
        let entries: [*const c_char; 4] = [
            c"a".as_ptr(),
            c"".as_ptr(),
            c"b".as_ptr(),
            std::ptr::null(),
        ];
        // Safety: `entries` is terminated.
        assert_eq!(unsafe { terminated_len(entries.as_ptr()) }, 1);
    }
}
