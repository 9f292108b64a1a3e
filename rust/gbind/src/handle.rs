//! Ownership-aware wrapper around native addresses.
//!
//! A [`NativeHandle`] either owns one native reference, which it gives back exactly once, or
//! borrows an address owned by someone else, in which case it never releases anything.

use std::{
    any::type_name,
    ffi::c_void,
    fmt::{self, Debug, Formatter, Pointer},
    hash::{Hash, Hasher},
    mem::ManuallyDrop,
    ptr::NonNull,
};

/// Native entry point dropping one reference of a `T`, like `g_date_time_unref`.
pub type Unref<T> = unsafe extern "C" fn(*mut T);

/// Releases one native reference.
pub trait Destructor<T>: Copy {
    /// Releases the reference behind `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must own the reference and must not use `ptr` afterwards.
    unsafe fn destroy(self, ptr: NonNull<T>);
}

impl<T> Destructor<T> for Unref<T> {
    unsafe fn destroy(self, ptr: NonNull<T>) {
        // Safety: Upheld by the caller.
        unsafe { self(ptr.as_ptr()) }
    }
}

/// Destructor of structs that are initialized in place inside native memory, like a `GMutex`.
///
/// The struct is cleared first, then its memory is returned to the native allocator.
pub struct ClearAndFree<T> {
    pub clear: Unref<T>,
    pub free: unsafe extern "C" fn(*mut c_void),
}

impl<T> Clone for ClearAndFree<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ClearAndFree<T> {}

impl<T> Debug for ClearAndFree<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClearAndFree")
            .field("clear", &(self.clear as *const ()))
            .field("free", &(self.free as *const ()))
            .finish()
    }
}

impl<T> Destructor<T> for ClearAndFree<T> {
    unsafe fn destroy(self, ptr: NonNull<T>) {
        // Safety: Upheld by the caller.
        unsafe {
            (self.clear)(ptr.as_ptr());
            (self.free)(ptr.as_ptr().cast());
        }
    }
}

/// Whether a handle is responsible for releasing its address.
#[derive(Debug, Clone, Copy)]
pub enum Ownership<D> {
    /// The handle owns one reference and releases it with the destructor.
    Owned(D),
    /// The address is owned elsewhere and is never released by the handle.
    Borrowed,
}

/// Lifecycle state of a [`NativeHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// Constructed from the null sentinel.
    Unbound,
    /// Bound to an address it owns.
    Owned,
    /// Bound to an address it borrows.
    Borrowed,
    /// Released; the handle can not be bound again.
    Released,
}

/// Wrapper around a native address of a `T`.
///
/// Dropping an owning handle releases its reference. [`release`](Self::release) does the same
/// eagerly and may be called any number of times; only the first call on a bound, owning
/// handle reaches the native destructor.
///
/// Any access to the address of a handle that is unbound or released panics, as it indicates
/// a bug in the caller.
pub struct NativeHandle<T, D: Destructor<T> = Unref<T>> {
    ptr: Option<NonNull<T>>,
    ownership: Ownership<D>,
    released: bool,
}

impl<T, D: Destructor<T>> NativeHandle<T, D> {
    /// Wraps `ptr`.
    ///
    /// A null `ptr` yields an [`Unbound`](HandleState::Unbound) handle.
    ///
    /// # Safety
    ///
    /// If `ptr` is non-null it must point to a live `T`. With [`Ownership::Owned`] the caller
    /// transfers one reference to the handle, which `destructor` must be able to release. With
    /// [`Ownership::Borrowed`] the address must outlive every use of the handle.
    pub unsafe fn acquire(ptr: *mut T, ownership: Ownership<D>) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            ownership,
            released: false,
        }
    }

    /// Wraps an owned reference.
    ///
    /// # Safety
    ///
    /// See [`acquire`](Self::acquire).
    pub unsafe fn owned(ptr: *mut T, destructor: D) -> Self {
        // Safety: Upheld by the caller.
        unsafe { Self::acquire(ptr, Ownership::Owned(destructor)) }
    }

    /// Wraps a borrowed address.
    ///
    /// # Safety
    ///
    /// See [`acquire`](Self::acquire).
    pub unsafe fn borrowed(ptr: *mut T) -> Self {
        // Safety: Upheld by the caller.
        unsafe { Self::acquire(ptr, Ownership::Borrowed) }
    }

    /// Constructs a handle bound to no object.
    pub const fn unbound() -> Self {
        Self {
            ptr: None,
            ownership: Ownership::Borrowed,
            released: false,
        }
    }

    /// Returns whether the handle is bound to an address.
    pub fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }

    /// Returns whether the handle releases its address.
    pub fn is_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Owned(_))
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> HandleState {
        match (self.ptr, &self.ownership) {
            (None, _) if self.released => HandleState::Released,
            (None, _) => HandleState::Unbound,
            (Some(_), Ownership::Owned(_)) => HandleState::Owned,
            (Some(_), Ownership::Borrowed) => HandleState::Borrowed,
        }
    }

    /// Returns the address.
    ///
    /// # Panics
    ///
    /// Panics if the handle is unbound or released.
    #[track_caller]
    pub fn as_ptr(&self) -> *mut T {
        self.as_non_null().as_ptr()
    }

    /// Returns the address.
    ///
    /// # Panics
    ///
    /// Panics if the handle is unbound or released.
    #[track_caller]
    pub fn as_non_null(&self) -> NonNull<T> {
        match self.ptr {
            Some(ptr) => ptr,
            None => invalid_handle::<T>(self.released),
        }
    }

    /// Returns the address, or `None` if the handle is unbound or released.
    pub fn try_as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Releases the address.
    ///
    /// Owning handles invoke their destructor; borrowing handles only forget the address.
    /// Calling this on an unbound or released handle does nothing.
    pub fn release(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        self.released = true;
        if let Ownership::Owned(destructor) = self.ownership {
            tracing::trace!(resource = type_name::<T>(), address = ?ptr, "releasing native handle");
            // Safety: The handle owned the reference and the address was taken out, so it is
            // released at most once.
            unsafe { destructor.destroy(ptr) };
        }
    }

    /// Gives up the address without releasing it.
    ///
    /// Returns null for an unbound or released handle. For an owning handle the reference is
    /// transferred to the caller.
    pub fn into_raw(self) -> *mut T {
        let this = ManuallyDrop::new(self);
        this.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }
}

#[cold]
#[track_caller]
fn invalid_handle<T>(released: bool) -> ! {
    let state = if released { "released" } else { "unbound" };
    panic!("use of a {state} native handle to `{}`", type_name::<T>())
}

impl<T, D: Destructor<T>> Drop for NativeHandle<T, D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T, D: Destructor<T>> Debug for NativeHandle<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("ptr", &self.ptr)
            .field("state", &self.state())
            .finish()
    }
}

impl<T, D: Destructor<T>> Pointer for NativeHandle<T, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ptr = self.ptr.map_or(std::ptr::null(), |ptr| ptr.as_ptr().cast_const());
        Pointer::fmt(&ptr, f)
    }
}

impl<T, D: Destructor<T>> PartialEq for NativeHandle<T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, D: Destructor<T>> Eq for NativeHandle<T, D> {}

impl<T, D: Destructor<T>> Hash for NativeHandle<T, D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}
