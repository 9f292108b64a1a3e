//! FFI helpers.

use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ops::Deref,
};

/// Used to transfer ownership to and from a ffi interface.
///
/// The ownership of a type is transferred by calling [`Self::into_ffi`] and
/// is reclaimed by calling [`Self::from_ffi`].
pub trait FFITransferable<FfiType: Sized> {
    /// Transfers the ownership from a Rust type to a ffi type.
    fn into_ffi(self) -> FfiType;

    /// Assumes ownership of a ffi type.
    ///
    /// # Safety
    ///
    /// The caller must ensure to have the ownership of the ffi type.
    unsafe fn from_ffi(ffi: FfiType) -> Self;
}

/// Used to share ownership with and from a ffi interface.
///
/// The ownership of a type is shared by calling [`Self::share_to_ffi`] and
/// is borrowed by calling [`Self::borrow_from_ffi`].
pub trait FFISharable<FfiType: Sized> {
    type BorrowedView<'a>: 'a;

    /// Shares the value of a Rust type with a ffi type.
    fn share_to_ffi(&self) -> FfiType;

    /// Borrows the ownership of a ffi type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that all invariants of the type are conserved.
    unsafe fn borrow_from_ffi<'a>(ffi: FfiType) -> Self::BorrowedView<'a>;
}

/// A bound object whose native address is owned by someone else.
///
/// The wrapped value is backed by a borrowing handle, so dropping it releases nothing. The
/// lifetime ties the view to the owner of the address. Cloning the inner value through
/// [`Deref`] takes a new, owned reference.
pub struct Borrowed<'a, T> {
    value: T,
    _phantom: PhantomData<&'a ()>,
}

impl<T> Borrowed<'_, T> {
    /// Wraps a value backed by a borrowing handle.
    ///
    /// # Safety
    ///
    /// `value` must not release its address when dropped, and the address must stay live for
    /// the lifetime of the view.
    pub(crate) unsafe fn new(value: T) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }
}

impl<T> Deref for Borrowed<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: Debug> Debug for Borrowed<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Borrowed").field(&self.value).finish()
    }
}
