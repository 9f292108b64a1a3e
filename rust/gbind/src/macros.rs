/// Declares a bound type owning one native object through a [`NativeHandle`].
///
/// `refcounted` types clone by taking a new native reference with `<prefix>_ref` and are
/// released with `<prefix>_unref`. `unique` types have a single owner and are released with
/// the named entry point.
///
/// [`NativeHandle`]: crate::handle::NativeHandle
macro_rules! bound_type {
    (
        $(#[$meta:meta])*
        refcounted $name:ident($raw:ty) = $prefix:ident
    ) => {
        ::paste::paste! {
            bound_type!(@common $(#[$meta])* $name($raw) = [<$prefix _unref>]);

            impl Clone for $name {
                fn clone(&self) -> Self {
                    // Safety: The object is live and `ref` returns a new reference to it.
                    let ptr = unsafe { (self.glib.[<$prefix _ref>])(self.as_raw()) };
                    // Safety: The new reference is owned by the clone.
                    let handle = unsafe {
                        $crate::handle::NativeHandle::owned(ptr, self.glib.[<$prefix _unref>])
                    };
                    Self {
                        glib: self.glib,
                        handle,
                    }
                }
            }
        }
    };
    (
        $(#[$meta:meta])*
        unique $name:ident($raw:ty) = $free:ident
    ) => {
        bound_type!(@common $(#[$meta])* $name($raw) = $free);
    };
    (@common $(#[$meta:meta])* $name:ident($raw:ty) = $destroy:ident) => {
        $(#[$meta])*
        pub struct $name {
            glib: &'static $crate::bindings::Glib,
            handle: $crate::handle::NativeHandle<$raw>,
        }

        impl $name {
            /// Takes ownership of a native reference, returning `None` for null.
            ///
            /// # Safety
            ///
            /// `ptr` must be null or an owned reference to a live object.
            #[allow(dead_code)]
            pub(crate) unsafe fn from_raw_full(
                glib: &'static $crate::bindings::Glib,
                ptr: *mut $raw,
            ) -> Option<Self> {
                // Safety: Upheld by the caller.
                let handle = unsafe { $crate::handle::NativeHandle::owned(ptr, glib.$destroy) };
                handle.is_valid().then_some(Self { glib, handle })
            }

            /// Borrows an object owned elsewhere, returning `None` for null.
            ///
            /// # Safety
            ///
            /// `ptr` must be null or point to an object that outlives `'a`.
            #[allow(dead_code)]
            pub(crate) unsafe fn from_raw_none<'a>(
                glib: &'static $crate::bindings::Glib,
                ptr: *mut $raw,
            ) -> Option<$crate::ffi::Borrowed<'a, Self>> {
                // Safety: Upheld by the caller.
                let handle = unsafe { $crate::handle::NativeHandle::borrowed(ptr) };
                if !handle.is_valid() {
                    return None;
                }
                // Safety: The handle is borrowing.
                Some(unsafe { $crate::ffi::Borrowed::new(Self { glib, handle }) })
            }

            /// Releases the native object.
            ///
            /// Calling this more than once has no further effect. Any other use of the object
            /// afterwards panics.
            pub fn release(&mut self) {
                self.handle.release();
            }

            /// Returns whether the object was not released yet.
            pub fn is_valid(&self) -> bool {
                self.handle.is_valid()
            }

            /// Returns the native address.
            ///
            /// # Panics
            ///
            /// Panics if the object was released.
            #[track_caller]
            pub fn as_raw(&self) -> *mut $raw {
                self.handle.as_ptr()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.handle).finish()
            }
        }

        impl $crate::ffi::FFITransferable<*mut $raw> for $name {
            fn into_ffi(self) -> *mut $raw {
                self.handle.into_raw()
            }

            unsafe fn from_ffi(ffi: *mut $raw) -> Self {
                let glib = $crate::bindings::Glib::loaded();
                Self {
                    glib,
                    // Safety: The caller transfers one reference.
                    handle: unsafe { $crate::handle::NativeHandle::owned(ffi, glib.$destroy) },
                }
            }
        }

        impl $crate::ffi::FFISharable<*mut $raw> for $name {
            type BorrowedView<'a> = $crate::ffi::Borrowed<'a, $name>;

            fn share_to_ffi(&self) -> *mut $raw {
                self.as_raw()
            }

            unsafe fn borrow_from_ffi<'a>(ffi: *mut $raw) -> Self::BorrowedView<'a> {
                let value = Self {
                    glib: $crate::bindings::Glib::loaded(),
                    // Safety: The caller guarantees that the object outlives `'a`.
                    handle: unsafe { $crate::handle::NativeHandle::borrowed(ffi) },
                };
                // Safety: The handle is borrowing.
                unsafe { $crate::ffi::Borrowed::new(value) }
            }
        }
    };
}
