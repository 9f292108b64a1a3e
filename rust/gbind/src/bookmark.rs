//! Desktop bookmark files.
//!
//! A [`BookmarkFile`] holds a set of URIs, each with a title, description, MIME type, groups
//! and the applications that registered it, in the XBEL format.

use crate::{
    allocator::GlibAllocator,
    bindings::{GBookmarkFile, Glib},
    error::{to_result_indirect, Error, Result},
    marshal::{
        array::{self, BufferOwnership},
        string, NativeBool, TransientStr, TransientStrv,
    },
};
use std::path::Path;

bound_type! {
    /// A mutable collection of bookmarks.
    unique BookmarkFile(GBookmarkFile) = g_bookmark_file_free
}

// Safety: A `GBookmarkFile` is not bound to a thread; it is not synchronized, so only `Send`.
unsafe impl Send for BookmarkFile {}

impl BookmarkFile {
    /// Constructs an empty bookmark file.
    pub fn new() -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let ptr = unsafe { (glib.g_bookmark_file_new)() };
        // Safety: Returns a new object.
        unsafe { Self::from_raw_full(glib, ptr) }.ok_or(Error::NullReturn {
            symbol: "g_bookmark_file_new",
        })
    }

    fn allocator(&self) -> GlibAllocator {
        GlibAllocator::new(self.glib)
    }

    /// Replaces the contents with the bookmarks parsed from `data`.
    pub fn load_from_data(&mut self, data: &[u8]) -> Result {
        let glib = self.glib;
        // Safety: `data` is valid for `data.len()` bytes.
        unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_load_from_data)(
                    self.as_raw(),
                    data.as_ptr().cast(),
                    data.len(),
                    error,
                )
            })
        }?;
        Ok(())
    }

    /// Replaces the contents with the bookmarks parsed from the file at `path`.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result {
        let glib = self.glib;
        let path = TransientStr::from_path(path.as_ref())?;
        // Safety: The path is nul-terminated.
        unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_load_from_file)(self.as_raw(), path.as_ptr(), error)
            })
        }?;
        Ok(())
    }

    /// Serializes the bookmarks.
    pub fn to_data(&self) -> Result<Vec<u8>> {
        let glib = self.glib;
        let mut len = 0;
        // Safety: FFI call is safe.
        let data = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_to_data)(self.as_raw(), &mut len, error)
            })
        }?;
        // Safety: The buffer holds `len` bytes and is owned by us.
        unsafe {
            array::decode_counted(&self.allocator(), data.cast::<u8>(), len, BufferOwnership::Owned)
        }
        .ok_or(Error::NullReturn {
            symbol: "g_bookmark_file_to_data",
        })
    }

    /// Serializes the bookmarks into the file at `path`.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result {
        let glib = self.glib;
        let path = TransientStr::from_path(path.as_ref())?;
        // Safety: The path is nul-terminated.
        unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_to_file)(self.as_raw(), path.as_ptr(), error)
            })
        }?;
        Ok(())
    }

    /// Returns whether a bookmark for `uri` exists.
    pub fn has_item(&self, uri: &str) -> Result<bool> {
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        let found = unsafe { (self.glib.g_bookmark_file_has_item)(self.as_raw(), uri.as_ptr()) };
        Ok(found.get())
    }

    /// Removes the bookmark for `uri`.
    pub fn remove_item(&mut self, uri: &str) -> Result {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_remove_item)(self.as_raw(), uri.as_ptr(), error)
            })
        }?;
        Ok(())
    }

    /// Moves the bookmark for `old_uri` to `new_uri`, or removes it if `new_uri` is `None`.
    pub fn move_item(&mut self, old_uri: &str, new_uri: Option<&str>) -> Result {
        let glib = self.glib;
        let old_uri = TransientStr::new(old_uri)?;
        let new_uri = TransientStr::new_optional(new_uri)?;
        // Safety: Both URIs are null or nul-terminated.
        unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_move_item)(
                    self.as_raw(),
                    old_uri.as_ptr(),
                    TransientStr::optional_ptr(new_uri.as_ref()),
                    error,
                )
            })
        }?;
        Ok(())
    }

    /// Returns the number of bookmarks.
    pub fn size(&self) -> usize {
        // Safety: FFI call is safe.
        let size = unsafe { (self.glib.g_bookmark_file_get_size)(self.as_raw()) };
        usize::try_from(size).unwrap_or(0)
    }

    /// Returns the URIs of all bookmarks.
    pub fn uris(&self) -> Vec<String> {
        // Safety: The vector and its elements are owned by us.
        unsafe {
            let uris = (self.glib.g_bookmark_file_get_uris)(self.as_raw(), std::ptr::null_mut());
            string::from_owned_strv(&self.allocator(), uris)
        }
        .unwrap_or_default()
    }

    /// Sets the title of the bookmark for `uri`, or of the whole file if `uri` is `None`.
    pub fn set_title(&mut self, uri: Option<&str>, title: &str) -> Result {
        let uri = TransientStr::new_optional(uri)?;
        let title = TransientStr::new(title)?;
        // Safety: All strings are null or nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_set_title)(
                self.as_raw(),
                TransientStr::optional_ptr(uri.as_ref()),
                title.as_ptr(),
            );
        }
        Ok(())
    }

    /// Returns the title of the bookmark for `uri`, or of the whole file if `uri` is `None`.
    pub fn title(&self, uri: Option<&str>) -> Result<Option<String>> {
        let glib = self.glib;
        let uri = TransientStr::new_optional(uri)?;
        // Safety: The URI is null or nul-terminated.
        let title = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_title)(
                    self.as_raw(),
                    TransientStr::optional_ptr(uri.as_ref()),
                    error,
                )
            })
        }?;
        // Safety: The title is owned by us.
        Ok(unsafe { string::from_owned(&self.allocator(), title) })
    }

    /// Sets the description of the bookmark for `uri`, or of the whole file if `uri` is
    /// `None`.
    pub fn set_description(&mut self, uri: Option<&str>, description: &str) -> Result {
        let uri = TransientStr::new_optional(uri)?;
        let description = TransientStr::new(description)?;
        // Safety: All strings are null or nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_set_description)(
                self.as_raw(),
                TransientStr::optional_ptr(uri.as_ref()),
                description.as_ptr(),
            );
        }
        Ok(())
    }

    /// Returns the description of the bookmark for `uri`, or of the whole file if `uri` is
    /// `None`.
    pub fn description(&self, uri: Option<&str>) -> Result<Option<String>> {
        let glib = self.glib;
        let uri = TransientStr::new_optional(uri)?;
        // Safety: The URI is null or nul-terminated.
        let description = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_description)(
                    self.as_raw(),
                    TransientStr::optional_ptr(uri.as_ref()),
                    error,
                )
            })
        }?;
        // Safety: The description is owned by us.
        Ok(unsafe { string::from_owned(&self.allocator(), description) })
    }

    /// Sets the MIME type of the bookmark for `uri`, creating the bookmark if needed.
    pub fn set_mime_type(&mut self, uri: &str, mime_type: &str) -> Result {
        let uri = TransientStr::new(uri)?;
        let mime_type = TransientStr::new(mime_type)?;
        // Safety: Both strings are nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_set_mime_type)(
                self.as_raw(),
                uri.as_ptr(),
                mime_type.as_ptr(),
            );
        }
        Ok(())
    }

    /// Returns the MIME type of the bookmark for `uri`.
    pub fn mime_type(&self, uri: &str) -> Result<String> {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        let mime_type = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_mime_type)(self.as_raw(), uri.as_ptr(), error)
            })
        }?;
        // Safety: The MIME type is owned by us.
        Ok(unsafe { string::from_owned(&self.allocator(), mime_type) }.unwrap_or_default())
    }

    /// Adds `group` to the groups of the bookmark for `uri`, creating the bookmark if needed.
    pub fn add_group(&mut self, uri: &str, group: &str) -> Result {
        let uri = TransientStr::new(uri)?;
        let group = TransientStr::new(group)?;
        // Safety: Both strings are nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_add_group)(self.as_raw(), uri.as_ptr(), group.as_ptr());
        }
        Ok(())
    }

    /// Returns whether the bookmark for `uri` is in `group`.
    pub fn has_group(&self, uri: &str, group: &str) -> Result<bool> {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        let group = TransientStr::new(group)?;
        // Safety: Both strings are nul-terminated.
        let found = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_has_group)(self.as_raw(), uri.as_ptr(), group.as_ptr(), error)
            })
        }?;
        Ok(found.get())
    }

    /// Returns the groups of the bookmark for `uri`.
    pub fn groups(&self, uri: &str) -> Result<Vec<String>> {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        let groups = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_groups)(
                    self.as_raw(),
                    uri.as_ptr(),
                    std::ptr::null_mut(),
                    error,
                )
            })
        }?;
        // Safety: The vector and its elements are owned by us.
        Ok(unsafe { string::from_owned_strv(&self.allocator(), groups) }.unwrap_or_default())
    }

    /// Replaces the groups of the bookmark for `uri`, creating the bookmark if needed.
    pub fn set_groups<S: AsRef<str>>(&mut self, uri: &str, groups: &[S]) -> Result {
        let uri = TransientStr::new(uri)?;
        let groups = TransientStrv::new(groups)?;
        // Safety: The URI and the vector are nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_set_groups)(
                self.as_raw(),
                uri.as_ptr(),
                groups.as_ptr(),
                groups.len(),
            );
        }
        Ok(())
    }

    /// Registers an application for the bookmark for `uri`, creating the bookmark if needed.
    ///
    /// `name` defaults to the program name and `exec` to the name followed by `%u`.
    pub fn add_application(
        &mut self,
        uri: &str,
        name: Option<&str>,
        exec: Option<&str>,
    ) -> Result {
        let uri = TransientStr::new(uri)?;
        let name = TransientStr::new_optional(name)?;
        let exec = TransientStr::new_optional(exec)?;
        // Safety: All strings are null or nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_add_application)(
                self.as_raw(),
                uri.as_ptr(),
                TransientStr::optional_ptr(name.as_ref()),
                TransientStr::optional_ptr(exec.as_ref()),
            );
        }
        Ok(())
    }

    /// Returns the names of the applications registered for the bookmark for `uri`.
    pub fn applications(&self, uri: &str) -> Result<Vec<String>> {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        let applications = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_applications)(
                    self.as_raw(),
                    uri.as_ptr(),
                    std::ptr::null_mut(),
                    error,
                )
            })
        }?;
        // Safety: The vector and its elements are owned by us.
        let applications = unsafe { string::from_owned_strv(&self.allocator(), applications) };
        Ok(applications.unwrap_or_default())
    }

    /// Marks the bookmark for `uri` as private, creating the bookmark if needed.
    pub fn set_is_private(&mut self, uri: &str, is_private: bool) -> Result {
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        unsafe {
            (self.glib.g_bookmark_file_set_is_private)(
                self.as_raw(),
                uri.as_ptr(),
                NativeBool::new(is_private),
            );
        }
        Ok(())
    }

    /// Returns whether the bookmark for `uri` is private.
    pub fn is_private(&self, uri: &str) -> Result<bool> {
        let glib = self.glib;
        let uri = TransientStr::new(uri)?;
        // Safety: The URI is nul-terminated.
        let is_private = unsafe {
            to_result_indirect(glib, |error| {
                (glib.g_bookmark_file_get_is_private)(self.as_raw(), uri.as_ptr(), error)
            })
        }?;
        Ok(is_private.get())
    }
}
