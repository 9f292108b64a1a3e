//! Leak-free bindings to the GLib C library.
//!
//! The crate is split into a small core and a set of bound types built on top of it:
//!
//! - [`library`] resolves the logical library name to a platform binary and loads it;
//! - [`handle`] owns native addresses and releases them exactly once;
//! - [`marshal`] converts booleans, strings and arrays across the boundary;
//! - [`error`] turns native error records into typed errors.
//!
//! Every bound type ([`time::DateTime`], [`bookmark::BookmarkFile`], [`queue::AsyncQueue`],
//! ...) holds exactly one [`handle::NativeHandle`].

#[macro_use]
mod macros;

pub mod bindings;

pub mod allocator;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod library;
pub mod marshal;
pub mod panic;

pub mod bookmark;
pub mod bytes;
pub mod checksum;
pub mod mapped_file;
pub mod queue;
pub mod sync;
pub mod time;

pub use error::{Error, NativeError, Result};
pub use library::Glib;

#[cfg(test)]
pub(crate) mod test_util;
