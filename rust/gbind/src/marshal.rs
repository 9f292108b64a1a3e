//! Conversions of values crossing the native boundary.
//!
//! Each adapter is chosen explicitly at the call site; there is no implicit conversion
//! between Rust and native representations.

pub mod array;
pub mod boolean;
pub mod string;

pub use array::{BufferOwnership, NativeArray, NativeSlice, Sentinel};
pub use boolean::{BoolRepr, NativeBool};
pub use string::{TransientStr, TransientStrv};
