//! Boolean adapter.

use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

mod private {
    pub trait Sealed {}
}

/// Integer representation of a native boolean.
pub trait BoolRepr: private::Sealed + Copy + Eq + 'static {
    const TRUE: Self;
    const FALSE: Self;
}

impl private::Sealed for u8 {}
impl private::Sealed for i32 {}

impl BoolRepr for u8 {
    const TRUE: Self = 1;
    const FALSE: Self = 0;
}

impl BoolRepr for i32 {
    const TRUE: Self = 1;
    const FALSE: Self = 0;
}

/// Boolean transferred as an integer of type `R`.
///
/// `true` encodes to `1` and `false` to `0`. Any non-zero value decodes to `true`, so values
/// written by the native side compare equal whenever their truth values do.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct NativeBool<R: BoolRepr = u8>(R);

impl<R: BoolRepr> NativeBool<R> {
    pub const TRUE: Self = Self(R::TRUE);
    pub const FALSE: Self = Self(R::FALSE);

    /// Encodes `value`.
    pub const fn new(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Decodes the value.
    pub fn get(self) -> bool {
        self.0 != R::FALSE
    }

    /// Wraps a raw value received from the native side.
    pub const fn from_raw(raw: R) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn into_raw(self) -> R {
        self.0
    }
}

impl<R: BoolRepr> Default for NativeBool<R> {
    fn default() -> Self {
        Self::FALSE
    }
}

impl<R: BoolRepr> PartialEq for NativeBool<R> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<R: BoolRepr> Eq for NativeBool<R> {}

impl<R: BoolRepr> Hash for NativeBool<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

impl<R: BoolRepr> Debug for NativeBool<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.get(), f)
    }
}

impl<R: BoolRepr> From<bool> for NativeBool<R> {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl<R: BoolRepr> From<NativeBool<R>> for bool {
    fn from(value: NativeBool<R>) -> Self {
        value.get()
    }
}

static_assertions::assert_eq_size!(NativeBool, u8);
static_assertions::assert_eq_size!(NativeBool<i32>, i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_zero_and_one() {
        assert_eq!(NativeBool::<u8>::new(true).into_raw(), 1);
        assert_eq!(NativeBool::<u8>::new(false).into_raw(), 0);
        assert_eq!(NativeBool::<i32>::from(true).into_raw(), 1);
        assert_eq!(NativeBool::<i32>::default().into_raw(), 0);
    }

    #[test]
    fn any_non_zero_is_true() {
        for raw in 1..=u8::MAX {
            assert!(NativeBool::from_raw(raw).get());
        }
        assert!(!NativeBool::from_raw(0u8).get());
        assert!(bool::from(NativeBool::from_raw(-1i32)));
        assert_eq!(NativeBool::from_raw(7u8), NativeBool::TRUE);
    }
}
