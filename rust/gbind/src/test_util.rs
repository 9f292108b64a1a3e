//! In-process stand-ins for native objects and allocators.

use crate::{allocator::NativeAllocator, handle::Unref};
use std::{
    ffi::c_void,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Fake native object counting how often it was released.
pub struct Counted {
    releases: AtomicUsize,
}

impl Counted {
    pub const RELEASE: Unref<Counted> = Self::release;

    pub fn new() -> Box<Self> {
        Box::new(Self {
            releases: AtomicUsize::new(0),
        })
    }

    pub fn as_ptr(&self) -> *mut Self {
        std::ptr::from_ref(self).cast_mut()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    unsafe extern "C" fn release(this: *mut Self) {
        // Safety: `this` points to a live `Counted`.
        unsafe { (*this).releases.fetch_add(1, Ordering::SeqCst) };
    }
}

/// `malloc`/`free` allocator counting the live allocations.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    frees: AtomicUsize,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.allocations() - self.frees()
    }
}

// Safety: Forwards to `malloc` and `free`.
unsafe impl NativeAllocator for CountingAllocator {
    fn alloc(&self, size: usize) -> *mut c_void {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        // Safety: `malloc` has no preconditions.
        unsafe { libc::malloc(size.max(1)) }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        if ptr.is_null() {
            return;
        }
        self.frees.fetch_add(1, Ordering::SeqCst);
        // Safety: `ptr` was allocated by `alloc`.
        unsafe { libc::free(ptr) }
    }
}
