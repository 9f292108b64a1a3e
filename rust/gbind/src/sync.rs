//! Native mutual exclusion and condition variables.
//!
//! The locks live in memory allocated by the native allocator and are released with
//! [`ClearAndFree`]: first cleared, then freed. They are not reentrant; locking a [`Mutex`]
//! twice from the same thread deadlocks or is undefined, as in the native library.

use crate::{
    bindings::{GCond, GMutex, Glib},
    error::{Error, Result},
    handle::{ClearAndFree, NativeHandle},
    time::{MonotonicTime, TimeSpan},
};
use std::{
    cell::UnsafeCell,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

type Raw<T> = NativeHandle<T, ClearAndFree<T>>;

/// Allocates zeroed native memory for a `T` and initializes it with `init`.
fn alloc_native<T>(
    glib: &'static Glib,
    init: unsafe extern "C" fn(*mut T),
    clear: unsafe extern "C" fn(*mut T),
    symbol: &'static str,
) -> Result<Raw<T>> {
    // Safety: `g_malloc0` aborts on failure and returns memory aligned for any type.
    let ptr = unsafe { (glib.g_malloc0)(size_of::<T>()) }.cast::<T>();
    if ptr.is_null() {
        return Err(Error::NullReturn { symbol: "g_malloc0" });
    }
    // Safety: The memory is zeroed and large enough for a `T`.
    unsafe { init(ptr) };
    tracing::trace!(symbol, address = ?ptr, "initialized native lock");
    let destructor = ClearAndFree {
        clear,
        free: glib.g_free,
    };
    // Safety: The memory is owned by the handle and was allocated with `g_malloc0`.
    Ok(unsafe { NativeHandle::owned(ptr, destructor) })
}

/// A native `GMutex` together with its lock state.
///
/// Clearing a locked `GMutex` aborts the process, so a mutex dropped while still locked
/// (its guard was leaked) leaks its native storage instead.
struct RawMutex {
    glib: &'static Glib,
    raw: Raw<GMutex>,
    locked: AtomicBool,
}

impl RawMutex {
    fn new(glib: &'static Glib) -> Result<Self> {
        let raw = alloc_native(glib, glib.g_mutex_init, glib.g_mutex_clear, "g_mutex_init")?;
        Ok(Self {
            glib,
            raw,
            locked: AtomicBool::new(false),
        })
    }

    fn as_ptr(&self) -> *mut GMutex {
        self.raw.as_ptr()
    }

    fn lock(&self) {
        // Safety: The mutex is initialized.
        unsafe { (self.glib.g_mutex_lock)(self.as_ptr()) };
        self.mark_locked();
    }

    fn try_lock(&self) -> bool {
        // Safety: The mutex is initialized.
        let locked = unsafe { (self.glib.g_mutex_trylock)(self.as_ptr()) }.get();
        if locked {
            self.mark_locked();
        }
        locked
    }

    /// Records that the calling thread holds the lock.
    fn mark_locked(&self) {
        // Only written while the native lock is held.
        self.locked.store(true, Ordering::Relaxed);
    }

    /// # Safety
    ///
    /// The lock must be held by the calling thread.
    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Relaxed);
        // Safety: Upheld by the caller.
        unsafe { (self.glib.g_mutex_unlock)(self.as_ptr()) };
    }
}

impl Drop for RawMutex {
    fn drop(&mut self) {
        if *self.locked.get_mut() {
            let raw = mem::replace(&mut self.raw, NativeHandle::unbound());
            let ptr = raw.into_raw();
            tracing::warn!(address = ?ptr, "leaking a mutex dropped while locked");
        }
    }
}

impl Debug for RawMutex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMutex")
            .field("raw", &self.raw)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

/// A mutual exclusion lock protecting a `T`, backed by a native `GMutex`.
///
/// Leaking a [`MutexGuard`] keeps the mutex locked forever; dropping the mutex afterwards
/// leaks its native storage.
pub struct Mutex<T: ?Sized> {
    raw: RawMutex,
    data: UnsafeCell<T>,
}

// Safety: The lock grants exclusive access to the data, which may be sent between threads.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}

// Safety: See above.
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Constructs an unlocked mutex.
    pub fn new(value: T) -> Result<Self> {
        let glib = Glib::get()?;
        Ok(Self {
            raw: RawMutex::new(glib)?,
            data: UnsafeCell::new(value),
        })
    }

    /// Consumes the mutex and returns the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.lock();
        MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        }
    }

    /// Acquires the lock if it is free.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if !self.raw.try_lock() {
            return None;
        }
        Some(MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }

    /// Returns the protected value without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: ?Sized> Debug for Mutex<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// Scoped access to the value of a locked [`Mutex`].
///
/// The lock is released when the guard is dropped, on the thread that acquired it.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
    _not_send: PhantomData<*const ()>,
}

// Safety: Sharing the guard only grants shared access to the value.
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Safety: The lock is held.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: The lock is held exclusively.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        // Safety: The lock is held by this thread.
        unsafe { self.mutex.raw.unlock() };
    }
}

impl<T: ?Sized + Debug> Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&**self, f)
    }
}

/// A condition variable, backed by a native `GCond`.
///
/// Waits may wake up spuriously; callers recheck their condition in a loop.
pub struct Cond {
    glib: &'static Glib,
    raw: Raw<GCond>,
}

// Safety: A `GCond` may be used from any thread.
unsafe impl Send for Cond {}

// Safety: See above.
unsafe impl Sync for Cond {}

impl Cond {
    /// Constructs a condition variable.
    pub fn new() -> Result<Self> {
        let glib = Glib::get()?;
        let raw = alloc_native(glib, glib.g_cond_init, glib.g_cond_clear, "g_cond_init")?;
        Ok(Self { glib, raw })
    }

    /// Atomically releases the lock of `guard` and blocks until woken up.
    ///
    /// The lock is reacquired before returning.
    pub fn wait<T: ?Sized>(&self, guard: &mut MutexGuard<'_, T>) {
        let mutex = &guard.mutex.raw;
        // Safety: The lock is held by this thread.
        unsafe { (self.glib.g_cond_wait)(self.raw.as_ptr(), mutex.as_ptr()) };
        // Other threads may have locked and unlocked the mutex while waiting.
        mutex.mark_locked();
    }

    /// Like [`wait`](Self::wait), giving up once the monotonic clock passes `end_time`.
    ///
    /// Returns `false` if the deadline passed.
    pub fn wait_until<T: ?Sized>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        end_time: MonotonicTime,
    ) -> bool {
        let mutex = &guard.mutex.raw;
        // Safety: The lock is held by this thread.
        let signalled = unsafe {
            (self.glib.g_cond_wait_until)(self.raw.as_ptr(), mutex.as_ptr(), end_time.as_micros())
        };
        mutex.mark_locked();
        signalled.get()
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// Returns `false` if the timeout elapsed.
    pub fn wait_timeout<T: ?Sized>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        timeout: Duration,
    ) -> bool {
        let span = TimeSpan::from_duration(timeout).unwrap_or(TimeSpan::from_micros(i64::MAX));
        let end_time = MonotonicTime::now_in(self.glib).saturating_add(span);
        self.wait_until(guard, end_time)
    }

    /// Wakes up one waiting thread.
    pub fn signal(&self) {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_cond_signal)(self.raw.as_ptr()) };
    }

    /// Wakes up all waiting threads.
    pub fn broadcast(&self) {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_cond_broadcast)(self.raw.as_ptr()) };
    }
}

impl Debug for Cond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cond").field("raw", &self.raw).finish_non_exhaustive()
    }
}
