//! Thread safe queues.
//!
//! An [`AsyncQueue`] owns its items as native pointers. Items still queued when the queue
//! is dropped are released by a destroy notify registered at construction.

use crate::{
    bindings::{gpointer, GAsyncQueue, Glib},
    error::{Error, Result},
    handle::NativeHandle,
    panic::abort_on_panic,
};
use parking_lot::Mutex;
use std::{
    ffi::c_void,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    num::NonZeroUsize,
    ptr::NonNull,
    thread::{self, ThreadId},
    time::Duration,
};

/// Values that can be stored in an [`AsyncQueue`].
///
/// # Safety
///
/// [`into_ptr`](Self::into_ptr) and [`from_ptr`](Self::from_ptr) must round trip, and
/// [`as_ptr`](Self::as_ptr) must return the pointer `into_ptr` would return.
pub unsafe trait QueueItem: Sized + Send {
    /// Converts the item into a non-null pointer owning it.
    fn into_ptr(self) -> NonNull<c_void>;

    /// Reclaims an item from a pointer returned by [`into_ptr`](Self::into_ptr).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `into_ptr` and may only be reclaimed once.
    unsafe fn from_ptr(ptr: NonNull<c_void>) -> Self;

    /// Returns the pointer identifying the item inside a queue.
    fn as_ptr(&self) -> NonNull<c_void>;
}

// Safety: The box is leaked into the pointer and reconstructed from it.
unsafe impl<U: Send> QueueItem for Box<U> {
    fn into_ptr(self) -> NonNull<c_void> {
        NonNull::from(Box::leak(self)).cast()
    }

    unsafe fn from_ptr(ptr: NonNull<c_void>) -> Self {
        // Safety: Upheld by the caller.
        unsafe { Box::from_raw(ptr.cast::<U>().as_ptr()) }
    }

    fn as_ptr(&self) -> NonNull<c_void> {
        NonNull::from(&**self).cast()
    }
}

// Safety: The value is stored in the address bits.
unsafe impl QueueItem for NonZeroUsize {
    fn into_ptr(self) -> NonNull<c_void> {
        self.as_ptr()
    }

    unsafe fn from_ptr(ptr: NonNull<c_void>) -> Self {
        // Safety: The address of a `NonNull` is never zero.
        unsafe { NonZeroUsize::new_unchecked(ptr.as_ptr() as usize) }
    }

    fn as_ptr(&self) -> NonNull<c_void> {
        // Safety: The value is non-zero.
        unsafe { NonNull::new_unchecked(self.get() as *mut c_void) }
    }
}

unsafe extern "C" fn destroy_item<T: QueueItem>(data: gpointer) {
    abort_on_panic(|| {
        if let Some(ptr) = NonNull::new(data) {
            // Safety: The queue owned the item and releases it exactly once.
            drop(unsafe { T::from_ptr(ptr) });
        }
    });
}

/// A queue for passing items of type `T` between threads.
///
/// Besides the blocking and non-blocking operations on the queue itself, the queue can be
/// locked explicitly with [`lock`](Self::lock) to run several operations atomically.
/// Operations issued on the queue from the thread holding the explicit lock use the lock
/// instead of acquiring it again.
pub struct AsyncQueue<T: QueueItem> {
    glib: &'static Glib,
    handle: NativeHandle<GAsyncQueue>,
    owner: Mutex<Option<ThreadId>>,
    _phantom: PhantomData<T>,
}

// Safety: The native queue is synchronized, and items are `Send`.
unsafe impl<T: QueueItem> Send for AsyncQueue<T> {}

// Safety: See above.
unsafe impl<T: QueueItem> Sync for AsyncQueue<T> {}

impl<T: QueueItem> AsyncQueue<T> {
    /// Constructs an empty queue.
    pub fn new() -> Result<Self> {
        let glib = Glib::get()?;
        let destroy = destroy_item::<T> as unsafe extern "C" fn(gpointer);
        // Safety: The destroy notify releases items of type `T`.
        let ptr = unsafe { (glib.g_async_queue_new_full)(Some(destroy)) };
        // Safety: Returns a new reference.
        let handle = unsafe { NativeHandle::owned(ptr, glib.g_async_queue_unref) };
        if !handle.is_valid() {
            return Err(Error::NullReturn {
                symbol: "g_async_queue_new_full",
            });
        }
        Ok(Self {
            glib,
            handle,
            owner: Mutex::new(None),
            _phantom: PhantomData,
        })
    }

    fn raw(&self) -> *mut GAsyncQueue {
        self.handle.as_ptr()
    }

    fn is_held(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }

    /// Reclaims a popped item.
    fn take(data: gpointer) -> Option<T> {
        let ptr = NonNull::new(data)?;
        // Safety: Every item in the queue was produced by `T::into_ptr`, and popping
        // transferred it to us.
        Some(unsafe { T::from_ptr(ptr) })
    }

    fn push_with(&self, item: T, unlocked: bool) {
        let push = if unlocked {
            self.glib.g_async_queue_push_unlocked
        } else {
            self.glib.g_async_queue_push
        };
        // Safety: The queue takes ownership of the item.
        unsafe { push(self.raw(), item.into_ptr().as_ptr()) };
    }

    fn push_front_with(&self, item: T, unlocked: bool) {
        let push_front = if unlocked {
            self.glib.g_async_queue_push_front_unlocked
        } else {
            self.glib.g_async_queue_push_front
        };
        // Safety: The queue takes ownership of the item.
        unsafe { push_front(self.raw(), item.into_ptr().as_ptr()) };
    }

    fn pop_with(&self, unlocked: bool) -> T {
        let pop = if unlocked {
            self.glib.g_async_queue_pop_unlocked
        } else {
            self.glib.g_async_queue_pop
        };
        loop {
            // Safety: FFI call is safe.
            if let Some(item) = Self::take(unsafe { pop(self.raw()) }) {
                return item;
            }
        }
    }

    fn try_pop_with(&self, unlocked: bool) -> Option<T> {
        let try_pop = if unlocked {
            self.glib.g_async_queue_try_pop_unlocked
        } else {
            self.glib.g_async_queue_try_pop
        };
        // Safety: FFI call is safe.
        Self::take(unsafe { try_pop(self.raw()) })
    }

    fn timeout_pop_with(&self, timeout: Duration, unlocked: bool) -> Option<T> {
        let timeout_pop = if unlocked {
            self.glib.g_async_queue_timeout_pop_unlocked
        } else {
            self.glib.g_async_queue_timeout_pop
        };
        let micros = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX);
        // Safety: FFI call is safe.
        Self::take(unsafe { timeout_pop(self.raw(), micros) })
    }

    fn remove_with(&self, key: NonNull<c_void>, unlocked: bool) -> Option<T> {
        let remove = if unlocked {
            self.glib.g_async_queue_remove_unlocked
        } else {
            self.glib.g_async_queue_remove
        };
        // Safety: FFI call is safe.
        let removed = unsafe { remove(self.raw(), key.as_ptr()) };
        if !removed.get() {
            return None;
        }
        // Safety: The queue held the item identified by `key` and gave up its ownership.
        Some(unsafe { T::from_ptr(key) })
    }

    fn len_with(&self, unlocked: bool) -> usize {
        let length = if unlocked {
            self.glib.g_async_queue_length_unlocked
        } else {
            self.glib.g_async_queue_length
        };
        // Safety: FFI call is safe.
        let len = unsafe { length(self.raw()) };
        usize::try_from(len).unwrap_or(0)
    }

    /// Appends an item.
    pub fn push(&self, item: T) {
        self.push_with(item, self.is_held());
    }

    /// Prepends an item, so that it is popped next.
    pub fn push_front(&self, item: T) {
        self.push_front_with(item, self.is_held());
    }

    /// Removes the first item, blocking until one is available.
    pub fn pop(&self) -> T {
        self.pop_with(self.is_held())
    }

    /// Removes the first item, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.try_pop_with(self.is_held())
    }

    /// Removes the first item, waiting at most `timeout` for one to become available.
    pub fn timeout_pop(&self, timeout: Duration) -> Option<T> {
        self.timeout_pop_with(timeout, self.is_held())
    }

    /// Removes the item identified by `key` (see [`QueueItem::as_ptr`]), if it is queued.
    pub fn remove(&self, key: NonNull<c_void>) -> Option<T> {
        self.remove_with(key, self.is_held())
    }

    /// Returns the number of queued items.
    ///
    /// Threads blocked in [`pop`](Self::pop) count as negative items, so the result is zero
    /// while there are waiting threads.
    pub fn len(&self) -> usize {
        self.len_with(self.is_held())
    }

    /// Returns whether no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the queue until the returned guard is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds the lock.
    pub fn lock(&self) -> AsyncQueueGuard<'_, T> {
        assert!(!self.is_held(), "the queue is already locked by this thread");
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_async_queue_lock)(self.raw()) };
        *self.owner.lock() = Some(thread::current().id());
        AsyncQueueGuard {
            queue: self,
            _not_send: PhantomData,
        }
    }
}

impl<T: QueueItem> Debug for AsyncQueue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("handle", &self.handle)
            .field("owner", &*self.owner.lock())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a locked [`AsyncQueue`].
///
/// The queue is unlocked when the guard is dropped, on the thread that locked it.
pub struct AsyncQueueGuard<'a, T: QueueItem> {
    queue: &'a AsyncQueue<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T: QueueItem> AsyncQueueGuard<'_, T> {
    /// Appends an item.
    pub fn push(&self, item: T) {
        self.queue.push_with(item, true);
    }

    /// Prepends an item, so that it is popped next.
    pub fn push_front(&self, item: T) {
        self.queue.push_front_with(item, true);
    }

    /// Removes the first item, blocking until one is available.
    ///
    /// The lock is released while waiting.
    pub fn pop(&self) -> T {
        self.queue.pop_with(true)
    }

    /// Removes the first item, or returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.queue.try_pop_with(true)
    }

    /// Removes the first item, waiting at most `timeout` for one to become available.
    ///
    /// The lock is released while waiting.
    pub fn timeout_pop(&self, timeout: Duration) -> Option<T> {
        self.queue.timeout_pop_with(timeout, true)
    }

    /// Removes the item identified by `key`, if it is queued.
    pub fn remove(&self, key: NonNull<c_void>) -> Option<T> {
        self.queue.remove_with(key, true)
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.queue.len_with(true)
    }

    /// Returns whether no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: QueueItem> Drop for AsyncQueueGuard<'_, T> {
    fn drop(&mut self) {
        *self.queue.owner.lock() = None;
        // Safety: The queue is locked by this thread.
        unsafe { (self.queue.glib.g_async_queue_unlock)(self.queue.raw()) };
    }
}

impl<T: QueueItem> Debug for AsyncQueueGuard<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueueGuard")
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn boxes_round_trip() {
        let item = Box::new(42u64);
        let key = item.as_ptr();
        let ptr = item.into_ptr();
        assert_eq!(key, ptr);
        // Safety: `ptr` was produced by `into_ptr`.
        let item = unsafe { Box::<u64>::from_ptr(ptr) };
        assert_eq!(*item, 42);
    }

    #[test]
    fn integers_round_trip() {
        let value = NonZeroUsize::new(7).unwrap();
        let ptr = value.into_ptr();
        // Safety: `ptr` was produced by `into_ptr`.
        assert_eq!(unsafe { NonZeroUsize::from_ptr(ptr) }, value);
        assert_eq!(value.as_ptr(), ptr);
    }

    #[test]
    fn destroy_notify_drops_items() {
        struct Tracked(Arc<AtomicUsize>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let ptr = Box::new(Tracked(dropped.clone())).into_ptr();
        // Safety: `ptr` owns a boxed `Tracked`.
        unsafe { destroy_item::<Box<Tracked>>(ptr.as_ptr()) };
        // Safety: Null items are ignored.
        unsafe { destroy_item::<Box<Tracked>>(std::ptr::null_mut()) };
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
