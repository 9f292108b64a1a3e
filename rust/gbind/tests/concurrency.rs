use gbind::{
    queue::{AsyncQueue, QueueItem},
    sync::{Cond, Mutex},
    Result,
};
use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

#[macro_use]
mod common;

fn item(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).expect("non-zero")
}

#[test]
fn fifo_order() -> Result {
    require_glib!();

    let queue = AsyncQueue::new()?;
    queue.push(item(1));
    queue.push(item(2));
    queue.push_front(item(3));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.pop(), item(3));
    assert_eq!(queue.try_pop(), Some(item(1)));
    assert_eq!(queue.timeout_pop(Duration::from_millis(10)), Some(item(2)));
    assert_eq!(queue.try_pop(), None);
    assert!(queue.is_empty());
    Ok(())
}

#[test]
fn bounded_wait_on_empty_queue() -> Result {
    require_glib!();

    let queue = AsyncQueue::<Box<u32>>::new()?;
    let start = Instant::now();
    assert!(queue.timeout_pop(Duration::from_millis(20)).is_none());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(15), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    Ok(())
}

#[test]
fn remove_by_key() -> Result {
    require_glib!();

    let queue = AsyncQueue::new()?;
    let boxed = Box::new(String::from("second"));
    let key = QueueItem::as_ptr(&boxed);
    queue.push(Box::new(String::from("first")));
    queue.push(boxed);

    let removed = queue.remove(key).expect("the item is queued");
    assert_eq!(*removed, "second");
    assert!(queue.remove(key).is_none());
    assert_eq!(queue.len(), 1);
    Ok(())
}

#[test]
fn remaining_items_are_dropped_with_the_queue() -> Result {
    require_glib!();

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicUsize::new(0));
    let queue = AsyncQueue::new()?;
    for _ in 0..3 {
        queue.push(Box::new(Tracked(dropped.clone())));
    }
    drop(queue.pop());
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    drop(queue);
    assert_eq!(dropped.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn producers_and_consumer() -> Result {
    require_glib!();

    const PER_PRODUCER: usize = 100;
    let queue = Arc::new(AsyncQueue::new()?);
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 1..=PER_PRODUCER {
                    queue.push(item(i));
                }
            })
        })
        .collect();

    let total: usize = (0..4 * PER_PRODUCER).map(|_| queue.pop().get()).sum();
    for producer in producers {
        producer.join().expect("producer panicked");
    }
    assert_eq!(total, 4 * PER_PRODUCER * (PER_PRODUCER + 1) / 2);
    assert!(queue.is_empty());
    Ok(())
}

#[test]
fn explicit_lock() -> Result {
    require_glib!();

    let queue = AsyncQueue::new()?;
    {
        let guard = queue.lock();
        guard.push(item(1));
        // Operations on the queue itself reuse the held lock.
        queue.push(item(2));
        assert_eq!(guard.len(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(guard.try_pop(), Some(item(1)));
    }
    assert_eq!(queue.try_pop(), Some(item(2)));
    Ok(())
}

#[test]
fn mutex_across_threads() -> Result {
    require_glib!();

    let counter = Arc::new(Mutex::new(0usize)?);
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    assert_eq!(*counter.lock(), 4000);

    let guard = counter.lock();
    let contended = thread::scope(|s| s.spawn(|| counter.try_lock().is_none()).join());
    assert!(contended.expect("worker panicked"));
    drop(guard);
    assert!(counter.try_lock().is_some());
    Ok(())
}

#[test]
fn failed_try_lock_leaves_the_holder_locked() -> Result {
    require_glib!();

    let mutex = Mutex::new(0u32)?;
    let mut guard = mutex.lock();
    thread::scope(|s| {
        s.spawn(|| {
            assert!(mutex.try_lock().is_none());
            assert!(mutex.try_lock().is_none());
        })
        .join()
        .expect("contender panicked");
    });
    *guard += 1;
    drop(guard);

    let acquired = thread::scope(|s| s.spawn(|| mutex.try_lock().map(|v| *v)).join());
    assert_eq!(acquired.expect("contender panicked"), Some(1));
    Ok(())
}

#[test]
#[allow(clippy::mem_forget)]
fn dropping_a_mutex_with_a_leaked_guard() -> Result {
    require_glib!();

    let mutex = Mutex::new(String::from("locked"))?;
    std::mem::forget(mutex.lock());
    drop(mutex);

    let mutex = Mutex::new(0u8)?;
    let cond = Cond::new()?;
    let mut guard = mutex.lock();
    cond.wait_timeout(&mut guard, Duration::from_millis(1));
    std::mem::forget(guard);
    drop(mutex);
    Ok(())
}

#[test]
fn cond_signalling() -> Result {
    require_glib!();

    let state = Arc::new((Mutex::new(false)?, Cond::new()?));
    let waiter = {
        let state = state.clone();
        thread::spawn(move || {
            let (ready, cond) = &*state;
            let mut guard = ready.lock();
            while !*guard {
                cond.wait(&mut guard);
            }
        })
    };

    {
        let (ready, cond) = &*state;
        *ready.lock() = true;
        cond.broadcast();
    }
    waiter.join().expect("waiter panicked");

    let (ready, cond) = &*state;
    let mut guard = ready.lock();
    assert!(!cond.wait_timeout(&mut guard, Duration::from_millis(10)));
    assert!(*guard);
    Ok(())
}
