//! Panic utilities.
//!
//! Rust panics must not unwind into native frames. Every `extern "C"` function handed to the
//! native side runs its body through [`abort_on_panic`].

use std::panic::AssertUnwindSafe;

/// Invokes a closure, aborting the process if a panic occurs.
pub fn abort_on_panic<R>(f: impl FnOnce() -> R) -> R {
    std::panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|e| {
        let message = panic_message(&*e);
        tracing::error!(panic = message, "panic in a native callback, aborting");
        std::process::abort()
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_values() {
        assert_eq!(abort_on_panic(|| 5), 5);
    }

    #[test]
    fn extracts_messages() {
        let payload = std::panic::catch_unwind(|| panic!("callback {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*payload), "callback 7");
        let payload = std::panic::catch_unwind(|| std::panic::panic_any(3u8)).unwrap_err();
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}
