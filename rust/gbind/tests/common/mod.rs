use gbind::Glib;

/// Returns the loaded library, or `None` if it is not installed on this machine.
pub fn glib() -> Option<&'static Glib> {
    match Glib::get() {
        Ok(glib) => Some(glib),
        Err(e) => {
            eprintln!("skipping test, GLib is not available: {e}");
            None
        }
    }
}

/// Returns early from the test if the native library can not be loaded.
#[allow(unused_macros)]
macro_rules! require_glib {
    () => {
        if common::glib().is_none() {
            return Ok(());
        }
    };
}
