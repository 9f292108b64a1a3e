//! Raw bindings to GLib.
//!
//! The entry points are resolved at runtime from the binary selected by the
//! [`library`](crate::library) resolver, so the crate has no link-time dependency on GLib.
#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]

use crate::marshal::NativeBool;
use std::{
    ffi::{c_char, c_double, c_int, c_uint, c_void},
    marker::{PhantomData, PhantomPinned},
};

pub type gpointer = *mut c_void;
pub type gconstpointer = *const c_void;
pub type gchar = c_char;
pub type guchar = u8;
pub type guint8 = u8;
pub type gint = c_int;
pub type guint = c_uint;
pub type gint32 = i32;
pub type gint64 = i64;
pub type guint64 = u64;
pub type gsize = usize;
pub type gssize = isize;
pub type gdouble = c_double;
pub type gboolean = NativeBool<c_int>;
pub type GQuark = u32;
pub type GTimeSpan = gint64;
pub type GDestroyNotify = Option<unsafe extern "C" fn(data: gpointer)>;

/// `GError`, the error record filled by fallible GLib calls.
pub type GError = crate::error::ErrorRecord;

macro_rules! opaque_types {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque_types! {
    /// Immutable, reference counted point in time.
    GDateTime,
    /// Immutable, reference counted time zone.
    GTimeZone,
    /// Desktop bookmark collection.
    GBookmarkFile,
    /// Incremental checksum state.
    GChecksum,
    /// Reference counted, thread safe queue.
    GAsyncQueue,
    /// Immutable, reference counted byte buffer.
    GBytes,
    /// Reference counted memory mapping of a file.
    GMappedFile,
}

/// Storage of a `GMutex`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union GMutex {
    pub p: gpointer,
    pub i: [guint; 2],
}

/// Storage of a `GCond`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GCond {
    pub p: gpointer,
    pub i: [guint; 2],
}

static_assertions::assert_eq_size!(GMutex, u64);
static_assertions::const_assert!(size_of::<GCond>() >= size_of::<gpointer>() + 8);

/// `GChecksumType`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GChecksumType(pub c_int);

impl GChecksumType {
    pub const G_CHECKSUM_MD5: Self = Self(0);
    pub const G_CHECKSUM_SHA1: Self = Self(1);
    pub const G_CHECKSUM_SHA256: Self = Self(2);
    pub const G_CHECKSUM_SHA512: Self = Self(3);
    pub const G_CHECKSUM_SHA384: Self = Self(4);
}

/// `GTimeType`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GTimeType(pub c_int);

impl GTimeType {
    pub const G_TIME_TYPE_STANDARD: Self = Self(0);
    pub const G_TIME_TYPE_DAYLIGHT: Self = Self(1);
    pub const G_TIME_TYPE_UNIVERSAL: Self = Self(2);
}

/// Declares a table of native entry points resolved from a loaded library.
///
/// Entries in the `required` block must be exported by the library, otherwise loading fails.
/// Entries in the `optional` block are `None` when the loaded version does not export them.
macro_rules! native_library {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            required {
                $(fn $req:ident($($req_arg:ident: $req_ty:ty),* $(,)?) $(-> $req_ret:ty)?;)*
            }
            optional {
                $(fn $opt:ident($($opt_arg:ident: $opt_ty:ty),* $(,)?) $(-> $opt_ret:ty)?;)*
            }
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            library: libloading::Library,
            $(pub $req: unsafe extern "C" fn($($req_arg: $req_ty),*) $(-> $req_ret)?,)*
            $(pub $opt: Option<unsafe extern "C" fn($($opt_arg: $opt_ty),*) $(-> $opt_ret)?>,)*
        }

        impl $name {
            /// Resolves all entry points from `library`.
            ///
            /// # Safety
            ///
            /// `library` must be a build of the library whose entry points match the declared
            /// signatures.
            pub unsafe fn from_library(
                library: libloading::Library,
            ) -> Result<Self, libloading::Error> {
                $(
                    // Safety: The signature is upheld by the caller.
                    let $req = unsafe {
                        *library.get::<unsafe extern "C" fn($($req_ty),*) $(-> $req_ret)?>(
                            concat!(stringify!($req), "\0").as_bytes(),
                        )?
                    };
                )*
                $(
                    // Safety: The signature is upheld by the caller.
                    let $opt = unsafe {
                        library
                            .get::<unsafe extern "C" fn($($opt_ty),*) $(-> $opt_ret)?>(
                                concat!(stringify!($opt), "\0").as_bytes(),
                            )
                            .ok()
                            .map(|symbol| *symbol)
                    };
                )*
                Ok(Self {
                    library,
                    $($req,)*
                    $($opt,)*
                })
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("library", &self.library)
                    .finish_non_exhaustive()
            }
        }
    };
}

native_library! {
    /// Entry points of GLib used by this crate.
    pub struct Glib {
        required {
            fn g_malloc(n_bytes: gsize) -> gpointer;
            fn g_malloc0(n_bytes: gsize) -> gpointer;
            fn g_free(mem: gpointer);
            fn g_error_free(error: *mut GError);
            fn g_quark_to_string(quark: GQuark) -> *const gchar;
            fn g_get_monotonic_time() -> gint64;

            fn g_bookmark_file_error_quark() -> GQuark;
            fn g_file_error_quark() -> GQuark;
            fn g_markup_error_quark() -> GQuark;
            fn g_convert_error_quark() -> GQuark;

            fn g_time_zone_new_utc() -> *mut GTimeZone;
            fn g_time_zone_new_local() -> *mut GTimeZone;
            fn g_time_zone_new(identifier: *const gchar) -> *mut GTimeZone;
            fn g_time_zone_ref(tz: *mut GTimeZone) -> *mut GTimeZone;
            fn g_time_zone_unref(tz: *mut GTimeZone);
            fn g_time_zone_find_interval(
                tz: *mut GTimeZone,
                type_: GTimeType,
                time_: gint64,
            ) -> gint;
            fn g_time_zone_get_abbreviation(tz: *mut GTimeZone, interval: gint) -> *const gchar;
            fn g_time_zone_get_offset(tz: *mut GTimeZone, interval: gint) -> gint32;
            fn g_time_zone_is_dst(tz: *mut GTimeZone, interval: gint) -> gboolean;

            fn g_date_time_new_now_local() -> *mut GDateTime;
            fn g_date_time_new_now_utc() -> *mut GDateTime;
            fn g_date_time_new_now(tz: *mut GTimeZone) -> *mut GDateTime;
            fn g_date_time_new_from_unix_utc(t: gint64) -> *mut GDateTime;
            fn g_date_time_new(
                tz: *mut GTimeZone,
                year: gint,
                month: gint,
                day: gint,
                hour: gint,
                minute: gint,
                seconds: gdouble,
            ) -> *mut GDateTime;
            fn g_date_time_new_from_iso8601(
                text: *const gchar,
                default_tz: *mut GTimeZone,
            ) -> *mut GDateTime;
            fn g_date_time_ref(datetime: *mut GDateTime) -> *mut GDateTime;
            fn g_date_time_unref(datetime: *mut GDateTime);
            fn g_date_time_add_seconds(
                datetime: *mut GDateTime,
                seconds: gdouble,
            ) -> *mut GDateTime;
            fn g_date_time_add_days(datetime: *mut GDateTime, days: gint) -> *mut GDateTime;
            fn g_date_time_add_months(datetime: *mut GDateTime, months: gint) -> *mut GDateTime;
            fn g_date_time_add_years(datetime: *mut GDateTime, years: gint) -> *mut GDateTime;
            fn g_date_time_difference(end: *mut GDateTime, begin: *mut GDateTime) -> GTimeSpan;
            fn g_date_time_compare(dt1: gconstpointer, dt2: gconstpointer) -> gint;
            fn g_date_time_equal(dt1: gconstpointer, dt2: gconstpointer) -> gboolean;
            fn g_date_time_hash(datetime: gconstpointer) -> guint;
            fn g_date_time_to_unix(datetime: *mut GDateTime) -> gint64;
            fn g_date_time_get_year(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_month(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_day_of_month(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_day_of_week(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_day_of_year(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_hour(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_minute(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_second(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_microsecond(datetime: *mut GDateTime) -> gint;
            fn g_date_time_get_utc_offset(datetime: *mut GDateTime) -> GTimeSpan;
            fn g_date_time_get_timezone_abbreviation(datetime: *mut GDateTime) -> *const gchar;
            fn g_date_time_is_daylight_savings(datetime: *mut GDateTime) -> gboolean;
            fn g_date_time_to_timezone(
                datetime: *mut GDateTime,
                tz: *mut GTimeZone,
            ) -> *mut GDateTime;
            fn g_date_time_to_local(datetime: *mut GDateTime) -> *mut GDateTime;
            fn g_date_time_to_utc(datetime: *mut GDateTime) -> *mut GDateTime;
            fn g_date_time_format(datetime: *mut GDateTime, format: *const gchar) -> *mut gchar;

            fn g_bookmark_file_new() -> *mut GBookmarkFile;
            fn g_bookmark_file_free(bookmark: *mut GBookmarkFile);
            fn g_bookmark_file_load_from_data(
                bookmark: *mut GBookmarkFile,
                data: *const gchar,
                length: gsize,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_load_from_file(
                bookmark: *mut GBookmarkFile,
                filename: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_to_data(
                bookmark: *mut GBookmarkFile,
                length: *mut gsize,
                error: *mut *mut GError,
            ) -> *mut gchar;
            fn g_bookmark_file_to_file(
                bookmark: *mut GBookmarkFile,
                filename: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_has_item(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
            ) -> gboolean;
            fn g_bookmark_file_remove_item(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_move_item(
                bookmark: *mut GBookmarkFile,
                old_uri: *const gchar,
                new_uri: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_get_size(bookmark: *mut GBookmarkFile) -> gint;
            fn g_bookmark_file_get_uris(
                bookmark: *mut GBookmarkFile,
                length: *mut gsize,
            ) -> *mut *mut gchar;
            fn g_bookmark_file_set_title(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                title: *const gchar,
            );
            fn g_bookmark_file_get_title(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                error: *mut *mut GError,
            ) -> *mut gchar;
            fn g_bookmark_file_set_description(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                description: *const gchar,
            );
            fn g_bookmark_file_get_description(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                error: *mut *mut GError,
            ) -> *mut gchar;
            fn g_bookmark_file_set_mime_type(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                mime_type: *const gchar,
            );
            fn g_bookmark_file_get_mime_type(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                error: *mut *mut GError,
            ) -> *mut gchar;
            fn g_bookmark_file_add_group(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                group: *const gchar,
            );
            fn g_bookmark_file_has_group(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                group: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;
            fn g_bookmark_file_get_groups(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                length: *mut gsize,
                error: *mut *mut GError,
            ) -> *mut *mut gchar;
            fn g_bookmark_file_set_groups(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                groups: *const *const gchar,
                length: gsize,
            );
            fn g_bookmark_file_add_application(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                name: *const gchar,
                exec: *const gchar,
            );
            fn g_bookmark_file_get_applications(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                length: *mut gsize,
                error: *mut *mut GError,
            ) -> *mut *mut gchar;
            fn g_bookmark_file_set_is_private(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                is_private: gboolean,
            );
            fn g_bookmark_file_get_is_private(
                bookmark: *mut GBookmarkFile,
                uri: *const gchar,
                error: *mut *mut GError,
            ) -> gboolean;

            fn g_checksum_type_get_length(checksum_type: GChecksumType) -> gssize;
            fn g_checksum_new(checksum_type: GChecksumType) -> *mut GChecksum;
            fn g_checksum_copy(checksum: *const GChecksum) -> *mut GChecksum;
            fn g_checksum_free(checksum: *mut GChecksum);
            fn g_checksum_reset(checksum: *mut GChecksum);
            fn g_checksum_update(checksum: *mut GChecksum, data: *const guchar, length: gssize);
            fn g_checksum_get_string(checksum: *mut GChecksum) -> *const gchar;
            fn g_checksum_get_digest(
                checksum: *mut GChecksum,
                buffer: *mut guint8,
                digest_len: *mut gsize,
            );
            fn g_compute_checksum_for_data(
                checksum_type: GChecksumType,
                data: *const guchar,
                length: gsize,
            ) -> *mut gchar;
            fn g_compute_checksum_for_bytes(
                checksum_type: GChecksumType,
                data: *mut GBytes,
            ) -> *mut gchar;

            fn g_async_queue_new_full(item_free_func: GDestroyNotify) -> *mut GAsyncQueue;
            fn g_async_queue_unref(queue: *mut GAsyncQueue);
            fn g_async_queue_lock(queue: *mut GAsyncQueue);
            fn g_async_queue_unlock(queue: *mut GAsyncQueue);
            fn g_async_queue_push(queue: *mut GAsyncQueue, data: gpointer);
            fn g_async_queue_push_unlocked(queue: *mut GAsyncQueue, data: gpointer);
            fn g_async_queue_push_front(queue: *mut GAsyncQueue, item: gpointer);
            fn g_async_queue_push_front_unlocked(queue: *mut GAsyncQueue, item: gpointer);
            fn g_async_queue_pop(queue: *mut GAsyncQueue) -> gpointer;
            fn g_async_queue_pop_unlocked(queue: *mut GAsyncQueue) -> gpointer;
            fn g_async_queue_try_pop(queue: *mut GAsyncQueue) -> gpointer;
            fn g_async_queue_try_pop_unlocked(queue: *mut GAsyncQueue) -> gpointer;
            fn g_async_queue_timeout_pop(queue: *mut GAsyncQueue, timeout: guint64) -> gpointer;
            fn g_async_queue_timeout_pop_unlocked(
                queue: *mut GAsyncQueue,
                timeout: guint64,
            ) -> gpointer;
            fn g_async_queue_remove(queue: *mut GAsyncQueue, item: gpointer) -> gboolean;
            fn g_async_queue_remove_unlocked(queue: *mut GAsyncQueue, item: gpointer) -> gboolean;
            fn g_async_queue_length(queue: *mut GAsyncQueue) -> gint;
            fn g_async_queue_length_unlocked(queue: *mut GAsyncQueue) -> gint;

            fn g_mutex_init(mutex: *mut GMutex);
            fn g_mutex_clear(mutex: *mut GMutex);
            fn g_mutex_lock(mutex: *mut GMutex);
            fn g_mutex_trylock(mutex: *mut GMutex) -> gboolean;
            fn g_mutex_unlock(mutex: *mut GMutex);
            fn g_cond_init(cond: *mut GCond);
            fn g_cond_clear(cond: *mut GCond);
            fn g_cond_wait(cond: *mut GCond, mutex: *mut GMutex);
            fn g_cond_wait_until(
                cond: *mut GCond,
                mutex: *mut GMutex,
                end_time: gint64,
            ) -> gboolean;
            fn g_cond_signal(cond: *mut GCond);
            fn g_cond_broadcast(cond: *mut GCond);

            fn g_bytes_new(data: gconstpointer, size: gsize) -> *mut GBytes;
            fn g_bytes_new_with_free_func(
                data: gconstpointer,
                size: gsize,
                free_func: GDestroyNotify,
                user_data: gpointer,
            ) -> *mut GBytes;
            fn g_bytes_new_from_bytes(
                bytes: *mut GBytes,
                offset: gsize,
                length: gsize,
            ) -> *mut GBytes;
            fn g_bytes_get_data(bytes: *mut GBytes, size: *mut gsize) -> gconstpointer;
            fn g_bytes_get_size(bytes: *mut GBytes) -> gsize;
            fn g_bytes_ref(bytes: *mut GBytes) -> *mut GBytes;
            fn g_bytes_unref(bytes: *mut GBytes);
            fn g_bytes_unref_to_data(bytes: *mut GBytes, size: *mut gsize) -> gpointer;
            fn g_bytes_equal(bytes1: gconstpointer, bytes2: gconstpointer) -> gboolean;
            fn g_bytes_compare(bytes1: gconstpointer, bytes2: gconstpointer) -> gint;
            fn g_bytes_hash(bytes: gconstpointer) -> guint;

            fn g_mapped_file_new(
                filename: *const gchar,
                writable: gboolean,
                error: *mut *mut GError,
            ) -> *mut GMappedFile;
            fn g_mapped_file_get_length(file: *mut GMappedFile) -> gsize;
            fn g_mapped_file_get_contents(file: *mut GMappedFile) -> *mut gchar;
            fn g_mapped_file_get_bytes(file: *mut GMappedFile) -> *mut GBytes;
            fn g_mapped_file_ref(file: *mut GMappedFile) -> *mut GMappedFile;
            fn g_mapped_file_unref(file: *mut GMappedFile);
        }
        optional {
            fn g_time_zone_new_identifier(identifier: *const gchar) -> *mut GTimeZone;
            fn g_time_zone_new_offset(seconds: gint32) -> *mut GTimeZone;
            fn g_time_zone_get_identifier(tz: *mut GTimeZone) -> *const gchar;
            fn g_date_time_get_timezone(datetime: *mut GDateTime) -> *mut GTimeZone;
            fn g_date_time_format_iso8601(datetime: *mut GDateTime) -> *mut gchar;
        }
    }
}
