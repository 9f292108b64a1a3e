//! Error handling.
//!
//! Fallible native calls report failures through an out-parameter error record
//! ([`ErrorRecord`]). The record names its error domain by a runtime identifier, which is
//! mapped to a typed [`NativeError`] by an [`ErrorDomainRegistry`]. Domain identifiers are
//! resolved lazily, on the first comparison against a record, and cached afterwards.

use crate::{
    bindings::{GError, Glib},
    handle::{NativeHandle, Unref},
    library::LoadError,
    marshal::string,
};
use std::{
    ffi::c_char,
    fmt::{self, Debug, Formatter},
    sync::OnceLock,
};

/// Error record written by fallible native calls, the layout of a `GError`.
#[repr(C)]
#[derive(Debug)]
pub struct ErrorRecord {
    pub domain: u32,
    pub code: i32,
    pub message: *mut c_char,
}

static_assertions::const_assert_eq!(std::mem::offset_of!(ErrorRecord, domain), 0);
static_assertions::const_assert_eq!(std::mem::offset_of!(ErrorRecord, code), 4);
static_assertions::const_assert_eq!(std::mem::offset_of!(ErrorRecord, message), 8);

/// Decoded contents of an [`ErrorRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorDescriptor {
    pub domain: u32,
    pub code: i32,
    pub message: String,
}

impl ErrorDescriptor {
    /// Copies the contents of `record`.
    ///
    /// Returns `None` if `record` is null or its domain is zero, both of which mean that no
    /// error occurred.
    ///
    /// # Safety
    ///
    /// `record` must be null or point to a live record whose message is null or a
    /// nul-terminated string.
    pub unsafe fn read(record: *const ErrorRecord) -> Option<Self> {
        if record.is_null() {
            return None;
        }
        // Safety: Upheld by the caller.
        let record = unsafe { &*record };
        if record.domain == 0 {
            return None;
        }
        // Safety: Upheld by the caller.
        let message = unsafe { string::from_borrowed(record.message) }.unwrap_or_default();
        Some(Self {
            domain: record.domain,
            code: record.code,
            message,
        })
    }
}

macro_rules! error_codes {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$code_meta:meta])* $code:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i32);

        impl $name {
            $($(#[$code_meta])* pub const $code: Self = Self($value);)*

            /// Returns the name of a known code.
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($code)),)*
                    _ => None,
                }
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }
    };
}

error_codes! {
    /// Codes of the bookmark file error domain.
    BookmarkFileErrorCode {
        INVALID_URI = 0,
        INVALID_VALUE = 1,
        APP_NOT_REGISTERED = 2,
        URI_NOT_FOUND = 3,
        READ = 4,
        UNKNOWN_ENCODING = 5,
        WRITE = 6,
        FILE_NOT_FOUND = 7,
    }
}

error_codes! {
    /// Codes of the file error domain, mirroring the `errno` values.
    FileErrorCode {
        EXIST = 0,
        ISDIR = 1,
        ACCES = 2,
        NAMETOOLONG = 3,
        NOENT = 4,
        NOTDIR = 5,
        NXIO = 6,
        NODEV = 7,
        ROFS = 8,
        TXTBSY = 9,
        FAULT = 10,
        LOOP = 11,
        NOSPC = 12,
        NOMEM = 13,
        MFILE = 14,
        NFILE = 15,
        BADF = 16,
        INVAL = 17,
        PIPE = 18,
        AGAIN = 19,
        INTR = 20,
        IO = 21,
        PERM = 22,
        NOSYS = 23,
        FAILED = 24,
    }
}

error_codes! {
    /// Codes of the markup error domain.
    MarkupErrorCode {
        BAD_UTF8 = 0,
        EMPTY = 1,
        PARSE = 2,
        UNKNOWN_ELEMENT = 3,
        UNKNOWN_ATTRIBUTE = 4,
        INVALID_CONTENT = 5,
        MISSING_ATTRIBUTE = 6,
    }
}

error_codes! {
    /// Codes of the character set conversion error domain.
    ConvertErrorCode {
        NO_CONVERSION = 0,
        ILLEGAL_SEQUENCE = 1,
        FAILED = 2,
        PARTIAL_INPUT = 3,
        BAD_URI = 4,
        NOT_ABSOLUTE_PATH = 5,
        NO_MEMORY = 6,
        EMBEDDED_NUL = 7,
    }
}

/// Typed error reported by the native library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum NativeError {
    #[error("bookmark file error {code:?}: {message}")]
    BookmarkFile {
        code: BookmarkFileErrorCode,
        message: String,
    },
    #[error("file error {code:?}: {message}")]
    File { code: FileErrorCode, message: String },
    #[error("markup error {code:?}: {message}")]
    Markup { code: MarkupErrorCode, message: String },
    #[error("conversion error {code:?}: {message}")]
    Convert { code: ConvertErrorCode, message: String },
    /// The error belongs to a domain that is not registered.
    #[error("error {} in unrecognized domain {}: {}", .0.code, .0.domain, .0.message)]
    Unrecognized(ErrorDescriptor),
}

impl NativeError {
    /// Returns the native error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::BookmarkFile { code, .. } => code.0,
            Self::File { code, .. } => code.0,
            Self::Markup { code, .. } => code.0,
            Self::Convert { code, .. } => code.0,
            Self::Unrecognized(descriptor) => descriptor.code,
        }
    }

    /// Returns the message of the error.
    pub fn message(&self) -> &str {
        match self {
            Self::BookmarkFile { message, .. }
            | Self::File { message, .. }
            | Self::Markup { message, .. }
            | Self::Convert { message, .. } => message,
            Self::Unrecognized(descriptor) => &descriptor.message,
        }
    }

    /// Returns the name of the error domain, or `None` if it is unrecognized.
    pub fn domain_name(&self) -> Option<&'static str> {
        match self {
            Self::BookmarkFile { .. } => Some(BOOKMARK_FILE_DOMAIN),
            Self::File { .. } => Some(FILE_DOMAIN),
            Self::Markup { .. } => Some(MARKUP_DOMAIN),
            Self::Convert { .. } => Some(CONVERT_DOMAIN),
            Self::Unrecognized(_) => None,
        }
    }
}

pub const BOOKMARK_FILE_DOMAIN: &str = "bookmark-file";
pub const FILE_DOMAIN: &str = "file";
pub const MARKUP_DOMAIN: &str = "markup";
pub const CONVERT_DOMAIN: &str = "convert";

/// Maps a descriptor of a matched domain to its typed error.
pub type DomainDecoder = fn(ErrorDescriptor) -> NativeError;

/// A registered error domain.
pub struct ErrorDomain {
    name: &'static str,
    id: OnceLock<u32>,
    resolve: Box<dyn Fn() -> u32 + Send + Sync>,
    decode: DomainDecoder,
}

impl ErrorDomain {
    /// Returns the name of the domain.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the domain identifier, resolving it on first use.
    pub fn id(&self) -> u32 {
        *self.id.get_or_init(|| {
            let id = (self.resolve)();
            tracing::trace!(domain = self.name, id, "resolved error domain");
            id
        })
    }

    /// Returns the identifier if it was already resolved.
    pub fn resolved_id(&self) -> Option<u32> {
        self.id.get().copied()
    }
}

impl Debug for ErrorDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDomain")
            .field("name", &self.name)
            .field("id", &self.id.get())
            .finish_non_exhaustive()
    }
}

/// Looks up the native name of a domain identifier.
pub type DomainNamer = Box<dyn Fn(u32) -> Option<String> + Send + Sync>;

/// Set of error domains known to the translator.
#[derive(Default)]
pub struct ErrorDomainRegistry {
    domains: Vec<ErrorDomain>,
    namer: Option<DomainNamer>,
}

impl ErrorDomainRegistry {
    /// Constructs an empty registry.
    pub const fn new() -> Self {
        Self {
            domains: Vec::new(),
            namer: None,
        }
    }

    /// Registers a domain.
    ///
    /// `resolve` is called at most once, the first time a record is compared against the
    /// domain. Domains are compared in registration order.
    pub fn register(
        mut self,
        name: &'static str,
        resolve: impl Fn() -> u32 + Send + Sync + 'static,
        decode: DomainDecoder,
    ) -> Self {
        self.domains.push(ErrorDomain {
            name,
            id: OnceLock::new(),
            resolve: Box::new(resolve),
            decode,
        });
        self
    }

    /// Sets the lookup used to name identifiers of unregistered domains.
    pub fn name_domains_with(
        mut self,
        namer: impl Fn(u32) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.namer = Some(Box::new(namer));
        self
    }

    /// Returns the name of the domain with identifier `id`.
    ///
    /// Registered domains are named by their registration. Other identifiers are named by
    /// the lookup set with [`name_domains_with`](Self::name_domains_with), if any.
    pub fn domain_name(&self, id: u32) -> Option<String> {
        match self.domains.iter().find(|domain| domain.id() == id) {
            Some(domain) => Some(domain.name.to_owned()),
            None => self.namer.as_ref().and_then(|namer| namer(id)),
        }
    }

    /// Returns the registered domains.
    pub fn domains(&self) -> &[ErrorDomain] {
        &self.domains
    }

    /// Returns the identifier of the domain `name`.
    pub fn domain_id(&self, name: &str) -> Option<u32> {
        self.domains
            .iter()
            .find(|domain| domain.name == name)
            .map(ErrorDomain::id)
    }

    /// Maps `descriptor` to the typed error of its domain.
    ///
    /// Descriptors of unregistered domains map to [`NativeError::Unrecognized`].
    pub fn translate(&self, descriptor: ErrorDescriptor) -> NativeError {
        match self
            .domains
            .iter()
            .find(|domain| domain.id() == descriptor.domain)
        {
            Some(domain) => (domain.decode)(descriptor),
            None => {
                let name = self.namer.as_ref().and_then(|namer| namer(descriptor.domain));
                tracing::warn!(
                    domain = descriptor.domain,
                    name = name.as_deref().unwrap_or("<unnamed>"),
                    code = descriptor.code,
                    message = %descriptor.message,
                    "native error in unrecognized domain"
                );
                NativeError::Unrecognized(descriptor)
            }
        }
    }

    /// Decodes an error record without taking ownership of it.
    ///
    /// Returns `None` if the record signals no error.
    ///
    /// # Safety
    ///
    /// See [`ErrorDescriptor::read`].
    pub unsafe fn decode(&self, record: *const ErrorRecord) -> Option<NativeError> {
        // Safety: Upheld by the caller.
        unsafe { ErrorDescriptor::read(record) }.map(|descriptor| self.translate(descriptor))
    }

    /// Decodes an error record owned by the caller and frees it with `free`.
    ///
    /// The record is freed exactly once, whether or not it signals an error. Null is ignored.
    ///
    /// # Safety
    ///
    /// `record` must be null or a live record owned by the caller, releasable with `free`.
    pub unsafe fn take(
        &self,
        record: *mut ErrorRecord,
        free: Unref<ErrorRecord>,
    ) -> Option<NativeError> {
        // Safety: Ownership of the record is transferred to the handle.
        let handle = unsafe { NativeHandle::owned(record, free) };
        let record = handle.try_as_ptr()?;
        // Safety: The record is live until the handle is dropped.
        unsafe { self.decode(record.as_ptr()) }
    }

    /// Constructs the registry of the GLib error domains.
    pub fn glib(glib: &'static Glib) -> Self {
        Self::new()
            .register(
                BOOKMARK_FILE_DOMAIN,
                // Safety: The quark accessors have no preconditions.
                move || unsafe { (glib.g_bookmark_file_error_quark)() },
                |d| NativeError::BookmarkFile {
                    code: BookmarkFileErrorCode(d.code),
                    message: d.message,
                },
            )
            .register(
                FILE_DOMAIN,
                // Safety: See above.
                move || unsafe { (glib.g_file_error_quark)() },
                |d| NativeError::File {
                    code: FileErrorCode(d.code),
                    message: d.message,
                },
            )
            .register(
                MARKUP_DOMAIN,
                // Safety: See above.
                move || unsafe { (glib.g_markup_error_quark)() },
                |d| NativeError::Markup {
                    code: MarkupErrorCode(d.code),
                    message: d.message,
                },
            )
            .register(
                CONVERT_DOMAIN,
                // Safety: See above.
                move || unsafe { (glib.g_convert_error_quark)() },
                |d| NativeError::Convert {
                    code: ConvertErrorCode(d.code),
                    message: d.message,
                },
            )
            .name_domains_with(move |id| {
                // Safety: Quark names are static strings, null for unknown quarks.
                unsafe { string::from_borrowed((glib.g_quark_to_string)(id)) }
            })
    }
}

impl Debug for ErrorDomainRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDomainRegistry")
            .field("domains", &self.domains)
            .field("named", &self.namer.is_some())
            .finish()
    }
}

static GLIB_DOMAINS: OnceLock<ErrorDomainRegistry> = OnceLock::new();

/// Returns the process-wide registry of the GLib error domains.
///
/// The registry is fixed. Calls that must recognize additional domains decode their
/// records with [`to_result_indirect_in`] and a registry of their own.
pub fn glib_domains(glib: &'static Glib) -> &'static ErrorDomainRegistry {
    GLIB_DOMAINS.get_or_init(|| ErrorDomainRegistry::glib(glib))
}

/// Error type of the crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The native library reported an error.
    #[error(transparent)]
    Native(#[from] NativeError),
    /// The native library could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("string contains a nul byte at position {position}")]
    InteriorNul { position: usize },
    #[error("length {len} exceeds the native length range")]
    LengthOverflow { len: usize },
    /// The loaded library version does not export an optional entry point.
    #[error("the loaded library does not export `{symbol}`")]
    Unsupported { symbol: &'static str },
    /// A constructor returned no object.
    #[error("`{symbol}` returned no object")]
    NullReturn { symbol: &'static str },
}

impl Error {
    /// Returns the native error, if this is one.
    pub fn as_native(&self) -> Option<&NativeError> {
        match self {
            Self::Native(err) => Some(err),
            _ => None,
        }
    }
}

/// A [`Result`] with an [`Error`] error type.
pub type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Constructs a [`Result`] by calling a closure that may write an error record.
///
/// This is useful when calling GLib functions that expect a writable `GError**` as one of
/// their arguments. A written record is decoded through the GLib error domains and freed
/// with `g_error_free`.
///
/// ```ignore
/// let ok = unsafe {
///     to_result_indirect(glib, |error| (glib.g_bookmark_file_to_file)(file, name, error))
/// }?;
/// ```
///
/// # Safety
///
/// `f` must leave the record null or point it to a record owned by the caller.
pub unsafe fn to_result_indirect<T>(
    glib: &'static Glib,
    f: impl FnOnce(&mut *mut GError) -> T,
) -> Result<T> {
    // Safety: Upheld by the caller.
    unsafe { to_result_indirect_in(glib_domains(glib), glib.g_error_free, f) }
}

/// Like [`to_result_indirect`], decoding the record through `registry` and freeing it
/// with `free`.
///
/// # Safety
///
/// `f` must leave the record null or point it to a record owned by the caller, releasable
/// with `free`.
pub unsafe fn to_result_indirect_in<T>(
    registry: &ErrorDomainRegistry,
    free: Unref<ErrorRecord>,
    f: impl FnOnce(&mut *mut ErrorRecord) -> T,
) -> Result<T> {
    let mut error = std::ptr::null_mut();
    let result = f(&mut error);
    // Safety: The record was written by `f` and is owned by us.
    match unsafe { registry.take(error, free) } {
        Some(err) => Err(err.into()),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        ffi::CString,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    const BOOKMARK_ID: u32 = 17;
    const FILE_ID: u32 = 42;

    fn registry(resolved: Arc<AtomicUsize>) -> ErrorDomainRegistry {
        let bookmark = resolved.clone();
        ErrorDomainRegistry::new()
            .register(
                BOOKMARK_FILE_DOMAIN,
                move || {
                    bookmark.fetch_add(1, Ordering::SeqCst);
                    BOOKMARK_ID
                },
                |d| NativeError::BookmarkFile {
                    code: BookmarkFileErrorCode(d.code),
                    message: d.message,
                },
            )
            .register(
                FILE_DOMAIN,
                move || {
                    resolved.fetch_add(1, Ordering::SeqCst);
                    FILE_ID
                },
                |d| NativeError::File {
                    code: FileErrorCode(d.code),
                    message: d.message,
                },
            )
    }

    thread_local! {
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    fn freed() -> usize {
        FREED.with(Cell::get)
    }

    unsafe extern "C" fn free_record(record: *mut ErrorRecord) {
        FREED.with(|freed| freed.set(freed.get() + 1));
        // Safety: Allocated by `new_record`.
        unsafe {
            drop(CString::from_raw((*record).message));
            libc::free(record.cast());
        }
    }

    fn new_record(domain: u32, code: i32, message: &str) -> *mut ErrorRecord {
        // Safety: Plain allocation.
        let record = unsafe { libc::malloc(size_of::<ErrorRecord>()) }.cast::<ErrorRecord>();
        assert!(!record.is_null());
        // Safety: `record` is a fresh allocation.
        unsafe {
            record.write(ErrorRecord {
                domain,
                code,
                message: CString::new(message).unwrap().into_raw(),
            })
        };
        record
    }

    #[test]
    fn known_domain() {
        let resolved = Arc::new(AtomicUsize::new(0));
        let registry = registry(resolved.clone());
        let record = new_record(FILE_ID, FileErrorCode::NOENT.0, "no such file");

        let before = freed();
        // Safety: The record is owned by us.
        let err = unsafe { registry.take(record, free_record) }.unwrap();
        assert_eq!(freed() - before, 1);

        assert_eq!(
            err,
            NativeError::File {
                code: FileErrorCode::NOENT,
                message: "no such file".into()
            }
        );
        assert_eq!(err.code(), 4);
        assert_eq!(err.domain_name(), Some(FILE_DOMAIN));
        assert_eq!(resolved.load(Ordering::SeqCst), 2);

        let record = new_record(BOOKMARK_ID, 3, "missing");
        // Safety: The record is owned by us.
        let err = unsafe { registry.take(record, free_record) }.unwrap();
        assert!(matches!(
            err,
            NativeError::BookmarkFile {
                code: BookmarkFileErrorCode::URI_NOT_FOUND,
                ..
            }
        ));
        assert_eq!(resolved.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn domains_resolve_lazily() {
        let resolved = Arc::new(AtomicUsize::new(0));
        let registry = registry(resolved.clone());
        assert_eq!(resolved.load(Ordering::SeqCst), 0);

        let record = new_record(BOOKMARK_ID, 0, "bad uri");
        // Safety: The record is owned by us.
        assert!(unsafe { registry.take(record, free_record) }.is_some());
        assert_eq!(resolved.load(Ordering::SeqCst), 1);
        assert_eq!(registry.domains()[1].resolved_id(), None);
        assert_eq!(registry.domain_id(FILE_DOMAIN), Some(FILE_ID));
        assert_eq!(registry.domain_id("unknown"), None);
    }

    #[test]
    fn unknown_domain() {
        let registry = registry(Arc::default());
        let record = new_record(9000, 12, "who knows");
        // Safety: The record is owned by us.
        let err = unsafe { registry.take(record, free_record) }.unwrap();
        assert_eq!(
            err,
            NativeError::Unrecognized(ErrorDescriptor {
                domain: 9000,
                code: 12,
                message: "who knows".into()
            })
        );
        assert_eq!(err.domain_name(), None);
        assert_eq!(err.message(), "who knows");
    }

    #[test]
    fn no_error_sentinels() {
        let registry = registry(Arc::default());
        // Safety: Null is allowed.
        assert!(unsafe { registry.take(std::ptr::null_mut(), free_record) }.is_none());

        let before = freed();
        let record = new_record(0, 5, "");
        // Safety: The record is owned by us.
        assert!(unsafe { registry.take(record, free_record) }.is_none());
        assert_eq!(freed() - before, 1);
    }

    #[test]
    fn message_outlives_record() {
        let registry = registry(Arc::default());
        let record = new_record(FILE_ID, 0, "exists");
        // Safety: The record is live.
        let err = unsafe { registry.decode(record) }.unwrap();
        // Safety: The record is owned by us.
        unsafe { free_record(record) };
        assert_eq!(err.message(), "exists");
    }

    #[test]
    fn unregistered_domains_are_named_by_lookup() {
        let registry =
            registry(Arc::default()).name_domains_with(|id| (id == 9000).then(|| "g-io".into()));
        assert_eq!(registry.domain_name(FILE_ID).as_deref(), Some(FILE_DOMAIN));
        assert_eq!(registry.domain_name(9000).as_deref(), Some("g-io"));
        assert_eq!(registry.domain_name(9001), None);
        assert_eq!(ErrorDomainRegistry::new().domain_name(9000), None);

        let record = new_record(9000, 1, "io");
        // Safety: The record is owned by us.
        let err = unsafe { registry.take(record, free_record) }.unwrap();
        assert!(matches!(err, NativeError::Unrecognized(ref d) if d.domain == 9000));
    }

    #[test]
    fn indirect_results_use_the_given_registry() {
        const CONVERT_ID: u32 = 7;
        let registry = ErrorDomainRegistry::new().register(
            CONVERT_DOMAIN,
            || CONVERT_ID,
            |d| NativeError::Convert {
                code: ConvertErrorCode(d.code),
                message: d.message,
            },
        );

        let before = freed();
        // Safety: The record is owned by us and freed with `free_record`.
        let result = unsafe {
            to_result_indirect_in(&registry, free_record, |error| {
                *error = new_record(CONVERT_ID, ConvertErrorCode::ILLEGAL_SEQUENCE.0, "bad");
                5
            })
        };
        assert_eq!(freed() - before, 1);
        match result {
            Err(Error::Native(NativeError::Convert { code, message })) => {
                assert_eq!(code, ConvertErrorCode::ILLEGAL_SEQUENCE);
                assert_eq!(message, "bad");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // Safety: No record is written.
        let result = unsafe { to_result_indirect_in(&registry, free_record, |_| 5) };
        assert_eq!(result.ok(), Some(5));
    }

    #[test]
    fn codes_format_by_name() {
        assert_eq!(format!("{:?}", FileErrorCode::NOENT), "NOENT");
        assert_eq!(format!("{:?}", MarkupErrorCode(99)), "MarkupErrorCode(99)");
        assert_eq!(ConvertErrorCode::EMBEDDED_NUL.name(), Some("EMBEDDED_NUL"));
    }
}
