//! Resolution and loading of the native library.
//!
//! A logical library name (e.g. `"glib"`) is mapped to the binary name of the running OS
//! family through a [`ResolverTable`]. The table is installed once per process as the global
//! load hook with [`install`]; the first call to [`Glib::get`] consults it and loads the
//! library. Lookup misses never fail: the logical name is then handed to the dynamic loader
//! unchanged.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

pub use crate::bindings::Glib;

/// Logical name of GLib.
pub const GLIB: &str = "glib";

/// Operating system families with distinct shared library naming schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OsFamily {
    /// `*.dll`.
    Windows,
    /// `*.dylib`.
    MacOs,
    /// Linux and the BSDs, `*.so` with a version suffix.
    Unix,
}

impl OsFamily {
    /// Returns the family of the running OS, if it is one of the mapped families.
    pub const fn current() -> Option<Self> {
        if cfg!(windows) {
            Some(Self::Windows)
        } else if cfg!(target_vendor = "apple") {
            Some(Self::MacOs)
        } else if cfg!(unix) {
            Some(Self::Unix)
        } else {
            None
        }
    }
}

/// Mapping of one logical library name to its per-OS binary names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryName {
    pub logical: &'static str,
    pub windows: Option<&'static str>,
    pub macos: Option<&'static str>,
    pub unix: Option<&'static str>,
}

impl LibraryName {
    /// Returns the binary name for `family`, if one is mapped.
    pub const fn for_family(&self, family: OsFamily) -> Option<&'static str> {
        match family {
            OsFamily::Windows => self.windows,
            OsFamily::MacOs => self.macos,
            OsFamily::Unix => self.unix,
        }
    }
}

/// Binary names of GLib 2.x.
pub const GLIB_NAME: LibraryName = LibraryName {
    logical: GLIB,
    windows: Some("libglib-2.0-0.dll"),
    macos: Some("libglib-2.0.0.dylib"),
    unix: Some("libglib-2.0.so.0"),
};

/// Table of logical library names and their platform binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverTable {
    entries: Vec<LibraryName>,
}

impl ResolverTable {
    /// Constructs an empty table.
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an entry to the table.
    ///
    /// Entries are matched in insertion order, so an earlier entry for the same logical name
    /// takes precedence.
    pub fn with(mut self, name: LibraryName) -> Self {
        self.entries.push(name);
        self
    }

    /// Returns the mapped entries.
    pub fn entries(&self) -> &[LibraryName] {
        &self.entries
    }

    /// Resolves `logical` for the OS family `family`.
    ///
    /// Returns the first matching binary name, or `logical` itself if the name is unknown or
    /// the family is unmapped.
    pub fn resolve<'a>(&self, logical: &'a str, family: Option<OsFamily>) -> &'a str {
        let Some(family) = family else {
            return logical;
        };
        self.entries
            .iter()
            .filter(|entry| entry.logical == logical)
            .find_map(|entry| entry.for_family(family))
            .unwrap_or(logical)
    }

    /// Resolves `logical` for the running OS family.
    pub fn resolve_current<'a>(&self, logical: &'a str) -> &'a str {
        self.resolve(logical, OsFamily::current())
    }
}

impl Default for ResolverTable {
    fn default() -> Self {
        Self::empty().with(GLIB_NAME)
    }
}

static RESOLVER: OnceLock<ResolverTable> = OnceLock::new();

/// Installs `table` as the process-wide resolver.
///
/// Only the first installation takes effect. Returns `true` if `table` was installed, and
/// `false` if a resolver was already in place, in which case the installed resolver is left
/// untouched.
pub fn install(table: ResolverTable) -> bool {
    let mut installed = false;
    RESOLVER.get_or_init(|| {
        installed = true;
        table
    });
    if installed {
        tracing::debug!("installed native library resolver");
    } else {
        tracing::trace!("native library resolver already installed");
    }
    installed
}

/// Returns the installed resolver, installing the default table if none was installed.
pub fn resolver() -> &'static ResolverTable {
    RESOLVER.get_or_init(ResolverTable::default)
}

/// Error raised by the dynamic loader.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The binary could not be opened.
    #[error("could not load `{logical}` from `{binary}`")]
    Open {
        logical: String,
        binary: String,
        #[source]
        source: Arc<libloading::Error>,
    },
    /// A required entry point is not exported by the binary.
    #[error("`{binary}` does not export a required entry point")]
    Symbol {
        binary: String,
        #[source]
        source: Arc<libloading::Error>,
    },
}

/// Opens the binary `logical` resolves to through the installed resolver.
pub fn open(logical: &str) -> Result<(String, libloading::Library), LoadError> {
    let binary = resolver().resolve_current(logical);
    tracing::debug!(logical, binary, "loading native library");

    // Safety: Loading GLib runs no initialization routines with preconditions on the caller.
    match unsafe { libloading::Library::new(binary) } {
        Ok(library) => Ok((binary.to_string(), library)),
        Err(source) => {
            tracing::warn!(logical, binary, error = %source, "failed to load native library");
            Err(LoadError::Open {
                logical: logical.to_string(),
                binary: binary.to_string(),
                source: Arc::new(source),
            })
        }
    }
}

static GLIB_LIBRARY: OnceLock<Result<Glib, LoadError>> = OnceLock::new();

impl Glib {
    /// Returns the process-wide GLib instance, loading it on first use.
    ///
    /// The outcome of the first load attempt, successful or not, is cached for the lifetime
    /// of the process.
    pub fn get() -> Result<&'static Self, LoadError> {
        GLIB_LIBRARY.get_or_init(Self::load).as_ref().map_err(Clone::clone)
    }

    /// Returns the process-wide GLib instance.
    ///
    /// # Panics
    ///
    /// Panics if GLib was not loaded successfully. Only code that already obtained a native
    /// GLib object through this crate may rely on this.
    #[track_caller]
    pub fn loaded() -> &'static Self {
        match GLIB_LIBRARY.get() {
            Some(Ok(glib)) => glib,
            _ => panic!("GLib has not been loaded"),
        }
    }

    fn load() -> Result<Self, LoadError> {
        let (binary, library) = open(GLIB)?;
        // Safety: The resolver maps `glib` only to GLib 2.x binaries, which export the
        // declared signatures.
        unsafe { Self::from_library(library) }.map_err(|source| {
            tracing::warn!(binary, error = %source, "GLib is missing a required entry point");
            LoadError::Symbol {
                binary,
                source: Arc::new(source),
            }
        })
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Unix => "unix",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQLITE: LibraryName = LibraryName {
        logical: "sqlite",
        windows: Some("sqlite3.dll"),
        macos: None,
        unix: Some("libsqlite3.so.0"),
    };

    #[test]
    fn resolves_each_family() {
        let table = ResolverTable::default();
        assert_eq!(
            table.resolve(GLIB, Some(OsFamily::Windows)),
            "libglib-2.0-0.dll"
        );
        assert_eq!(
            table.resolve(GLIB, Some(OsFamily::MacOs)),
            "libglib-2.0.0.dylib"
        );
        assert_eq!(table.resolve(GLIB, Some(OsFamily::Unix)), "libglib-2.0.so.0");
    }

    #[test]
    fn resolution_is_deterministic() {
        let table = ResolverTable::default().with(SQLITE);
        for family in [OsFamily::Windows, OsFamily::MacOs, OsFamily::Unix] {
            let first = table.resolve(GLIB, Some(family));
            for _ in 0..16 {
                assert_eq!(table.resolve(GLIB, Some(family)), first);
            }
        }
    }

    #[test]
    fn unmapped_names_fall_back_to_logical() {
        let table = ResolverTable::default().with(SQLITE);
        assert_eq!(table.resolve(GLIB, None), GLIB);
        assert_eq!(table.resolve("sqlite", Some(OsFamily::MacOs)), "sqlite");
        assert_eq!(table.resolve("zlib", Some(OsFamily::Unix)), "zlib");
        assert_eq!(ResolverTable::empty().resolve(GLIB, Some(OsFamily::Unix)), GLIB);
    }

    #[test]
    fn earlier_entries_take_precedence() {
        let override_name = LibraryName {
            unix: Some("libglib-custom.so"),
            ..GLIB_NAME
        };
        let table = ResolverTable::empty().with(override_name).with(GLIB_NAME);
        assert_eq!(table.resolve(GLIB, Some(OsFamily::Unix)), "libglib-custom.so");
        assert_eq!(
            table.resolve(GLIB, Some(OsFamily::Windows)),
            "libglib-2.0-0.dll"
        );
    }

    #[test]
    fn install_is_idempotent() {
        let _ = install(ResolverTable::default());
        let before = resolver().clone();
        assert!(!install(ResolverTable::empty()));
        assert!(!install(ResolverTable::empty().with(SQLITE)));
        assert_eq!(resolver(), &before);
    }

    #[test]
    fn current_family_matches_target() {
        let family = OsFamily::current();
        if cfg!(target_os = "linux") {
            assert_eq!(family, Some(OsFamily::Unix));
        }
        if cfg!(windows) {
            assert_eq!(family, Some(OsFamily::Windows));
        }
    }
}
