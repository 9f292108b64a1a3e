use gbind::{
    bytes::Bytes,
    ffi::{FFISharable, FFITransferable},
    checksum::{Checksum, ChecksumType},
    error::{FileErrorCode, NativeError},
    mapped_file::MappedFile,
    Error, Result,
};
use std::{
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

#[macro_use]
mod common;

const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

#[test]
fn sha256_digest() -> Result {
    require_glib!();

    let mut checksum = Checksum::new(ChecksumType::Sha256)?.expect("sha256 is supported");
    checksum.update(b"a");
    let mut partial = checksum.clone();
    checksum.update(b"bc");
    assert_eq!(checksum.string(), ABC_SHA256);

    let digest = checksum.digest();
    assert_eq!(digest.len(), 32);
    assert_eq!(Some(digest.len()), ChecksumType::Sha256.digest_len()?);
    assert_eq!(digest[0], 0xba);

    partial.update(b"bc");
    assert_eq!(partial.string(), ABC_SHA256);

    checksum.reset();
    checksum.update(b"abc");
    assert_eq!(checksum.string(), ABC_SHA256);
    Ok(())
}

#[test]
fn one_step_digests() -> Result {
    require_glib!();

    assert_eq!(
        Checksum::compute_for_data(ChecksumType::Sha256, b"abc")?.as_deref(),
        Some(ABC_SHA256)
    );
    let bytes = Bytes::new(b"abc")?;
    assert_eq!(
        Checksum::compute_for_bytes(ChecksumType::Sha256, &bytes)?.as_deref(),
        Some(ABC_SHA256)
    );
    assert_eq!(
        Checksum::compute_for_data(ChecksumType::Md5, b"")?.as_deref(),
        Some("d41d8cd98f00b204e9800998ecf8427e")
    );
    Ok(())
}

#[test]
fn byte_buffers() -> Result {
    require_glib!();

    let bytes = Bytes::new(b"hello world")?;
    assert_eq!(bytes.len(), 11);
    assert_eq!(bytes.as_slice(), b"hello world");

    let world = bytes.slice(6..11).expect("in bounds");
    assert_eq!(world.as_ref(), b"world");
    assert!(bytes.slice(6..12).is_none());
    assert_eq!(world, Bytes::new(b"world")?);
    assert!(world > Bytes::new(b"hello")?);

    let shared = bytes.clone();
    assert_eq!(shared.into_vec(), b"hello world");
    assert_eq!(bytes.into_vec(), b"hello world");

    let empty = Bytes::new(&[])?;
    assert!(empty.is_empty());
    assert!(empty.into_vec().is_empty());
    Ok(())
}

#[test]
fn mapped_contents() -> Result {
    require_glib!();

    let mut file = tempfile::NamedTempFile::new().expect("temporary file");
    file.write_all(b"mapped contents").expect("write");
    file.flush().expect("flush");

    let mapped = MappedFile::open(file.path(), false)?;
    assert_eq!(mapped.contents(), b"mapped contents");
    assert_eq!(mapped.len(), 15);

    let bytes = mapped.bytes()?;
    drop(mapped);
    assert_eq!(bytes.as_slice(), b"mapped contents");
    Ok(())
}

#[test]
fn missing_files_report_their_domain() -> Result {
    require_glib!();

    let dir = tempfile::tempdir().expect("temporary directory");
    match MappedFile::open(dir.path().join("missing"), false) {
        Err(Error::Native(NativeError::File { code, message })) => {
            assert_eq!(code, FileErrorCode::NOENT);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn independent_resources_have_distinct_addresses() -> Result {
    require_glib!();

    let a = Bytes::new(b"same")?;
    let b = Bytes::new(b"same")?;
    assert_eq!(a, b);
    assert_ne!(a.as_raw(), b.as_raw());
    assert_eq!(a.clone().as_raw(), a.as_raw());
    Ok(())
}

struct Owner {
    data: Vec<u8>,
    drops: Arc<AtomicUsize>,
}

impl AsRef<[u8]> for Owner {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn owned_bytes(drops: &Arc<AtomicUsize>) -> Result<Bytes> {
    Bytes::from_owner(Owner {
        data: b"owned".to_vec(),
        drops: drops.clone(),
    })
}

#[test]
fn owner_is_dropped_with_the_last_reference() -> Result {
    require_glib!();

    let drops = Arc::new(AtomicUsize::new(0));
    let bytes = owned_bytes(&drops)?;
    let copy = bytes.clone();
    assert_eq!(bytes.as_slice(), b"owned");
    drop(bytes);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(copy);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn transfer_through_ffi_releases_once() -> Result {
    require_glib!();

    let drops = Arc::new(AtomicUsize::new(0));
    let raw = owned_bytes(&drops)?.into_ffi();
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    // Safety: `raw` carries the reference given up by `into_ffi`.
    let mut bytes = unsafe { Bytes::from_ffi(raw) };
    assert_eq!(bytes.as_slice(), b"owned");
    bytes.release();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    drop(bytes);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn borrowed_views_never_release() -> Result {
    require_glib!();

    let drops = Arc::new(AtomicUsize::new(0));
    let bytes = owned_bytes(&drops)?;
    {
        // Safety: `bytes` outlives the view.
        let view = unsafe { Bytes::borrow_from_ffi(bytes.share_to_ffi()) };
        assert_eq!(view.as_raw(), bytes.as_raw());
        assert_eq!(view.as_slice(), b"owned");
        let taken = (*view).clone();
        drop(view);
        drop(taken);
    }
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(bytes.len(), 5);

    drop(bytes);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    Ok(())
}
