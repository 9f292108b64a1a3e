use gbind::{
    bookmark::BookmarkFile,
    error::{BookmarkFileErrorCode, NativeError},
    Error, Result,
};

#[macro_use]
mod common;

const URI: &str = "file:///tmp/gbind/notes.txt";

fn populated() -> Result<BookmarkFile> {
    let mut bookmarks = BookmarkFile::new()?;
    bookmarks.set_title(Some(URI), "Notes")?;
    bookmarks.set_description(Some(URI), "Things to remember")?;
    bookmarks.set_mime_type(URI, "text/plain")?;
    bookmarks.add_application(URI, Some("gbind"), Some("gbind %u"))?;
    bookmarks.set_groups(URI, &["work", "drafts"])?;
    Ok(bookmarks)
}

fn sorted(mut groups: Vec<String>) -> Vec<String> {
    groups.sort();
    groups
}

#[test]
fn item_metadata() -> Result {
    require_glib!();

    let mut bookmarks = populated()?;
    assert!(bookmarks.has_item(URI)?);
    assert_eq!(bookmarks.size(), 1);
    assert_eq!(bookmarks.uris(), [URI]);
    assert_eq!(bookmarks.title(Some(URI))?.as_deref(), Some("Notes"));
    assert_eq!(bookmarks.description(Some(URI))?.as_deref(), Some("Things to remember"));
    assert_eq!(bookmarks.mime_type(URI)?, "text/plain");
    assert_eq!(sorted(bookmarks.groups(URI)?), ["drafts", "work"]);
    assert!(bookmarks.has_group(URI, "work")?);
    assert!(!bookmarks.has_group(URI, "personal")?);
    assert_eq!(bookmarks.applications(URI)?, ["gbind"]);

    bookmarks.add_group(URI, "personal")?;
    assert!(bookmarks.has_group(URI, "personal")?);

    bookmarks.set_is_private(URI, true)?;
    assert!(bookmarks.is_private(URI)?);
    Ok(())
}

#[test]
fn missing_items_report_their_domain() -> Result {
    require_glib!();

    let bookmarks = populated()?;
    let missing = "file:///tmp/gbind/missing.txt";
    assert!(!bookmarks.has_item(missing)?);
    match bookmarks.title(Some(missing)) {
        Err(Error::Native(NativeError::BookmarkFile { code, .. })) => {
            assert_eq!(code, BookmarkFileErrorCode::URI_NOT_FOUND);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_data_is_rejected() -> Result {
    require_glib!();

    let mut bookmarks = BookmarkFile::new()?;
    let error = bookmarks
        .load_from_data(b"<xbel version=\"1.0\"><bookmark")
        .expect_err("the document is truncated");
    let native = error.as_native().expect("a native error");
    assert!(
        matches!(
            native,
            NativeError::Markup { .. } | NativeError::BookmarkFile { .. }
        ),
        "{native:?}"
    );
    assert!(!native.message().is_empty());
    Ok(())
}

#[test]
fn moving_and_removing_items() -> Result {
    require_glib!();

    let mut bookmarks = populated()?;
    let moved = "file:///tmp/gbind/moved.txt";
    bookmarks.move_item(URI, Some(moved))?;
    assert!(!bookmarks.has_item(URI)?);
    assert_eq!(bookmarks.title(Some(moved))?.as_deref(), Some("Notes"));

    bookmarks.remove_item(moved)?;
    assert_eq!(bookmarks.size(), 0);
    assert!(bookmarks.remove_item(moved).is_err());
    Ok(())
}

#[test]
fn file_round_trip() -> Result {
    require_glib!();

    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("bookmarks.xbel");
    populated()?.to_file(&path)?;

    let mut loaded = BookmarkFile::new()?;
    loaded.load_from_file(&path)?;
    assert_eq!(loaded.title(Some(URI))?.as_deref(), Some("Notes"));
    assert_eq!(sorted(loaded.groups(URI)?), ["drafts", "work"]);

    let data = loaded.to_data()?;
    let mut reparsed = BookmarkFile::new()?;
    reparsed.load_from_data(&data)?;
    assert_eq!(reparsed.uris(), [URI]);
    Ok(())
}

#[test]
fn release_is_idempotent() -> Result {
    require_glib!();

    let mut bookmarks = BookmarkFile::new()?;
    bookmarks.release();
    bookmarks.release();
    assert!(!bookmarks.is_valid());
    Ok(())
}
