use gbind::{
    time::{monotonic_time, DateTime, TimeSpan, TimeType, TimeZone},
    Result,
};

#[macro_use]
mod common;

#[test]
fn unix_epoch_fields() -> Result {
    require_glib!();

    let epoch = DateTime::from_unix_utc(0)?.expect("epoch is representable");
    assert_eq!(epoch.year(), 1970);
    assert_eq!(epoch.month(), 1);
    assert_eq!(epoch.day_of_month(), 1);
    assert_eq!(epoch.hour(), 0);
    assert_eq!(epoch.to_unix(), 0);
    assert_eq!(epoch.utc_offset(), TimeSpan::ZERO);
    Ok(())
}

#[test]
fn calendar_arithmetic() -> Result {
    require_glib!();

    let utc = TimeZone::utc()?;
    let leap = DateTime::new(&utc, 2024, 2, 28, 12, 0, 0.0)?.expect("valid date");
    let next = leap.add_days(1).expect("in range");
    assert_eq!((next.month(), next.day_of_month()), (2, 29));
    assert_eq!(next.difference(&leap), TimeSpan::DAY);
    assert!(next > leap);

    let year_later = leap.add_years(1).expect("in range");
    assert_eq!(year_later.year(), 2025);
    assert!(DateTime::new(&utc, 2023, 2, 29, 0, 0, 0.0)?.is_none());
    Ok(())
}

#[test]
fn equal_times_compare_equal() -> Result {
    require_glib!();

    let a = DateTime::from_unix_utc(1_000_000)?.expect("in range");
    let b = DateTime::from_iso8601("1970-01-12T13:46:40Z", None)?.expect("valid text");
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert!(DateTime::from_iso8601("not a date", None)?.is_none());
    Ok(())
}

#[test]
fn formatting() -> Result {
    require_glib!();

    let utc = TimeZone::utc()?;
    let time = DateTime::new(&utc, 2001, 9, 9, 1, 46, 40.0)?.expect("valid date");
    assert_eq!(time.format("%Y-%m-%d %H:%M:%S")?.as_deref(), Some("2001-09-09 01:46:40"));
    assert_eq!(time.to_unix(), 1_000_000_000);
    assert!(time.format("nul\0byte").is_err());
    Ok(())
}

#[test]
fn fixed_offset_zones() -> Result {
    require_glib!();

    let utc = TimeZone::utc()?;
    let interval = utc.find_interval(TimeType::Universal, 0).expect("utc has an interval");
    assert_eq!(utc.offset(interval), 0);
    assert!(!utc.is_dst(interval));

    let plus_two = TimeZone::from_identifier("+02:00")?.expect("offsets are valid identifiers");
    let time = DateTime::from_unix_utc(0)?
        .and_then(|t| t.to_timezone(&plus_two))
        .expect("in range");
    assert_eq!(time.hour(), 2);
    assert_eq!(time.utc_offset(), TimeSpan::HOUR * 2);
    Ok(())
}

#[test]
fn monotonic_clock_advances() -> Result {
    require_glib!();

    let start = monotonic_time()?;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let end = monotonic_time()?;
    assert!(end.duration_since(start) >= TimeSpan::MILLISECOND * 5);
    Ok(())
}

#[test]
fn release_is_idempotent() -> Result {
    require_glib!();

    let mut time = DateTime::now_utc()?;
    let copy = time.clone();
    time.release();
    time.release();
    assert!(!time.is_valid());
    assert!(copy.is_valid());
    assert!(copy.year() >= 2024);
    Ok(())
}
