#[path = "../src/kst.rs"]
#[allow(dead_code)]
mod kst;

use chrono::{TimeZone, Utc};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::DateTime<chrono::FixedOffset> {
    kst::seoul()
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("valid local time")
}

#[test]
fn timestamps_follow_korean_locale_format() {
    assert_eq!(kst::format_timestamp(&at(2024, 12, 24, 15, 5, 9)), "2024. 12. 24. 오후 3:05:09");
    assert_eq!(kst::format_timestamp(&at(2025, 3, 2, 9, 30, 0)), "2025. 3. 2. 오전 9:30:00");
    assert_eq!(kst::format_timestamp(&at(2025, 3, 2, 0, 1, 2)), "2025. 3. 2. 오전 12:01:02");
    assert_eq!(kst::format_timestamp(&at(2025, 3, 2, 12, 0, 0)), "2025. 3. 2. 오후 12:00:00");
}

#[test]
fn seoul_day_starts_nine_hours_ahead_of_utc() {
    let utc = Utc.with_ymd_and_hms(2024, 12, 23, 15, 30, 0).single().expect("utc");
    let local = utc.with_timezone(&kst::seoul());
    assert_eq!(kst::day_key(&local), "2024. 12. 24.");
}

#[test]
fn day_key_of_stored_timestamps() {
    assert_eq!(
        kst::timestamp_day_key("2024. 12. 24. 오후 3:05:09").as_deref(),
        Some("2024. 12. 24.")
    );
    assert_eq!(
        kst::timestamp_day_key("2024. 03. 05. 오전 9:00:00").as_deref(),
        Some("2024. 3. 5.")
    );
    assert_eq!(kst::timestamp_day_key("2024.3.5.").as_deref(), Some("2024. 3. 5."));
    assert_eq!(kst::timestamp_day_key("시간"), None);
    assert_eq!(kst::timestamp_day_key(""), None);
    assert_eq!(kst::timestamp_day_key("2024. 12"), None);
    assert_eq!(kst::timestamp_day_key("2024. 12. 24"), None);
}

#[test]
fn same_year_is_not_the_same_day() {
    let today = kst::day_key(&at(2024, 12, 24, 10, 0, 0));
    assert!(kst::is_on_day("2024. 12. 24. 오전 9:00:00", &today));
    assert!(!kst::is_on_day("2024. 12. 2. 오전 9:00:00", &today));
    assert!(!kst::is_on_day("2024. 1. 24. 오전 9:00:00", &today));
}
