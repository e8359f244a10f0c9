use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};

const SEOUL_OFFSET_SECS: i32 = 9 * 3600;

/// Asia/Seoul has no daylight saving, so a fixed offset is exact.
pub fn seoul() -> FixedOffset {
    FixedOffset::east_opt(SEOUL_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn now_seoul() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&seoul())
}

/// `2024. 12. 24.`: the date part written at the front of every timestamp.
pub fn day_key(at: &DateTime<FixedOffset>) -> String {
    format!("{}. {}. {}.", at.year(), at.month(), at.day())
}

/// Korean locale timestamp, e.g. `2024. 12. 24. 오후 3:05:09`.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    let (pm, hour12) = at.hour12();
    format!(
        "{} {} {}:{:02}:{:02}",
        day_key(at),
        if pm { "오후" } else { "오전" },
        hour12,
        at.minute(),
        at.second()
    )
}

/// Extracts the `YYYY. M. D.` prefix of a stored timestamp.
///
/// Sheets may hold hand-typed cells, so zero-padded components are normalized
/// (`2024. 03. 05.` and `2024. 3. 5.` share a key). Returns `None` for anything
/// that does not start with three dot-terminated numbers.
pub fn timestamp_day_key(timestamp: &str) -> Option<String> {
    let mut parts = timestamp.trim_start().splitn(4, '.');
    let mut nums = [0u32; 3];
    for slot in nums.iter_mut() {
        let part = parts.next()?.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    // The third number must itself be followed by a dot.
    parts.next()?;
    Some(format!("{}. {}. {}.", nums[0], nums[1], nums[2]))
}

pub fn is_on_day(timestamp: &str, key: &str) -> bool {
    timestamp_day_key(timestamp).as_deref() == Some(key)
}
