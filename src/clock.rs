//! Wall-clock helpers pinned to the portal's time zone (UTC+8).
//!
//! Record timestamps and the "today" used for idempotency are both taken in
//! this zone, so a run shortly after midnight in Beijing counts as a new day
//! regardless of where the job itself is scheduled.

use chrono::{DateTime, FixedOffset, Utc};

const PORTAL_OFFSET_SECS: i32 = 8 * 3600;

/// The portal's fixed offset.
pub fn portal_offset() -> FixedOffset {
    FixedOffset::east_opt(PORTAL_OFFSET_SECS).expect("UTC+8 is within chrono's offset range")
}

/// Current time in the portal's zone.
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&portal_offset())
}

/// `YYYY-MM-DD HH:MM:SS`, the timestamp format used in records and messages.
pub fn timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `YYYY-MM-DD`, the prefix that identifies a day in the marker file.
pub fn day(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn snapshot_stamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
