//! Markdown message templates for run summaries.

use crate::models::SignedRecord;

const USAGE_UNKNOWN: &str = "unknown";

/// Makes a value safe to place inside a Markdown code span.
fn code(value: &str) -> String {
    let value = value.replace('`', "'");
    if value.trim().is_empty() {
        "`-`".to_string()
    } else {
        format!("`{}`", value)
    }
}

fn usage(record: &SignedRecord) -> String {
    match record.used_gb {
        Some(_) => record.used_text(),
        None => USAGE_UNKNOWN.to_string(),
    }
}

pub fn success(record: &SignedRecord) -> String {
    format!(
        "🟢 *Neworld check-in succeeded*\n\
         \n\
         👤 *Slot:* {slot}\n\
         📧 *Account:* {email}\n\
         \n\
         📊 *Status:* ✅ checked in\n\
         📦 *Remaining:* {remaining}\n\
         📉 *Latest usage:* {used}\n\
         ⏳ *Expires:* {expire}\n\
         \n\
         🕒 *Time:* {ts}\n",
        slot = code(&record.slot),
        email = code(&record.email),
        remaining = code(&record.remaining),
        used = code(&usage(record)),
        expire = code(&record.expire),
        ts = code(&record.timestamp),
    )
}

pub fn already_done(record: &SignedRecord) -> String {
    format!(
        "🟡 *Neworld already checked in today*\n\
         \n\
         👤 *Slot:* {slot}\n\
         📧 *Account:* {email}\n\
         \n\
         📦 *Remaining:* {remaining}\n\
         📉 *Latest usage:* {used}\n\
         ⏳ *Expires:* {expire}\n\
         \n\
         🕒 *Time:* {ts}\n",
        slot = code(&record.slot),
        email = code(&record.email),
        remaining = code(&record.remaining),
        used = code(&usage(record)),
        expire = code(&record.expire),
        ts = code(&record.timestamp),
    )
}

pub fn skipped_no_config(record: &SignedRecord) -> String {
    format!(
        "🟠 *Neworld run skipped*\n\
         \n\
         👤 *Slot:* {slot}\n\
         ⚠️ *Reason:* no username or password configured\n\
         \n\
         🕒 *Time:* {ts}\n",
        slot = code(&record.slot),
        ts = code(&record.timestamp),
    )
}

pub fn failed(record: &SignedRecord) -> String {
    format!(
        "🔴 *Neworld check-in failed*\n\
         \n\
         👤 *Slot:* {slot}\n\
         📧 *Account:* {email}\n\
         \n\
         ❌ *Error:* {error}\n\
         \n\
         🕒 *Time:* {ts}\n",
        slot = code(&record.slot),
        email = code(&record.email),
        error = code(&record.detail),
        ts = code(&record.timestamp),
    )
}

/// Picks the template matching the record's status.
pub fn for_record(record: &SignedRecord) -> String {
    use crate::models::Status;

    match record.status {
        Status::Success => success(record),
        Status::AlreadyDone => already_done(record),
        Status::CheckNoConfig => skipped_no_config(record),
        Status::Failed => failed(record),
    }
}
