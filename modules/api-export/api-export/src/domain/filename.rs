use api_export_sdk::ExportFormat;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]-[minute]-[second]");

/// Source of the export timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// `"<label> <YYYY-MM-DD HH-MM-SS>.<ext>"`, timestamp in UTC.
///
/// # Errors
///
/// Returns the formatting error if the timestamp cannot be rendered.
pub fn export_filename(
    label: &str,
    at: OffsetDateTime,
    format: ExportFormat,
) -> Result<String, time::error::Format> {
    let stamp = at.to_offset(UtcOffset::UTC).format(TIMESTAMP_FORMAT)?;
    Ok(format!("{label} {stamp}.{}", format.extension()))
}

/// `attachment` disposition with an ASCII `filename` and a UTF-8 `filename*`.
#[must_use]
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}
