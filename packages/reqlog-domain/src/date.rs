//! Timestamp parsing and the analytics store's wire format.

use serde_json::Value;
use time::{
	Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};

/// `YYYY-MM-DD HH:MM:SS`, UTC, no suffix.
const STORE_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
// Seconds are optional, as in `datetime-local` form values.
const LOCAL_ISO_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses a JSON date value.
///
/// Strings may be RFC 3339, an offset-less ISO date-time, the store format, or a bare date; the
/// offset-less forms are read as UTC. Numbers are milliseconds since the Unix epoch. Anything else
/// yields `None`.
pub fn parse_date_value(value: &Value) -> Option<OffsetDateTime> {
	match value {
		Value::String(raw) => parse_date_str(raw.trim()),
		Value::Number(number) => {
			let millis = match number.as_i64() {
				Some(millis) => i128::from(millis),
				None => {
					let millis = number.as_f64()?;

					if !millis.is_finite() {
						return None;
					}

					millis.trunc() as i128
				},
			};

			OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
		},
		_ => None,
	}
}

pub fn parse_date_str(raw: &str) -> Option<OffsetDateTime> {
	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed);
	}
	if let Ok(parsed) = PrimitiveDateTime::parse(raw, STORE_FORMAT) {
		return Some(parsed.assume_utc());
	}
	if let Ok(parsed) = PrimitiveDateTime::parse(raw, LOCAL_ISO_FORMAT) {
		return Some(parsed.assume_utc());
	}

	Date::parse(raw, DATE_FORMAT).ok().map(|date| date.midnight().assume_utc())
}

/// Formats a timestamp for the store, truncating anything below a second.
pub fn format_for_store(ts: OffsetDateTime) -> Option<String> {
	let utc = ts.to_offset(UtcOffset::UTC);
	let truncated = utc.replace_nanosecond(0).ok()?;

	truncated.format(STORE_FORMAT).ok()
}
