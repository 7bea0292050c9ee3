//! Resolving the server's configured timezone.

use time_tz::Tz;

/// Get the timezone named `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// The timezone, rather than a fixed UTC offset, is needed to convert dates
/// on either side of a daylight saving change.
///
/// Returns `None` if the timezone name is not recognised.
pub fn get_timezone(canonical_timezone: &str) -> Option<&'static Tz> {
    time_tz::timezones::get_by_name(canonical_timezone)
}
