//! Parsing of the raw strings submitted by the finance form.

use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};
use time_tz::{OffsetResult, PrimitiveDateTimeExt, Tz};

use crate::Error;

const DATE_TIME_LOCAL_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const DATE_TIME_LOCAL_SECONDS_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse the amount in the form field `field_name`.
///
/// A missing or empty field is treated as zero.
///
/// # Errors
/// Returns [Error::InvalidAmount] with `field_name` if `raw` is not a finite number.
pub fn parse_amount(field_name: &str, raw: Option<&str>) -> Result<f64, Error> {
    let raw = raw.map(str::trim).unwrap_or_default();

    if raw.is_empty() {
        return Ok(0.0);
    }

    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(Error::InvalidAmount(field_name.to_owned())),
    }
}

/// Parse the date of a transaction as entered in the server's local timezone.
///
/// Accepts `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`, the last
/// being midnight. A missing or empty field gives `None`.
///
/// A local time that occurs twice, when daylight saving ends, resolves to the
/// earlier of the two instants.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw` is not in one of the accepted formats
/// or names a local time skipped when daylight saving starts.
pub fn parse_transaction_date(
    raw: Option<&str>,
    timezone: &Tz,
) -> Result<Option<OffsetDateTime>, Error> {
    let raw = raw.map(str::trim).unwrap_or_default();

    if raw.is_empty() {
        return Ok(None);
    }

    let date_time = PrimitiveDateTime::parse(raw, DATE_TIME_LOCAL_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(raw, DATE_TIME_LOCAL_SECONDS_FORMAT))
        .or_else(|_| Date::parse(raw, DATE_FORMAT).map(|date| date.with_time(Time::MIDNIGHT)))
        .map_err(|_| Error::InvalidDate(raw.to_owned()))?;

    match date_time.assume_timezone(timezone) {
        OffsetResult::Some(date_time) => Ok(Some(date_time)),
        OffsetResult::Ambiguous(first, second) => Ok(Some(first.min(second))),
        OffsetResult::None => Err(Error::InvalidDate(raw.to_owned())),
    }
}


#[cfg(test)]
mod parse_transaction_date_tests {
    use time::macros::datetime;
    use time_tz::Tz;

    use crate::{Error, timezone::get_timezone, transaction::form::parse_transaction_date};

    fn utc() -> &'static Tz {
        get_timezone("Etc/UTC").unwrap()
    }

    fn auckland() -> &'static Tz {
        get_timezone("Pacific/Auckland").unwrap()
    }

    #[test]
    fn parses_date_time_local() {
        let got = parse_transaction_date(Some("2025-03-01T09:30"), utc());

        assert_eq!(got, Ok(Some(datetime!(2025-03-01 09:30 UTC))));
    }

    #[test]
    fn parses_date_time_with_seconds() {
        let got = parse_transaction_date(Some("2025-03-01T09:30:15"), utc());

        assert_eq!(got, Ok(Some(datetime!(2025-03-01 09:30:15 UTC))));
    }

    #[test]
    fn date_only_is_midnight() {
        let got = parse_transaction_date(Some("2025-03-01"), utc());

        assert_eq!(got, Ok(Some(datetime!(2025-03-01 00:00 UTC))));
    }

    #[test]
    fn uses_offset_in_effect_on_the_date() {
        let summer = parse_transaction_date(Some("2025-01-11T00:30"), auckland());
        let winter = parse_transaction_date(Some("2025-07-11T00:30"), auckland());

        assert_eq!(summer, Ok(Some(datetime!(2025-01-10 11:30 UTC))));
        assert_eq!(winter, Ok(Some(datetime!(2025-07-10 12:30 UTC))));
    }

    #[test]
    fn repeated_local_time_is_earlier_instant() {
        // Clocks go back from 03:00 NZDT to 02:00 NZST on 2025-04-06.
        let got = parse_transaction_date(Some("2025-04-06T02:30"), auckland());

        assert_eq!(got, Ok(Some(datetime!(2025-04-05 13:30 UTC))));
    }

    #[test]
    fn rejects_skipped_local_time() {
        // Clocks go forward from 02:00 NZST to 03:00 NZDT on 2025-09-28.
        let raw = "2025-09-28T02:30";

        assert_eq!(
            parse_transaction_date(Some(raw), auckland()),
            Err(Error::InvalidDate(raw.to_owned()))
        );
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_transaction_date(None, utc()), Ok(None));
        assert_eq!(parse_transaction_date(Some(""), utc()), Ok(None));
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["yesterday", "01/03/2025", "2025-13-01", "2025-03-01 09:30"] {
            assert_eq!(
                parse_transaction_date(Some(raw), utc()),
                Err(Error::InvalidDate(raw.to_owned())),
                "want {raw} to be rejected"
            );
        }
    }
}
