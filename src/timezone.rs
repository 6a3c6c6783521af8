//! Conversions between UTC and the society's local timezone.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of `canonical_timezone`, e.g. "Asia/Kolkata".
///
/// Returns `None` if the name is not a canonical timezone name.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date and time in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone name is not valid.
pub fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset))
}

/// Today's date in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone name is not valid.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    local_now(canonical_timezone).map(|now| now.date())
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::Error;

    use super::{get_local_offset, local_today};

    #[test]
    fn kolkata_is_five_thirty_ahead() {
        let offset = get_local_offset("Asia/Kolkata").unwrap();

        assert_eq!(offset, UtcOffset::from_hms(5, 30, 0).unwrap());
    }

    #[test]
    fn unknown_timezone_is_none() {
        assert_eq!(get_local_offset("Mars/Olympus_Mons"), None);
    }

    #[test]
    fn local_today_rejects_unknown_timezone() {
        assert_eq!(
            local_today("Not/A_Zone"),
            Err(Error::InvalidTimezoneError("Not/A_Zone".to_owned()))
        );
    }
}
