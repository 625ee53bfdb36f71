use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, OffsetDateTime, UtcOffset};

/// Offset of `tz` from UTC at the given instant, honouring daylight saving.
pub fn local_offset(time: OffsetDateTime, tz: Tz) -> UtcOffset {
    let Some(utc) = DateTime::<Utc>::from_timestamp(time.unix_timestamp(), 0) else {
        return UtcOffset::UTC;
    };
    let seconds = tz
        .offset_from_utc_datetime(&utc.naive_utc())
        .fix()
        .local_minus_utc();
    UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC)
}

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> OffsetDateTime {
    time.to_offset(local_offset(time, tz))
}

pub fn localized_date(time: OffsetDateTime, tz: Tz) -> Date {
    localized_datetime(time, tz).date()
}
