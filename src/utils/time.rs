use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use now::DateTimeNow;

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    (date + Duration::days(1)).with_time(NaiveTime::MIN).unwrap()
}

/// Calendar date `instant` falls on in `tz`.
pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Half open `[start, end)` range covering `date` in `tz`. Days around DST switches are not
/// necessarily 24 hours long, which is why this goes through the zone instead of adding a day.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = tz
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()?
        .beginning_of_day();
    let end = next_day_start(start.clone());
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
