use chrono::{Local, NaiveDate, NaiveDateTime};

use super::model::Dataset;
use crate::error::{Result, StatsError};

// ---------------------------------------------------------------------------
// DateRange – inclusive timestamp window
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` window. Either side may be unbounded; when both
/// are set, `start <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl DateRange {
    /// No filtering at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }

    /// Validate optional `YYYY-MM-DD` bounds against the local clock.
    pub fn validate(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Self::validate_at(start, end, Local::now().naive_local())
    }

    /// Same as [`DateRange::validate`] with an explicit "now", used as the
    /// end bound when only a start is given.
    pub fn validate_at(start: Option<&str>, end: Option<&str>, now: NaiveDateTime) -> Result<Self> {
        let start = match (start, end) {
            (None, None) => return Ok(Self::unbounded()),
            (None, Some(_)) => {
                return Err(StatsError::validation(
                    "Cannot provide end_date without start_date",
                ))
            }
            (Some(s), _) => parse_day("start_date", s)?,
        };
        let end = match end {
            Some(e) => parse_day("end_date", e)?,
            None => now,
        };

        if start > end {
            return Err(StatsError::validation(format!(
                "Start_date {start} greater than end_date {end}"
            )));
        }

        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Validate the list form `[start, end]`. Empty strings count as absent
    /// and a missing second entry means no end bound.
    pub fn from_bounds(bounds: &[Option<&str>]) -> Result<Self> {
        if bounds.len() > 2 {
            return Err(StatsError::validation(
                "Malformed date range, length larger than two",
            ));
        }
        let present = |i: usize| bounds.get(i).copied().flatten().filter(|s| !s.is_empty());
        Self::validate(present(0), present(1))
    }
}

/// Midnight of a calendar day written as `YYYY-MM-DD`.
///
/// The year must be exactly four digits with no sign or padding; chrono's
/// `%Y` alone would accept `19-05-01` as the year 19.
fn parse_day(field: &str, value: &str) -> Result<NaiveDateTime> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-';
    shaped
        .then(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .flatten()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| StatsError::validation(format!("Invalid {field}: {value}")))
}

// ---------------------------------------------------------------------------
// Row selection
// ---------------------------------------------------------------------------

/// Indices of rows whose timestamp falls inside `range`.
///
/// Rows are sorted, so a bounded range is a contiguous slice found by
/// binary search.
pub fn row_span(dataset: &Dataset, range: &DateRange) -> std::ops::Range<usize> {
    let ts = dataset.timestamps();
    let lo = match range.start {
        Some(s) => ts.partition_point(|t| *t < s),
        None => 0,
    };
    let hi = match range.end {
        Some(e) => ts.partition_point(|t| *t <= e),
        None => ts.len(),
    };
    lo..hi.max(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Channel;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn absent_bounds_are_unbounded() {
        assert!(DateRange::validate(None, None).unwrap().is_unbounded());
    }

    #[test]
    fn end_without_start_is_rejected() {
        let err = DateRange::validate(None, Some("2019-01-01")).unwrap_err();
        assert_eq!(
            err,
            StatsError::Validation("Cannot provide end_date without start_date".into())
        );
    }

    #[test]
    fn open_end_defaults_to_now() {
        let now = day(2026, 10, 19);
        let range = DateRange::validate_at(Some("2019-05-01"), None, now).unwrap();
        assert_eq!(range.start(), Some(day(2019, 5, 1)));
        assert_eq!(range.end(), Some(now));

        let live = DateRange::validate(Some("2019-05-01"), None).unwrap();
        assert!(live.end().unwrap() >= live.start().unwrap());
    }

    #[test]
    fn malformed_dates_name_the_field() {
        let err = DateRange::validate(Some("2019-13-01"), None).unwrap_err();
        assert_eq!(err, StatsError::Validation("Invalid start_date: 2019-13-01".into()));

        let err = DateRange::validate(Some("2019-01-01"), Some("yesterday")).unwrap_err();
        assert_eq!(err, StatsError::Validation("Invalid end_date: yesterday".into()));

        for bad in ["19-05-01", " 2019-05-01 ", "+2019-05-01", "2019-05-01 ", "02019-05-01"] {
            let err = DateRange::validate(Some(bad), Some("2020-01-01")).unwrap_err();
            assert_eq!(err, StatsError::Validation(format!("Invalid start_date: {bad}")));
        }
        let err = DateRange::validate(Some("2019-05-01"), Some("20-01-01")).unwrap_err();
        assert_eq!(err, StatsError::Validation("Invalid end_date: 20-01-01".into()));
    }

    #[test]
    fn reversed_range_mentions_both_dates() {
        let err = DateRange::validate(Some("2019-07-27"), Some("2019-05-27")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Start_date 2019-07-27 00:00:00 greater than end_date 2019-05-27 00:00:00"
        );
    }

    #[test]
    fn list_form_rejects_three_bounds() {
        let err =
            DateRange::from_bounds(&[Some("2019-01-01"), Some("2019-02-01"), None]).unwrap_err();
        assert_eq!(
            err,
            StatsError::Validation("Malformed date range, length larger than two".into())
        );
        assert!(DateRange::from_bounds(&[Some(""), None]).unwrap().is_unbounded());
    }

    #[test]
    fn span_is_inclusive_on_both_ends() {
        let ds = Dataset::new(
            vec![day(2019, 1, 1), day(2019, 1, 2), day(2019, 1, 3), day(2019, 1, 4)],
            vec![Channel::new("vel1", vec![Some(1.0); 4])],
        )
        .unwrap();
        let range = DateRange::validate(Some("2019-01-02"), Some("2019-01-03")).unwrap();
        assert_eq!(row_span(&ds, &range), 1..3);
        assert_eq!(row_span(&ds, &DateRange::unbounded()), 0..4);

        let outside = DateRange::validate(Some("1900-05-27"), Some("1900-07-27")).unwrap();
        assert!(row_span(&ds, &outside).is_empty());
    }
}
