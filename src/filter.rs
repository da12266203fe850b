use chrono::NaiveDate;
use serde::Serialize;

use crate::error::RangeError;
use crate::models::LoanRecord;

/// Inclusive window over `earliest_cr_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The `[min, max]` span of the dataset, or `None` when it is empty.
    pub fn bounds(records: &[LoanRecord]) -> Option<DateRange> {
        let mut dates = records.iter().map(|record| record.earliest_cr_line);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(min, max), date| {
            (min.min(date), max.max(date))
        });
        Some(DateRange { start, end })
    }

    /// Builds the active range from optional user bounds, falling back to the
    /// dataset bounds for whichever side is missing.
    pub fn select(
        records: &[LoanRecord],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DateRange, RangeError> {
        let bounds = DateRange::bounds(records).ok_or(RangeError::EmptyDataset)?;
        let range = DateRange {
            start: start.unwrap_or(bounds.start),
            end: end.unwrap_or(bounds.end),
        };

        if range.start > range.end {
            return Err(RangeError::Inverted {
                start: range.start,
                end: range.end,
            });
        }
        if range.start < bounds.start || range.end > bounds.end {
            return Err(RangeError::OutOfBounds {
                start: range.start,
                end: range.end,
                min: bounds.start,
                max: bounds.end,
            });
        }

        Ok(range)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn filter_by_range(records: &[LoanRecord], range: &DateRange) -> Vec<LoanRecord> {
    records
        .iter()
        .filter(|record| range.contains(record.earliest_cr_line))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    pub(crate) fn record(member_id: u64, opened: NaiveDate) -> LoanRecord {
        LoanRecord {
            member_id,
            loan_amnt: 1000.0,
            int_rate: 10.0,
            loan_status: "Good Loan".to_string(),
            purpose: "credit_card".to_string(),
            emp_length: "1 year".to_string(),
            home_ownership: "RENT".to_string(),
            grade: "A".to_string(),
            addr_state: "Texas".to_string(),
            latitude: 31.0,
            longitude: -100.0,
            earliest_cr_line: opened,
        }
    }

    fn sample() -> Vec<LoanRecord> {
        vec![
            record(1, date(2001, 3, 1)),
            record(2, date(1999, 7, 12)),
            record(3, date(2005, 11, 30)),
            record(4, date(2003, 1, 1)),
        ]
    }

    #[test]
    fn bounds_span_min_and_max() {
        let bounds = DateRange::bounds(&sample()).unwrap();
        assert_eq!(bounds.start, date(1999, 7, 12));
        assert_eq!(bounds.end, date(2005, 11, 30));
        assert_eq!(DateRange::bounds(&[]), None);
    }

    #[test]
    fn filter_is_inclusive_on_both_ends() {
        let range = DateRange {
            start: date(2001, 3, 1),
            end: date(2003, 1, 1),
        };
        let filtered = filter_by_range(&sample(), &range);

        let ids: Vec<u64> = filtered.iter().map(|r| r.member_id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(filtered.iter().all(|r| range.contains(r.earliest_cr_line)));
    }

    #[test]
    fn select_defaults_to_dataset_bounds() {
        let records = sample();
        let range = DateRange::select(&records, None, Some(date(2002, 1, 1))).unwrap();
        assert_eq!(range.start, date(1999, 7, 12));
        assert_eq!(range.end, date(2002, 1, 1));
        assert_eq!(filter_by_range(&records, &range).len(), 2);
    }

    #[test]
    fn select_rejects_out_of_bounds_and_inverted() {
        let records = sample();
        assert!(matches!(
            DateRange::select(&records, Some(date(1990, 1, 1)), None),
            Err(RangeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            DateRange::select(&records, Some(date(2004, 1, 1)), Some(date(2000, 1, 1))),
            Err(RangeError::Inverted { .. })
        ));
        assert_eq!(
            DateRange::select(&[], None, None),
            Err(RangeError::EmptyDataset)
        );
    }

    #[test]
    fn range_between_records_yields_empty_set() {
        let range = DateRange {
            start: date(2001, 3, 2),
            end: date(2002, 12, 31),
        };
        assert!(filter_by_range(&sample(), &range).is_empty());
    }
}
