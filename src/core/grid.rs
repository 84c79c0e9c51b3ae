// Fixed-period sample grid and day alignment

use crate::core::constants::SECONDS_PER_DAY;
use crate::core::decoder::DayContent;
use crate::core::error::{Result, WindCubeError};
use crate::core::format::Schema;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::ops::Range;
use tracing::debug;

/// Splits every UTC day into `86400 / period` slots. A timestamp maps to
/// `floor((t - day_start) / period)`; timestamps outside
/// `[day_start, day_start + 24h)` do not belong to the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    period_ms: i64,
}

/// Portion of a window that falls on one day: day slots `slots` land at
/// buffer index `target..target + slots.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySpan {
    pub date: NaiveDate,
    pub slots: Range<usize>,
    pub target: usize,
}

pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl Grid {
    /// `period_secs` must divide a day evenly; see `SourceConfig::validate`.
    pub fn new(period_secs: u32) -> Self {
        debug_assert!(period_secs > 0 && SECONDS_PER_DAY % period_secs == 0);
        Self {
            period_ms: period_secs as i64 * 1000,
        }
    }

    pub fn slots_per_day(&self) -> usize {
        (SECONDS_PER_DAY as i64 * 1000 / self.period_ms) as usize
    }

    pub fn slot_in_day(&self, day_start: DateTime<Utc>, timestamp: DateTime<Utc>) -> Option<usize> {
        // Compared before dividing: sub-millisecond offsets truncate to zero.
        if timestamp < day_start {
            return None;
        }

        let elapsed = (timestamp - day_start).num_milliseconds();
        let slot = (elapsed / self.period_ms) as usize;
        (slot < self.slots_per_day()).then_some(slot)
    }

    pub fn is_aligned(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp.timestamp_subsec_nanos() % 1_000_000 == 0
            && timestamp.timestamp_millis().rem_euclid(self.period_ms) == 0
    }

    /// Number of slots in `[begin, end)`.
    pub fn slots_in_window(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize> {
        if end < begin {
            return Err(WindCubeError::InvalidWindow(format!("end {} precedes begin {}", end, begin)));
        }
        if !self.is_aligned(begin) || !self.is_aligned(end) {
            return Err(WindCubeError::InvalidWindow(format!(
                "[{}, {}) is not aligned to the {} s grid",
                begin,
                end,
                self.period_ms / 1000
            )));
        }

        Ok(((end - begin).num_milliseconds() / self.period_ms) as usize)
    }

    /// Split `[begin, end)` into per-day spans, in day order.
    pub fn spans(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<DaySpan>> {
        let total = self.slots_in_window(begin, end)? as i64;
        if total == 0 {
            return Ok(Vec::new());
        }

        let per_day = self.slots_per_day() as i64;
        let last = (end - Duration::milliseconds(1)).date_naive();
        let mut spans = Vec::new();

        for date in begin.date_naive().iter_days().take_while(|d| *d <= last) {
            let offset = (day_start(date) - begin).num_milliseconds() / self.period_ms;
            let first = (-offset).max(0);
            let stop = (total - offset).min(per_day);

            if first < stop {
                spans.push(DaySpan {
                    date,
                    slots: first as usize..stop as usize,
                    target: (offset + first) as usize,
                });
            }
        }

        Ok(spans)
    }
}

/// A decoded day mapped onto the grid. Each slot holds the values of the
/// last row (in file order) that fell into it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedDay {
    pub date: NaiveDate,
    pub schema: Schema,
    slots: Vec<Option<Vec<Option<f64>>>>,
}

impl AlignedDay {
    pub fn empty(date: NaiveDate, grid: &Grid) -> Self {
        Self {
            date,
            schema: Schema::default(),
            slots: vec![None; grid.slots_per_day()],
        }
    }

    pub fn align(date: NaiveDate, content: &DayContent, grid: &Grid) -> Self {
        let start = day_start(date);
        let mut slots = vec![None; grid.slots_per_day()];
        let mut rows = content.rows();
        let mut foreign = 0;

        for record in rows.by_ref() {
            match grid.slot_in_day(start, record.timestamp) {
                Some(slot) => slots[slot] = Some(record.values),
                None => foreign += 1,
            }
        }

        debug!(
            "aligned {}: {} rows skipped, {} rows outside the day",
            date,
            rows.skipped(),
            foreign
        );

        Self {
            date,
            schema: content.schema().clone(),
            slots,
        }
    }

    pub fn column_of(&self, id: &str) -> Option<usize> {
        self.schema.column_of(id)
    }

    pub fn value(&self, slot: usize, column: usize) -> Option<f64> {
        self.slots.get(slot)?.as_ref()?.get(column).copied().flatten()
    }

    /// A slot counts as valid when its row carries at least one value.
    pub fn is_valid(&self, slot: usize) -> bool {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .is_some_and(|values| values.iter().any(Option::is_some))
    }

    pub fn valid_slots(&self, slots: Range<usize>) -> usize {
        slots.filter(|slot| self.is_valid(*slot)).count()
    }

    pub fn has_data(&self) -> bool {
        self.valid_slots(0..self.slots.len()) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::parse_timestamp;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, d, h, m, s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 10, d).unwrap()
    }

    #[test]
    fn test_slot_in_day_floors() {
        let grid = Grid::new(600);
        let start = at(8, 0, 0, 0);

        assert_eq!(grid.slots_per_day(), 144);
        assert_eq!(grid.slot_in_day(start, at(8, 0, 0, 0)), Some(0));
        assert_eq!(grid.slot_in_day(start, at(8, 0, 9, 59)), Some(0));
        assert_eq!(grid.slot_in_day(start, at(8, 0, 10, 0)), Some(1));
        assert_eq!(grid.slot_in_day(start, at(8, 23, 59, 59)), Some(143));
        assert_eq!(grid.slot_in_day(start, at(9, 0, 0, 0)), None);
        assert_eq!(grid.slot_in_day(start, at(7, 23, 50, 0)), None);

        let just_before = parse_timestamp("2020/10/07 23:59:59.9999").unwrap();
        assert_eq!(grid.slot_in_day(start, just_before), None);
        assert_eq!(grid.slot_in_day(start, start - Duration::nanoseconds(1)), None);
        assert_eq!(grid.slot_in_day(start, start + Duration::nanoseconds(1)), Some(0));
    }

    #[test]
    fn test_slots_in_window() {
        let grid = Grid::new(600);
        assert_eq!(grid.slots_in_window(at(8, 0, 0, 0), at(9, 0, 0, 0)).unwrap(), 144);
        assert_eq!(grid.slots_in_window(at(8, 1, 0, 0), at(8, 2, 0, 0)).unwrap(), 6);
        assert_eq!(grid.slots_in_window(at(8, 0, 0, 0), at(8, 0, 0, 0)).unwrap(), 0);
        assert!(grid.slots_in_window(at(8, 0, 5, 0), at(9, 0, 0, 0)).is_err());
        assert!(grid.slots_in_window(at(9, 0, 0, 0), at(8, 0, 0, 0)).is_err());

        let off_grid = at(8, 0, 0, 0) + Duration::microseconds(100);
        assert!(!grid.is_aligned(off_grid));
        assert!(grid.slots_in_window(off_grid, at(9, 0, 0, 0)).is_err());
        assert!(grid.slots_in_window(at(8, 0, 0, 0), at(9, 0, 0, 0) - Duration::nanoseconds(1)).is_err());
    }

    #[test]
    fn test_spans_cross_days() {
        let grid = Grid::new(600);
        let spans = grid.spans(at(7, 23, 0, 0), at(9, 1, 0, 0)).unwrap();

        assert_eq!(
            spans,
            vec![
                DaySpan { date: date(7), slots: 138..144, target: 0 },
                DaySpan { date: date(8), slots: 0..144, target: 6 },
                DaySpan { date: date(9), slots: 0..6, target: 150 },
            ]
        );
    }

    #[test]
    fn test_spans_sub_day() {
        let grid = Grid::new(600);
        let spans = grid.spans(at(8, 6, 0, 0), at(8, 12, 0, 0)).unwrap();
        assert_eq!(spans, vec![DaySpan { date: date(8), slots: 36..72, target: 0 }]);
        assert!(grid.spans(at(8, 6, 0, 0), at(8, 6, 0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_align_last_row_wins() {
        let text = "Timestamp\tA\tB\n\
            2020/10/08 00:00:00\t1\t10\n\
            2020/10/08 00:05:00\t2\t\n\
            2020/10/08 00:10:30\t3\t30\n\
            2020/10/09 00:00:00\t4\t40\n\
            2020/10/08 00:20:00\tNaN\tNaN\n";
        let content = DayContent::parse(text.to_string(), '\t').unwrap();
        let grid = Grid::new(600);
        let day = AlignedDay::align(date(8), &content, &grid);

        assert_eq!(day.value(0, 0), Some(2.0));
        assert_eq!(day.value(0, 1), None);
        assert_eq!(day.value(1, 1), Some(30.0));
        assert!(day.is_valid(0));
        assert!(!day.is_valid(2));
        assert_eq!(day.valid_slots(0..144), 2);
        assert_eq!(day.column_of("B"), Some(1));
        assert_eq!(day.column_of("C"), None);
    }

    #[test]
    fn test_align_drops_previous_day_fraction() {
        let text = "Timestamp\tA\n\
            2020/10/07 23:59:59.9999\t42\n\
            2020/10/08 00:10:00\t1\n";
        let content = DayContent::parse(text.to_string(), '\t').unwrap();
        let day = AlignedDay::align(date(8), &content, &Grid::new(600));

        assert!(!day.is_valid(0));
        assert_eq!(day.value(0, 0), None);
        assert_eq!(day.value(1, 0), Some(1.0));
        assert_eq!(day.valid_slots(0..144), 1);
    }

    #[test]
    fn test_empty_day_has_no_data() {
        let day = AlignedDay::empty(date(6), &Grid::new(600));
        assert!(!day.has_data());
        assert_eq!(day.value(0, 0), None);
    }
}
