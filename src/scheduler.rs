//! Due-date arithmetic and categorization for chores.
//!
//! Every date the scheduler stores is a `NaiveDate`, so day truncation is a
//! property of the types: instants are converted through the clock's offset
//! by [`Scheduler::day_of`] before they touch a record.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::models::ChoreRecord;

/// Signed calendar-day addition. `None` when the result leaves chrono's range.
pub fn add_days(day: NaiveDate, delta: i64) -> Option<NaiveDate> {
    if delta >= 0 {
        day.checked_add_days(Days::new(delta.unsigned_abs()))
    } else {
        day.checked_sub_days(Days::new(delta.unsigned_abs()))
    }
}

/// Where a chore sits relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// Days past the due date, always positive
    Overdue(i64),
    Today,
    /// Days until the due date, always positive
    Upcoming(i64),
}

impl DueStatus {
    pub fn from_days_until_due(days: i64) -> Self {
        match days {
            d if d < 0 => DueStatus::Overdue(d.abs()),
            0 => DueStatus::Today,
            d => DueStatus::Upcoming(d),
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, DueStatus::Overdue(_))
    }

    pub fn is_due_today(&self) -> bool {
        matches!(self, DueStatus::Today)
    }

    /// Sort rank of the display bucket: overdue, then today, then upcoming
    fn bucket_rank(&self) -> u8 {
        match self {
            DueStatus::Overdue(_) => 0,
            DueStatus::Today => 1,
            DueStatus::Upcoming(_) => 2,
        }
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueStatus::Overdue(days) => write!(f, "{} days overdue", days),
            DueStatus::Today => write!(f, "today"),
            DueStatus::Upcoming(days) => write!(f, "in {} days", days),
        }
    }
}

/// Chores split into the three list sections, each ascending by due date
#[derive(Debug, Default)]
pub struct DueBuckets<'a> {
    pub overdue: Vec<&'a ChoreRecord>,
    pub today: Vec<&'a ChoreRecord>,
    pub upcoming: Vec<&'a ChoreRecord>,
}

impl DueBuckets<'_> {
    pub fn len(&self) -> usize {
        self.overdue.len() + self.today.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct Scheduler {
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("now", &self.clock.now()).finish()
    }
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    /// Calendar day of `instant` in the clock's offset
    pub fn day_of<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> NaiveDate {
        let offset = *self.clock.now().offset();
        instant.with_timezone(&offset).date_naive()
    }

    /// `from + interval_days`, or `from` unchanged if the addition overflows
    pub fn compute_next_due_date(&self, from: NaiveDate, interval_days: i64) -> NaiveDate {
        add_days(from, interval_days).unwrap_or_else(|| {
            debug!(%from, interval_days, "next due date out of range, keeping base day");
            from
        })
    }

    /// Complete the chore today
    pub fn mark_completed(&self, record: &mut ChoreRecord) {
        self.mark_completed_on(record, self.today());
    }

    /// Complete the chore at `instant`, truncated to its calendar day
    pub fn mark_completed_at<Tz: TimeZone>(&self, record: &mut ChoreRecord, instant: &DateTime<Tz>) {
        let day = self.day_of(instant);
        self.mark_completed_on(record, day);
    }

    /// Complete the chore on `day`.
    ///
    /// The next cycle is anchored to the completion day, whatever the
    /// previous due date was, so completing early or late shifts the cadence.
    pub fn mark_completed_on(&self, record: &mut ChoreRecord, day: NaiveDate) {
        record.last_completed = Some(day);
        record.next_due = self.compute_next_due_date(day, record.interval_days);
        record.updated_at = self.now_utc();
        debug!(chore = %record.id, completed = %day, next_due = %record.next_due, "chore completed");
    }

    /// Move the pending occurrence to `day`.
    ///
    /// `last_completed` is left alone: the next completion still anchors to
    /// the day it actually happens on.
    pub fn reschedule(&self, record: &mut ChoreRecord, day: NaiveDate) {
        record.next_due = day;
        record.updated_at = self.now_utc();
        debug!(chore = %record.id, next_due = %day, "chore rescheduled");
    }

    /// Shift the due date by a signed number of days
    pub fn adjust_due_date(&self, record: &mut ChoreRecord, delta_days: i64) {
        let Some(day) = add_days(record.next_due, delta_days) else {
            debug!(chore = %record.id, delta_days, "adjusted due date out of range, ignoring");
            return;
        };
        record.next_due = day;
        record.updated_at = self.now_utc();
    }

    pub fn is_due_on(&self, day: NaiveDate, record: &ChoreRecord) -> bool {
        record.next_due == day
    }

    /// Whole days from today to the due date; negative when overdue
    pub fn days_until_due(&self, record: &ChoreRecord) -> i64 {
        (record.next_due - self.today()).num_days()
    }

    pub fn status(&self, record: &ChoreRecord) -> DueStatus {
        DueStatus::from_days_until_due(self.days_until_due(record))
    }

    pub fn is_overdue(&self, record: &ChoreRecord) -> bool {
        self.days_until_due(record) < 0
    }

    pub fn is_due_today(&self, record: &ChoreRecord) -> bool {
        self.days_until_due(record) == 0
    }

    pub fn status_label(&self, record: &ChoreRecord) -> String {
        self.status(record).to_string()
    }

    pub fn filter_due_today<'a>(&self, records: &'a [ChoreRecord]) -> Vec<&'a ChoreRecord> {
        let today = self.today();
        records.iter().filter(|r| r.next_due == today).collect()
    }

    pub fn filter_overdue<'a>(&self, records: &'a [ChoreRecord]) -> Vec<&'a ChoreRecord> {
        let today = self.today();
        records.iter().filter(|r| r.next_due < today).collect()
    }

    pub fn filter_upcoming<'a>(&self, records: &'a [ChoreRecord]) -> Vec<&'a ChoreRecord> {
        let today = self.today();
        records.iter().filter(|r| r.next_due > today).collect()
    }

    /// Chores due between `start` and `end`, both inclusive
    pub fn filter_in_range<'a>(
        &self,
        records: &'a [ChoreRecord],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<&'a ChoreRecord> {
        records
            .iter()
            .filter(|r| r.next_due >= start && r.next_due <= end)
            .collect()
    }

    pub fn chores_on<'a>(&self, day: NaiveDate, records: &'a [ChoreRecord]) -> Vec<&'a ChoreRecord> {
        records.iter().filter(|r| self.is_due_on(day, r)).collect()
    }

    /// Stable sort into overdue, today, upcoming; ascending due date within each.
    ///
    /// The bucket goes first in the key so an item overdue by months still
    /// lands above one due tomorrow.
    pub fn sort_for_display(&self, records: &mut [ChoreRecord]) {
        records.sort_by_key(|r| (self.status(r).bucket_rank(), r.next_due));
    }

    pub fn bucketize<'a>(&self, records: &'a [ChoreRecord]) -> DueBuckets<'a> {
        let mut buckets = DueBuckets::default();
        for record in records {
            match self.status(record) {
                DueStatus::Overdue(_) => buckets.overdue.push(record),
                DueStatus::Today => buckets.today.push(record),
                DueStatus::Upcoming(_) => buckets.upcoming.push(record),
            }
        }
        buckets.overdue.sort_by_key(|r| r.next_due);
        buckets.today.sort_by_key(|r| r.next_due);
        buckets.upcoming.sort_by_key(|r| r.next_due);
        buckets
    }
}

/// Calendar cells for a month, weeks starting on Sunday.
///
/// Leading cells before the 1st are `None`; the grid is not padded at the
/// end. Returns an empty grid for an invalid month.
pub fn month_grid(year: i32, month: u32) -> Vec<Option<NaiveDate>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<NaiveDate>> = vec![None; leading];
    cells.extend(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(Some),
    );
    cells
}

/// First day of the month `delta` months away from the month containing `day`
pub fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
    let index = day.year() * 12 + day.month0() as i32 + delta;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{FixedOffset, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scheduler_on(today: NaiveDate) -> (Scheduler, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_day(today));
        (Scheduler::new(clock.clone()), clock)
    }

    fn chore(name: &str, interval: i64, next_due: NaiveDate) -> ChoreRecord {
        let created = day(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        ChoreRecord::new(name.to_string(), interval, next_due, created)
    }

    #[test]
    fn test_compute_next_due_date_adds_interval() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        assert_eq!(scheduler.compute_next_due_date(day(2026, 2, 15), 7), day(2026, 2, 22));
        assert_eq!(scheduler.compute_next_due_date(day(2026, 2, 15), 1), day(2026, 2, 16));
    }

    #[test]
    fn test_compute_next_due_date_crosses_month_and_year() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        assert_eq!(scheduler.compute_next_due_date(day(2026, 2, 25), 7), day(2026, 3, 4));
        assert_eq!(scheduler.compute_next_due_date(day(2026, 12, 28), 7), day(2027, 1, 4));
        // leap year
        assert_eq!(scheduler.compute_next_due_date(day(2028, 2, 25), 7), day(2028, 3, 3));
    }

    #[test]
    fn test_compute_next_due_date_fails_closed_on_overflow() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        assert_eq!(scheduler.compute_next_due_date(NaiveDate::MAX, 7), NaiveDate::MAX);
    }

    #[test]
    fn test_day_of_truncates_in_clock_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap();
        let scheduler = Scheduler::new(Arc::new(FixedClock::new(now)));

        // 20:00 UTC on Feb 15 is Feb 16 in Tokyo
        let instant = Utc.with_ymd_and_hms(2026, 2, 15, 20, 0, 0).unwrap();
        assert_eq!(scheduler.day_of(&instant), day(2026, 2, 16));
    }

    #[test]
    fn test_mark_completed_anchors_to_completion_day() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let mut record = chore("Vacuum", 7, day(2026, 2, 10));
        let before = record.updated_at;

        scheduler.mark_completed_on(&mut record, day(2026, 2, 15));

        assert_eq!(record.last_completed, Some(day(2026, 2, 15)));
        assert_eq!(record.next_due, day(2026, 2, 22));
        assert!(record.updated_at > before);
    }

    #[test]
    fn test_mark_completed_at_truncates_instant() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let mut record = chore("Vacuum", 3, day(2026, 2, 15));
        let late_evening = Utc.with_ymd_and_hms(2026, 2, 15, 23, 59, 0).unwrap();

        scheduler.mark_completed_at(&mut record, &late_evening);

        assert_eq!(record.last_completed, Some(day(2026, 2, 15)));
        assert_eq!(record.next_due, day(2026, 2, 18));
    }

    #[test]
    fn test_mark_completed_uses_today() {
        let (scheduler, clock) = scheduler_on(day(2026, 2, 15));
        let mut record = chore("Laundry", 2, day(2026, 3, 30));
        clock.set_day(day(2026, 2, 20));

        scheduler.mark_completed(&mut record);

        assert_eq!(record.last_completed, Some(day(2026, 2, 20)));
        assert_eq!(record.next_due, day(2026, 2, 22));
    }

    #[test]
    fn test_reschedule_then_complete_uses_new_cycle() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let mut record = chore("Vacuum", 7, day(2026, 2, 15));

        scheduler.reschedule(&mut record, day(2026, 3, 1));
        assert_eq!(record.next_due, day(2026, 3, 1));
        assert!(record.last_completed.is_none());

        scheduler.mark_completed_on(&mut record, day(2026, 3, 1));
        assert_eq!(record.next_due, day(2026, 3, 8));
    }

    #[test]
    fn test_consecutive_reschedules_overwrite() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let mut record = chore("Vacuum", 7, day(2026, 2, 15));
        record.last_completed = Some(day(2026, 2, 8));

        scheduler.reschedule(&mut record, day(2026, 2, 20));
        scheduler.reschedule(&mut record, day(2026, 2, 17));

        assert_eq!(record.next_due, day(2026, 2, 17));
        assert_eq!(record.last_completed, Some(day(2026, 2, 8)));
    }

    #[test]
    fn test_adjust_due_date_both_directions() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 1));
        let mut record = chore("Dishes", 1, day(2026, 2, 15));
        scheduler.adjust_due_date(&mut record, 3);
        assert_eq!(record.next_due, day(2026, 2, 18));

        let mut record = chore("Dishes", 1, day(2026, 2, 15));
        scheduler.adjust_due_date(&mut record, -2);
        assert_eq!(record.next_due, day(2026, 2, 13));
    }

    #[test]
    fn test_adjust_due_date_overflow_leaves_record() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 1));
        let mut record = chore("Dishes", 1, NaiveDate::MIN);
        let before = record.clone();
        scheduler.adjust_due_date(&mut record, -1);
        assert_eq!(record, before);
    }

    #[test]
    fn test_filters_partition_mixed_set() {
        let today = day(2026, 2, 15);
        let (scheduler, _) = scheduler_on(today);
        let records = vec![
            chore("yesterday", 7, day(2026, 2, 14)),
            chore("today", 7, today),
            chore("tomorrow", 7, day(2026, 2, 16)),
            chore("three days ago", 7, day(2026, 2, 12)),
        ];

        let overdue: Vec<&str> = scheduler.filter_overdue(&records).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(overdue, vec!["yesterday", "three days ago"]);

        let due_today: Vec<&str> = scheduler.filter_due_today(&records).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(due_today, vec!["today"]);

        let upcoming: Vec<&str> = scheduler.filter_upcoming(&records).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(upcoming, vec!["tomorrow"]);
    }

    #[test]
    fn test_filter_in_range_is_inclusive() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let records = vec![
            chore("before", 7, day(2026, 2, 9)),
            chore("start", 7, day(2026, 2, 10)),
            chore("middle", 7, day(2026, 2, 12)),
            chore("end", 7, day(2026, 2, 14)),
            chore("after", 7, day(2026, 2, 15)),
        ];

        let names: Vec<&str> = scheduler
            .filter_in_range(&records, day(2026, 2, 10), day(2026, 2, 14))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["start", "middle", "end"]);

        assert!(scheduler.filter_in_range(&records, day(2026, 2, 14), day(2026, 2, 10)).is_empty());
    }

    #[test]
    fn test_status_labels() {
        let today = day(2026, 2, 15);
        let (scheduler, _) = scheduler_on(today);

        assert_eq!(scheduler.status_label(&chore("a", 7, today)), "today");
        assert_eq!(scheduler.status_label(&chore("b", 7, day(2026, 2, 18))), "in 3 days");
        assert_eq!(scheduler.status_label(&chore("c", 7, day(2026, 2, 13))), "2 days overdue");
    }

    #[test]
    fn test_days_until_due_sign() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let overdue = chore("a", 7, day(2026, 2, 10));
        assert_eq!(scheduler.days_until_due(&overdue), -5);
        assert!(scheduler.is_overdue(&overdue));
        assert!(!scheduler.is_due_today(&overdue));

        let today = chore("b", 7, day(2026, 2, 15));
        assert!(scheduler.is_due_today(&today));
        assert!(scheduler.is_due_on(day(2026, 2, 15), &today));
    }

    #[test]
    fn test_sort_for_display_puts_overdue_first() {
        let today = day(2026, 2, 15);
        let (scheduler, _) = scheduler_on(today);
        let mut records = vec![
            chore("next week", 7, day(2026, 2, 22)),
            chore("today", 7, today),
            chore("long overdue", 7, day(2025, 11, 1)),
            chore("tomorrow", 7, day(2026, 2, 16)),
            chore("yesterday", 7, day(2026, 2, 14)),
        ];

        scheduler.sort_for_display(&mut records);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["long overdue", "yesterday", "today", "tomorrow", "next week"]);
    }

    #[test]
    fn test_bucketize_sorts_each_bucket() {
        let today = day(2026, 2, 15);
        let (scheduler, _) = scheduler_on(today);
        let records = vec![
            chore("b", 7, day(2026, 2, 20)),
            chore("a", 7, day(2026, 2, 17)),
            chore("y", 7, day(2026, 2, 14)),
            chore("x", 7, day(2026, 2, 1)),
            chore("t", 7, today),
        ];

        let buckets = scheduler.bucketize(&records);
        let names = |v: &Vec<&ChoreRecord>| v.iter().map(|r| r.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&buckets.overdue), vec!["x", "y"]);
        assert_eq!(names(&buckets.today), vec!["t"]);
        assert_eq!(names(&buckets.upcoming), vec!["a", "b"]);
        assert_eq!(buckets.len(), 5);
    }

    #[test]
    fn test_month_grid_leading_blanks() {
        // Feb 1 2026 is a Sunday, Mar 1 2026 is a Sunday, Apr 1 2026 is a Wednesday
        let feb = month_grid(2026, 2);
        assert_eq!(feb.len(), 28);
        assert_eq!(feb[0], Some(day(2026, 2, 1)));

        let apr = month_grid(2026, 4);
        assert_eq!(apr.iter().take_while(|c| c.is_none()).count(), 3);
        assert_eq!(apr.last().copied().flatten(), Some(day(2026, 4, 30)));

        assert!(month_grid(2026, 13).is_empty());
    }

    #[test]
    fn test_shift_month_wraps_years() {
        assert_eq!(shift_month(day(2026, 12, 15), 1), day(2027, 1, 1));
        assert_eq!(shift_month(day(2026, 1, 31), -1), day(2025, 12, 1));
        assert_eq!(shift_month(day(2026, 5, 5), 0), day(2026, 5, 1));
    }

    #[test]
    fn test_chores_on_matches_day() {
        let (scheduler, _) = scheduler_on(day(2026, 2, 15));
        let records = vec![chore("a", 7, day(2026, 2, 20)), chore("b", 7, day(2026, 2, 21))];
        let on = scheduler.chores_on(day(2026, 2, 20), &records);
        assert_eq!(on.len(), 1);
        assert_eq!(on[0].name, "a");
    }
}
