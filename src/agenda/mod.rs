//! List logic behind the task views: day filtering, grouping by calendar day
//! and the "due now" mark. Everything here works on a fully loaded collection
//! and takes the caller's clock as a `DateTime<FixedOffset>`; the offset is
//! what defines where a calendar day starts.

use std::ops::RangeInclusive;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Timelike, Utc,
};
use indexmap::IndexMap;

use crate::{
    models::Task,
    schema::{DayGroup, TaskFilter, TaskView},
};

pub mod stats;

/// Calendar years a task date may fall in. Inside this range converting a
/// stored instant into any valid offset cannot overflow.
pub const TASK_YEARS: RangeInclusive<i32> = 1..=9999;

/// Midnight of `day` in `offset`, as a UTC instant. `None` when the day lies
/// outside [`TASK_YEARS`].
pub fn local_midnight(day: NaiveDate, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    if !TASK_YEARS.contains(&day.year()) {
        return None;
    }
    let shift = TimeDelta::seconds(offset.local_minus_utc() as i64);
    let naive = day.and_time(NaiveTime::MIN).checked_sub_signed(shift)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// `[midnight, next midnight)` of the day `now` falls on.
pub fn day_bounds(now: &DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let since_midnight = now.time() - NaiveTime::MIN;
    let start = now.with_timezone(&Utc) - since_midnight;
    (start, start + TimeDelta::days(1))
}

/// Calendar day of a task in the given offset.
pub fn task_day(task: &Task, offset: &FixedOffset) -> NaiveDate {
    task.date.with_timezone(offset).date_naive()
}

pub fn day_label(day: NaiveDate) -> String {
    day.format("%-d-%-m-%Y").to_string()
}

fn sort_by_time_of_day(tasks: &mut [Task]) {
    tasks.sort_by_key(Task::minute_of_day);
}

/// Applies a list filter.
///
/// `Today` keeps tasks dated inside the current local day and orders them by
/// time of day. `All` keeps everything and orders by the full date. Both sorts
/// are stable, ties keep store order.
pub fn filter_tasks(
    mut tasks: Vec<Task>,
    filter: TaskFilter,
    now: &DateTime<FixedOffset>,
) -> Vec<Task> {
    match filter {
        TaskFilter::Today => {
            let (start, end) = day_bounds(now);
            tasks.retain(|task| task.date >= start && task.date < end);
            sort_by_time_of_day(&mut tasks);
        }
        TaskFilter::All => tasks.sort_by_key(|task| task.date),
    }
    tasks
}

/// Buckets tasks by calendar day. Buckets keep the order in which their first
/// task appears in the input; members are ordered by time of day.
pub fn group_by_date(tasks: Vec<Task>, offset: &FixedOffset) -> IndexMap<NaiveDate, Vec<Task>> {
    let mut groups: IndexMap<NaiveDate, Vec<Task>> = IndexMap::new();
    for task in tasks {
        groups.entry(task_day(&task, offset)).or_default().push(task);
    }
    for bucket in groups.values_mut() {
        sort_by_time_of_day(bucket);
    }
    groups
}

/// A task is due when it is planned for today and its time of day has
/// already been reached.
pub fn is_due_now(task: &Task, now: &DateTime<FixedOffset>) -> bool {
    let same_day = task_day(task, now.offset()) == now.date_naive();
    let now_minutes = now.hour() * 60 + now.minute();
    same_day && task.date < now.with_timezone(&Utc) && task.minute_of_day() <= now_minutes
}

pub fn to_views(tasks: Vec<Task>, now: &DateTime<FixedOffset>) -> Vec<TaskView> {
    tasks
        .into_iter()
        .map(|task| TaskView {
            due: is_due_now(&task, now),
            task,
        })
        .collect()
}

/// Filter, then group by day: the shape the list screen renders.
pub fn build_agenda(
    tasks: Vec<Task>,
    filter: TaskFilter,
    now: &DateTime<FixedOffset>,
) -> Vec<DayGroup> {
    let filtered = filter_tasks(tasks, filter, now);
    group_by_date(filtered, now.offset())
        .into_iter()
        .map(|(date, tasks)| DayGroup {
            date,
            label: day_label(date),
            tasks: to_views(tasks, now),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Priority;

    fn kyiv() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        kyiv().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn task(id: &str, day: NaiveDate, hours: u8, minutes: u8) -> Task {
        let mut t = Task::new(
            format!("task {id}"),
            local_midnight(day, &kyiv()).unwrap(),
            hours,
            minutes,
            Priority::Medium,
        );
        t.id = id.to_string();
        t
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn local_midnight_accounts_for_offset() {
        let midnight = local_midnight(day(10, 18), &kyiv()).unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2026, 10, 17, 21, 0, 0).unwrap());
    }

    #[test]
    fn local_midnight_refuses_days_outside_the_year_range() {
        let far_east = FixedOffset::east_opt(14 * 3600).unwrap();
        let far_west = FixedOffset::west_opt(14 * 3600).unwrap();
        assert!(local_midnight(NaiveDate::MIN, &far_east).is_none());
        assert!(local_midnight(NaiveDate::MAX, &far_west).is_none());
        assert!(local_midnight(NaiveDate::from_ymd_opt(0, 12, 31).unwrap(), &kyiv()).is_none());
        assert!(local_midnight(NaiveDate::from_ymd_opt(10000, 1, 1).unwrap(), &kyiv()).is_none());
    }

    #[test]
    fn edge_years_stay_readable_from_any_offset() {
        let far_east = FixedOffset::east_opt(14 * 3600).unwrap();
        let far_west = FixedOffset::west_opt(14 * 3600).unwrap();
        let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        let mut early = task("early", day(10, 18), 0, 0);
        early.date = local_midnight(first, &far_east).unwrap();
        let mut late = task("late", day(10, 18), 0, 0);
        late.date = local_midnight(last, &far_west).unwrap();

        assert_eq!(task_day(&early, &far_west), NaiveDate::from_ymd_opt(0, 12, 30).unwrap());
        assert_eq!(task_day(&late, &far_east), NaiveDate::from_ymd_opt(10000, 1, 1).unwrap());
        let now = at(2026, 10, 18, 10, 0);
        assert_eq!(build_agenda(vec![early, late], TaskFilter::All, &now).len(), 2);
    }

    #[test]
    fn day_bounds_match_local_midnights() {
        let now = at(2026, 10, 18, 17, 42);
        let (start, end) = day_bounds(&now);
        assert_eq!(start, local_midnight(day(10, 18), &kyiv()).unwrap());
        assert_eq!(end, local_midnight(day(10, 19), &kyiv()).unwrap());
    }

    #[test]
    fn today_keeps_only_current_day_sorted_by_time() {
        let now = at(2026, 10, 18, 12, 0);
        let tasks = vec![
            task("late", day(10, 18), 18, 30),
            task("yesterday", day(10, 17), 9, 0),
            task("early", day(10, 18), 7, 5),
            task("tomorrow", day(10, 19), 8, 0),
            task("noon", day(10, 18), 12, 0),
        ];
        let today = filter_tasks(tasks, TaskFilter::Today, &now);
        assert_eq!(ids(&today), vec!["early", "noon", "late"]);
    }

    #[test]
    fn today_includes_midnight_and_excludes_next_midnight() {
        let now = at(2026, 10, 18, 23, 59);
        let mut on_start = task("start", day(10, 18), 0, 0);
        on_start.date = local_midnight(day(10, 18), &kyiv()).unwrap();
        let mut on_end = task("end", day(10, 18), 0, 0);
        on_end.date = local_midnight(day(10, 19), &kyiv()).unwrap();
        let today = filter_tasks(vec![on_start, on_end], TaskFilter::Today, &now);
        assert_eq!(ids(&today), vec!["start"]);
    }

    #[test]
    fn all_sorts_by_date_and_keeps_store_order_for_ties() {
        let now = at(2026, 10, 18, 12, 0);
        let tasks = vec![
            task("c", day(10, 20), 8, 0),
            task("a1", day(10, 1), 23, 0),
            task("b", day(10, 18), 6, 0),
            task("a2", day(10, 1), 1, 0),
        ];
        let all = filter_tasks(tasks, TaskFilter::All, &now);
        assert_eq!(ids(&all), vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn grouping_orders_buckets_by_first_appearance_and_members_by_time() {
        let tasks = vec![
            task("d2-late", day(10, 2), 20, 0),
            task("d1", day(10, 1), 9, 0),
            task("d2-early", day(10, 2), 6, 15),
            task("d2-mid", day(10, 2), 6, 45),
        ];
        let groups = group_by_date(tasks, &kyiv());
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![day(10, 2), day(10, 1)]);
        assert_eq!(ids(&groups[&day(10, 2)]), vec!["d2-early", "d2-mid", "d2-late"]);
    }

    #[test]
    fn grouping_uses_the_callers_calendar() {
        let t = task("x", day(10, 18), 0, 30);
        let utc = FixedOffset::east_opt(0).unwrap();
        // Kyiv midnight is still the previous day in UTC.
        assert_eq!(task_day(&t, &kyiv()), day(10, 18));
        assert_eq!(task_day(&t, &utc), day(10, 17));
    }

    #[test]
    fn labels_use_one_based_months() {
        assert_eq!(day_label(day(1, 5)), "5-1-2026");
        assert_eq!(day_label(day(12, 31)), "31-12-2026");
    }

    #[test]
    fn due_when_today_and_time_reached() {
        let now = at(2026, 10, 18, 14, 30);
        assert!(is_due_now(&task("past", day(10, 18), 9, 0), &now));
        assert!(is_due_now(&task("exact", day(10, 18), 14, 30), &now));
        assert!(!is_due_now(&task("later", day(10, 18), 14, 31), &now));
        assert!(!is_due_now(&task("yesterday", day(10, 17), 9, 0), &now));
        assert!(!is_due_now(&task("tomorrow", day(10, 19), 9, 0), &now));
    }

    #[test]
    fn agenda_for_all_groups_every_day() {
        let now = at(2026, 10, 18, 10, 0);
        let tasks = vec![
            task("b", day(10, 19), 8, 0),
            task("a-late", day(10, 18), 22, 0),
            task("a-early", day(10, 18), 7, 0),
        ];
        let groups = build_agenda(tasks, TaskFilter::All, &now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "18-10-2026");
        let first: Vec<_> = groups[0].tasks.iter().map(|v| (v.task.id.as_str(), v.due)).collect();
        assert_eq!(first, vec![("a-early", true), ("a-late", false)]);
        assert_eq!(groups[1].date, day(10, 19));
    }

    #[test]
    fn empty_collection_gives_empty_agenda() {
        let now = at(2026, 10, 18, 10, 0);
        assert!(build_agenda(Vec::new(), TaskFilter::Today, &now).is_empty());
        assert!(filter_tasks(Vec::new(), TaskFilter::All, &now).is_empty());
    }
}
