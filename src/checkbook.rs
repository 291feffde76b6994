use std::collections::BTreeMap;

use time::Date;

use crate::config::MAX_CHECKBOOK_WEEKS;
use crate::dates::{add_days, date_key, full_date, midnight_iso};
use crate::error::AppError;
use crate::models::{CheckbookRow, CheckbookView, DayDescriptor, Task};

const OUT_OF_RANGE: AppError = AppError::BadRequest("Week window is out of the supported date range");

/// The Sunday on or before `date`.
pub fn week_start(date: Date) -> Result<Date, AppError> {
    let offset = i64::from(date.weekday().number_days_from_sunday());
    add_days(date, -offset).ok_or(OUT_OF_RANGE)
}

/// Half-open `[start, end)`.
pub fn window(from: Date, weeks_count: u32) -> Result<(Date, Date), AppError> {
    if weeks_count == 0 || weeks_count > MAX_CHECKBOOK_WEEKS {
        return Err(AppError::BadRequest("Weeks count must be between 1 and 52"));
    }
    let start = week_start(from)?;
    let end = add_days(start, i64::from(weeks_count) * 7).ok_or(OUT_OF_RANGE)?;
    Ok((start, end))
}

pub fn days(start: Date, end: Date) -> Vec<DayDescriptor> {
    let mut days = Vec::new();
    let mut day = start;
    while day < end {
        days.push(DayDescriptor {
            date: midnight_iso(day),
            date_key: date_key(day),
            day_name: day.weekday().to_string(),
            full_date: full_date(day),
        });
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

pub fn aggregate(from: Date, weeks_count: u32, tasks: &[Task]) -> Result<CheckbookView, AppError> {
    let (start, end) = window(from, weeks_count)?;
    let days = days(start, end);

    let mut in_window: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.date >= start && t.date < end)
        .collect();
    in_window.sort_by_key(|t| (t.date, t.id));

    let mut rows: BTreeMap<String, CheckbookRow> = BTreeMap::new();
    for task in in_window {
        let row = rows.entry(task.title.clone()).or_insert_with(|| CheckbookRow {
            description: task.description.clone(),
            days: days.iter().map(|d| (d.date_key.clone(), None)).collect(),
        });
        // Sorted by (date, id), so the first instance seen for a day has the lowest id.
        let cell = row.days.entry(date_key(task.date)).or_insert(None);
        if cell.is_none() {
            *cell = Some(task.clone());
        }
    }

    Ok(CheckbookView {
        week_start: start,
        week_end: end,
        days,
        tasks: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use time::macros::date;

    fn task(id: i64, title: &str, date: Date) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: Some(format!("{title} notes")),
            category: None,
            priority: None,
            date,
            status: TaskStatus::Pending,
            is_daily: true,
            recurrence_group_id: None,
            estimated_time: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn gym_january() -> Vec<Task> {
        (0..30)
            .map(|i| task(i + 1, "Gym", add_days(date!(2026 - 01 - 01), i).unwrap()))
            .collect()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2026-01-04 is a Sunday.
        assert_eq!(week_start(date!(2026 - 01 - 04)).unwrap(), date!(2026 - 01 - 04));
        assert_eq!(week_start(date!(2026 - 01 - 07)).unwrap(), date!(2026 - 01 - 04));
        assert_eq!(week_start(date!(2026 - 01 - 10)).unwrap(), date!(2026 - 01 - 04));
        assert_eq!(week_start(date!(2026 - 01 - 01)).unwrap(), date!(2025 - 12 - 28));
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(
            window(date!(2026 - 01 - 06), 2).unwrap(),
            (date!(2026 - 01 - 04), date!(2026 - 01 - 18))
        );
        assert!(window(date!(2026 - 01 - 06), 0).is_err());
        assert!(window(date!(2026 - 01 - 06), MAX_CHECKBOOK_WEEKS + 1).is_err());
    }

    #[test]
    fn test_day_descriptors() {
        let days = days(date!(2026 - 01 - 04), date!(2026 - 01 - 18));
        assert_eq!(days.len(), 14);
        assert_eq!(
            days[0],
            DayDescriptor {
                date: "2026-01-04T00:00:00Z".to_string(),
                date_key: "2026-01-04".to_string(),
                day_name: "Sunday".to_string(),
                full_date: "January 4, 2026".to_string(),
            }
        );
        assert_eq!(days[6].day_name, "Saturday");
        assert_eq!(days[13].date_key, "2026-01-17");
    }

    #[test]
    fn test_gym_two_weeks() {
        let view = aggregate(date!(2026 - 01 - 04), 2, &gym_january()).unwrap();
        assert_eq!(view.week_start, date!(2026 - 01 - 04));
        assert_eq!(view.week_end, date!(2026 - 01 - 18));
        assert_eq!(view.tasks.len(), 1);

        let row = &view.tasks["Gym"];
        assert_eq!(row.description.as_deref(), Some("Gym notes"));
        assert_eq!(row.days.len(), 14);
        for (key, cell) in &row.days {
            let cell = cell.as_ref().unwrap();
            assert_eq!(&date_key(cell.date), key);
        }
    }

    #[test]
    fn test_gaps_where_series_ends() {
        // Series covers 01-01..01-30; the window runs 01-25..02-07.
        let view = aggregate(date!(2026 - 01 - 25), 2, &gym_january()).unwrap();
        let row = &view.tasks["Gym"];
        assert_eq!(row.days.len(), 14);
        assert_eq!(row.days.values().filter(|c| c.is_some()).count(), 6);
        assert!(row.days["2026-01-30"].is_some());
        assert!(row.days["2026-01-31"].is_none());
        assert!(row.days["2026-02-07"].is_none());
    }

    #[test]
    fn test_grouping_by_title() {
        let tasks = vec![
            task(1, "Read", date!(2026 - 01 - 05)),
            task(2, "Read", date!(2026 - 01 - 07)),
            task(3, "read", date!(2026 - 01 - 07)),
        ];
        let view = aggregate(date!(2026 - 01 - 05), 1, &tasks).unwrap();
        assert_eq!(view.tasks.len(), 2);

        let read = &view.tasks["Read"];
        assert_eq!(read.days.values().filter(|c| c.is_some()).count(), 2);
        assert_eq!(read.days["2026-01-05"].as_ref().unwrap().id, 1);
        assert_eq!(read.days["2026-01-07"].as_ref().unwrap().id, 2);
        assert_eq!(view.tasks["read"].days.values().filter(|c| c.is_some()).count(), 1);
    }

    #[test]
    fn test_duplicate_day_keeps_lowest_id() {
        let tasks = vec![
            task(9, "Walk", date!(2026 - 01 - 06)),
            task(4, "Walk", date!(2026 - 01 - 06)),
        ];
        let view = aggregate(date!(2026 - 01 - 04), 1, &tasks).unwrap();
        assert_eq!(view.tasks["Walk"].days["2026-01-06"].as_ref().unwrap().id, 4);
    }

    #[test]
    fn test_empty_window_has_days() {
        let view = aggregate(date!(2026 - 06 - 01), 4, &gym_january()).unwrap();
        assert!(view.tasks.is_empty());
        assert_eq!(view.days.len(), 28);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let mut tasks = gym_january();
        tasks.push(task(100, "Stretch", date!(2026 - 01 - 06)));
        let first = aggregate(date!(2026 - 01 - 04), 2, &tasks).unwrap();
        tasks.reverse();
        let second = aggregate(date!(2026 - 01 - 04), 2, &tasks).unwrap();
        assert_eq!(first, second);
    }
}
