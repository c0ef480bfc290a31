use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::planning::PlanningRecord;
use crate::report::calendar::{self, Locale};

/// The fixed template carries 31 day rows; shorter months leave the tail
/// blank.
pub const SHEET_DAY_ROWS: u32 = 31;

/// Task text depends only on the weekend flag, never on the shift number.
pub const WEEKDAY_TASK: &str = "Supervision quotidienne";
pub const WEEKEND_TASK: &str = "Monitoring du week-end";
pub const ABSENT_TASK: &str = "Absent";

static SHIFT_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)shift\s*([0-2])").unwrap());

/// One row of the presence sheet's day table.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySlot {
    pub day: u32,
    pub weekend: bool,
    /// Parsed from the planning label. Carried for diagnostics only; task
    /// selection deliberately ignores it.
    pub shift: Option<u8>,
    pub absent: bool,
    pub date_label: String,
    pub task_text: String,
    pub time_text: String,
}

impl DaySlot {
    fn blank(day: u32) -> Self {
        Self {
            day,
            weekend: false,
            shift: None,
            absent: false,
            date_label: String::new(),
            task_text: String::new(),
            time_text: String::new(),
        }
    }

    /// Slots past the month's length render empty date/task/time cells.
    pub fn is_blank(&self) -> bool {
        self.date_label.is_empty() && self.task_text.is_empty() && self.time_text.is_empty()
    }
}

pub async fn month_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, status,
               work_hours, overtime_hours, notes,
               check_in_latitude, check_in_longitude,
               check_out_latitude, check_out_longitude
        FROM attendance_records
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Planning rows are matched by id OR code: rows imported before the
/// employee existed in the user store are linked by code only.
pub async fn month_planning(
    pool: &MySqlPool,
    employee_id: u64,
    employee_code: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PlanningRecord>, sqlx::Error> {
    sqlx::query_as::<_, PlanningRecord>(
        r#"
        SELECT id, employee_id, employee_code, employee_name, date, shift,
               start_time, end_time, break_minutes, batch_id, uploaded_by, notes
        FROM planning_records
        WHERE (employee_id = ? OR employee_code = ?) AND date BETWEEN ? AND ?
        ORDER BY date, id
        "#,
    )
    .bind(employee_id)
    .bind(employee_code)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Joins one month of attendance and planning into the 31 day slots of the
/// sheet. Both inputs must already be scoped to the month; only then is
/// keying by day-of-month safe.
pub fn month_grid(
    year: i32,
    month: u32,
    attendance: &[AttendanceRecord],
    planning: &[PlanningRecord],
    locale: &Locale,
) -> Vec<DaySlot> {
    let month_len = calendar::days_in_month(year, month).unwrap_or(0);

    let mut attendance_by_day: HashMap<u32, &AttendanceRecord> = HashMap::new();
    for record in attendance {
        attendance_by_day.insert(record.date.day(), record);
    }
    // Re-imports can leave several rows on one day; the latest inserted
    // (highest id, last in the ordered result) wins.
    let mut planning_by_day: HashMap<u32, &PlanningRecord> = HashMap::new();
    for record in planning {
        planning_by_day.insert(record.date.day(), record);
    }

    (1..=SHEET_DAY_ROWS)
        .map(|day| {
            if day > month_len {
                return DaySlot::blank(day);
            }
            let date = match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) => date,
                None => return DaySlot::blank(day),
            };
            let weekend = calendar::is_weekend(date);
            let record = attendance_by_day.get(&day).copied();
            let plan = planning_by_day.get(&day).copied();

            let absent = record.is_some_and(|r| r.status == AttendanceStatus::Absent);
            let shift = plan.and_then(|p| shift_index(&p.shift));

            let (task_text, time_text) = if absent {
                // Absence short-circuits task and time derivation entirely.
                (ABSENT_TASK.to_string(), String::new())
            } else {
                let task = match shift {
                    Some(_) if weekend => WEEKEND_TASK.to_string(),
                    Some(_) => WEEKDAY_TASK.to_string(),
                    None => String::new(),
                };
                let time = record.map(time_range_text).unwrap_or_default();
                (task, time)
            };

            DaySlot {
                day,
                weekend,
                shift,
                absent,
                date_label: date_label(day, weekend, date, locale),
                task_text,
                time_text,
            }
        })
        .collect()
}

/// "Shift 0/1/2" in any casing; anything else counts as unassigned.
pub fn shift_index(label: &str) -> Option<u8> {
    SHIFT_LABEL_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn time_range_text(record: &AttendanceRecord) -> String {
    match (record.check_in, record.check_out) {
        (Some(check_in), Some(check_out)) => format!(
            "{} - {}",
            check_in.format("%H:%M"),
            check_out.format("%H:%M")
        ),
        _ => String::new(),
    }
}

fn date_label(day: u32, weekend: bool, date: NaiveDate, locale: &Locale) -> String {
    if weekend {
        format!("{:02} du mois ({})", day, locale.weekday_name(date.weekday()))
    } else {
        format!("{:02} du mois", day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn stamp(day: u32, h: u32, m: u32) -> NaiveDateTime {
        date(day).and_hms_opt(h, m, 0).unwrap()
    }

    fn attendance(
        day: u32,
        check_in: Option<(u32, u32)>,
        check_out: Option<(u32, u32)>,
        status: AttendanceStatus,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: day as u64,
            employee_id: 1000,
            date: date(day),
            check_in: check_in.map(|(h, m)| stamp(day, h, m)),
            check_out: check_out.map(|(h, m)| stamp(day, h, m)),
            status,
            work_hours: 0.0,
            overtime_hours: 0.0,
            notes: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_out_latitude: None,
            check_out_longitude: None,
        }
    }

    fn planning(id: u64, day: u32, shift: &str) -> PlanningRecord {
        PlanningRecord {
            id,
            employee_id: Some(1000),
            employee_code: "EMP007".to_string(),
            employee_name: "Awa Diallo".to_string(),
            date: date(day),
            shift: shift.to_string(),
            start_time: "06:00".to_string(),
            end_time: "14:00".to_string(),
            break_minutes: 0,
            batch_id: None,
            uploaded_by: None,
            notes: None,
        }
    }

    fn february_grid(
        attendance: &[AttendanceRecord],
        planning: &[PlanningRecord],
    ) -> Vec<DaySlot> {
        month_grid(2026, 2, attendance, planning, &Locale::french())
    }

    #[test]
    fn emp007_february_scenario() {
        let attendance = vec![
            attendance(10, Some((6, 5)), Some((14, 10)), AttendanceStatus::Present),
            attendance(20, None, None, AttendanceStatus::Absent),
        ];
        let planning = vec![
            planning(1, 10, "Shift 1"),
            planning(2, 14, "Shift 0"),
            planning(3, 20, "Shift 2"),
        ];
        let grid = february_grid(&attendance, &planning);
        assert_eq!(grid.len(), SHEET_DAY_ROWS as usize);

        // Day 10: Tuesday with a full attendance pair and a parsed shift.
        let day10 = &grid[9];
        assert_eq!(day10.date_label, "10 du mois");
        assert_eq!(day10.time_text, "06:05 - 14:10");
        assert_eq!(day10.task_text, WEEKDAY_TASK);
        assert_eq!(day10.shift, Some(1));
        assert!(!day10.weekend);

        // Day 14: Saturday, planned but never attended.
        let day14 = &grid[13];
        assert_eq!(day14.date_label, "14 du mois (Samedi)");
        assert_eq!(day14.time_text, "");
        assert_eq!(day14.task_text, WEEKEND_TASK);

        // Day 20: absence wins over the planning row.
        let day20 = &grid[19];
        assert_eq!(day20.task_text, ABSENT_TASK);
        assert_eq!(day20.time_text, "");
        assert!(day20.absent);
    }

    #[test]
    fn february_has_three_blank_tail_slots() {
        let grid = february_grid(&[], &[]);
        let blank = grid.iter().filter(|slot| slot.is_blank()).count();
        assert_eq!(blank, 3);
        assert!(grid[..28].iter().all(|slot| !slot.date_label.is_empty()));
        assert!(grid[28..].iter().all(|slot| slot.is_blank()));
    }

    #[test]
    fn no_planning_row_means_empty_task() {
        let attendance = vec![attendance(
            10,
            Some((9, 0)),
            Some((17, 0)),
            AttendanceStatus::Present,
        )];
        let grid = february_grid(&attendance, &[]);
        assert_eq!(grid[9].task_text, "");
        assert_eq!(grid[9].time_text, "09:00 - 17:00");
    }

    #[test]
    fn unparsable_shift_label_means_empty_task() {
        let planning = vec![planning(1, 10, "Repos")];
        let grid = february_grid(&[], &planning);
        assert_eq!(grid[9].shift, None);
        assert_eq!(grid[9].task_text, "");
    }

    #[test]
    fn open_day_has_no_time_text() {
        let attendance = vec![attendance(10, Some((9, 0)), None, AttendanceStatus::Present)];
        let grid = february_grid(&attendance, &[]);
        assert_eq!(grid[9].time_text, "");
    }

    #[test]
    fn last_planning_row_wins_for_a_day() {
        let first_import = vec![planning(1, 10, "Shift 0"), planning(2, 10, "Repos")];
        let grid = february_grid(&[], &first_import);
        assert_eq!(grid[9].shift, None);

        let second_import = vec![planning(1, 10, "Repos"), planning(2, 10, "Shift 2")];
        let grid = february_grid(&[], &second_import);
        assert_eq!(grid[9].shift, Some(2));
    }

    #[test]
    fn grid_is_deterministic() {
        let attendance = vec![attendance(
            10,
            Some((6, 5)),
            Some((14, 10)),
            AttendanceStatus::Present,
        )];
        let planning = vec![planning(1, 10, "Shift 1")];
        assert_eq!(
            february_grid(&attendance, &planning),
            february_grid(&attendance, &planning)
        );
    }

    #[test]
    fn shift_label_parsing() {
        assert_eq!(shift_index("Shift 0"), Some(0));
        assert_eq!(shift_index("shift 1"), Some(1));
        assert_eq!(shift_index("SHIFT 2"), Some(2));
        assert_eq!(shift_index("Shift2"), Some(2));
        assert_eq!(shift_index("Shift 3"), None);
        assert_eq!(shift_index("Repos"), None);
        assert_eq!(shift_index(""), None);
    }
}
