use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Hours of a nominal working day; time beyond it counts as overtime.
pub const STANDARD_DAY_HOURS: f64 = 8.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
    ToSchema,
)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
    PendingAbsence,
}

/// One calendar day's presence for one employee. At most one row per
/// (employee_id, date); the unique key in the schema enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = "2026-02-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2026-02-10T06:05:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveDateTime>,

    #[schema(example = "2026-02-10T14:10:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveDateTime>,

    #[schema(example = "present")]
    pub status: AttendanceStatus,

    #[schema(example = 8.08)]
    pub work_hours: f64,

    #[schema(example = 0.08)]
    pub overtime_hours: f64,

    #[schema(nullable = true)]
    pub notes: Option<String>,

    #[schema(nullable = true)]
    pub check_in_latitude: Option<f64>,

    #[schema(nullable = true)]
    pub check_in_longitude: Option<f64>,

    #[schema(nullable = true)]
    pub check_out_latitude: Option<f64>,

    #[schema(nullable = true)]
    pub check_out_longitude: Option<f64>,
}

/// Derived (work_hours, overtime_hours) for a closed day. Never negative,
/// rounded to 2 decimals.
pub fn computed_hours(check_in: NaiveDateTime, check_out: NaiveDateTime) -> (f64, f64) {
    let span = check_out.signed_duration_since(check_in).num_seconds() as f64 / 3600.0;
    let worked = round2(span.max(0.0));
    let overtime = round2((worked - STANDARD_DAY_HOURS).max(0.0));
    (worked, overtime)
}

/// Status a fresh check-in gets: `late` strictly after the cutoff.
pub fn status_for_check_in(at: NaiveDateTime, late_cutoff: NaiveTime) -> AttendanceStatus {
    if at.time() > late_cutoff {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Check-out notes are appended to check-in notes with a `"; "` separator.
pub fn merge_notes(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match (existing, incoming) {
        (Some(a), Some(b)) => Some(format!("{}; {}", a, b)),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn hours_rounded_to_two_decimals() {
        // 06:05 -> 14:10 is 8h05, i.e. 8.0833...
        let (worked, overtime) = computed_hours(ts(6, 5), ts(14, 10));
        assert_eq!(worked, 8.08);
        assert_eq!(overtime, 0.08);
    }

    #[test]
    fn exact_standard_day_has_no_overtime() {
        let (worked, overtime) = computed_hours(ts(9, 0), ts(17, 0));
        assert_eq!(worked, 8.0);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn short_day_has_no_overtime() {
        let (worked, overtime) = computed_hours(ts(9, 0), ts(13, 30));
        assert_eq!(worked, 4.5);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn inverted_span_clamps_to_zero() {
        let (worked, overtime) = computed_hours(ts(14, 0), ts(9, 0));
        assert_eq!(worked, 0.0);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn late_only_strictly_after_cutoff() {
        let cutoff = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
        assert_eq!(status_for_check_in(ts(9, 15), cutoff), AttendanceStatus::Present);
        assert_eq!(status_for_check_in(ts(9, 16), cutoff), AttendanceStatus::Late);
        assert_eq!(status_for_check_in(ts(6, 5), cutoff), AttendanceStatus::Present);
    }

    #[test]
    fn notes_merge_with_separator() {
        assert_eq!(
            merge_notes(Some("client site"), Some("left early")),
            Some("client site; left early".to_string())
        );
        assert_eq!(merge_notes(Some("client site"), None), Some("client site".to_string()));
        assert_eq!(merge_notes(None, Some("left early")), Some("left early".to_string()));
        assert_eq!(merge_notes(None, None), None);
    }

    #[test]
    fn status_round_trips_kebab_case() {
        use std::str::FromStr;

        assert_eq!(AttendanceStatus::PendingAbsence.to_string(), "pending-absence");
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half-day");
        assert_eq!(
            AttendanceStatus::from_str("on-leave").unwrap(),
            AttendanceStatus::OnLeave
        );
        assert!(AttendanceStatus::from_str("vacation").is_err());
    }
}
