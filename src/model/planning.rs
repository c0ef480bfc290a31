use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 24-hour HH:mm, the only accepted form for shift start/end times.
static SHIFT_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap());

/// One calendar day's assigned shift for one employee. Rows created before
/// the employee exists in the user store carry a NULL employee_id and are
/// linked later by code.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PlanningRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,

    #[schema(example = "EMP007")]
    pub employee_code: String,

    #[schema(example = "Awa Diallo")]
    pub employee_name: String,

    #[schema(example = "2026-02-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Shift 1")]
    pub shift: String,

    #[schema(example = "06:00")]
    pub start_time: String,

    #[schema(example = "14:00")]
    pub end_time: String,

    #[schema(example = 30)]
    pub break_minutes: u32,

    #[schema(example = "0b8a4a9e-3a44-4d53-8f2e-0d41c8b2a671", nullable = true)]
    pub batch_id: Option<String>,

    #[schema(example = 7, nullable = true)]
    pub uploaded_by: Option<u64>,

    #[schema(nullable = true)]
    pub notes: Option<String>,
}

pub fn is_valid_shift_time(value: &str) -> bool {
    SHIFT_TIME_RE.is_match(value)
}

/// Planning rows key employees by uppercased code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_time_pattern() {
        for ok in ["00:00", "06:00", "09:15", "19:59", "23:59"] {
            assert!(is_valid_shift_time(ok), "{ok} should be accepted");
        }
        for bad in ["24:00", "9:00", "09:60", "09h00", "0900", "09:00:00", "", " 09:00"] {
            assert!(!is_valid_shift_time(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn codes_are_uppercased_and_trimmed() {
        assert_eq!(normalize_code(" emp007 "), "EMP007");
        assert_eq!(normalize_code("EMP007"), "EMP007");
    }
}
