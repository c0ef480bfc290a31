use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bookkeeping row for a generated presence sheet, unique per
/// (employee_id, year, month). Regeneration overwrites both the row and the
/// file it points at.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "employee_id": 1000,
        "year": 2026,
        "month": 2,
        "file_name": "Feuille_de_presence_EMP007_2026-02.xlsx",
        "file_path": "storage/presence/2026-02/Feuille_de_presence_EMP007_2026-02.xlsx",
        "generated_by": 7,
        "generated_at": "2026-03-02T09:12:44",
        "file_size": 18842
    })
)]
pub struct PresenceSheetRecord {
    pub id: u64,
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
    pub file_name: String,
    pub file_path: String,
    #[schema(nullable = true)]
    pub generated_by: Option<u64>,
    #[schema(value_type = String)]
    pub generated_at: NaiveDateTime,
    pub file_size: u64,
}
