//! Disk layout and catalog rows for generated sheets.
//!
//! Files land under `<root>/presence/<year>-<month>/` and each (employee,
//! period) pair owns exactly one catalog row, refreshed on regeneration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use sqlx::MySqlPool;

use crate::error::AppError;
use crate::model::employee::Employee;
use crate::model::presence_sheet::PresenceSheetRecord;

pub fn sheet_file_name(employee_code: &str, year: i32, month: u32) -> String {
    format!("Feuille_de_presence_{employee_code}_{year}-{month:02}.xlsx")
}

pub fn sheet_path(storage_root: &Path, employee_code: &str, year: i32, month: u32) -> PathBuf {
    storage_root
        .join("presence")
        .join(format!("{year}-{month:02}"))
        .join(sheet_file_name(employee_code, year, month))
}

/// Writes the file and upserts its catalog row. Regenerating a period
/// overwrites both, so the catalog never points at a stale copy.
pub async fn store_sheet(
    pool: &MySqlPool,
    storage_root: &Path,
    employee: &Employee,
    year: i32,
    month: u32,
    generated_by: Option<u64>,
    bytes: &[u8],
) -> Result<PresenceSheetRecord, AppError> {
    let path = sheet_path(storage_root, &employee.employee_code, year, month);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;

    sqlx::query(
        r#"
        INSERT INTO presence_sheets
            (employee_id, year, month, file_name, file_path, generated_by, generated_at, file_size)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            file_name = VALUES(file_name),
            file_path = VALUES(file_path),
            generated_by = VALUES(generated_by),
            generated_at = VALUES(generated_at),
            file_size = VALUES(file_size)
        "#,
    )
    .bind(employee.id)
    .bind(year)
    .bind(month)
    .bind(sheet_file_name(&employee.employee_code, year, month))
    .bind(path.to_string_lossy().into_owned())
    .bind(generated_by)
    .bind(Local::now().naive_local())
    .bind(bytes.len() as u64)
    .execute(pool)
    .await?;

    find_record(pool, employee.id, year, month)
        .await?
        .ok_or_else(|| AppError::NotFound("Presence sheet record not found after save".to_string()))
}

pub async fn find_record(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
    month: u32,
) -> Result<Option<PresenceSheetRecord>, sqlx::Error> {
    sqlx::query_as::<_, PresenceSheetRecord>(
        r#"
        SELECT id, employee_id, year, month, file_name, file_path,
               generated_by, generated_at, file_size
        FROM presence_sheets
        WHERE employee_id = ? AND year = ? AND month = ?
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .bind(month)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(
    pool: &MySqlPool,
    record_id: u64,
) -> Result<Option<PresenceSheetRecord>, sqlx::Error> {
    sqlx::query_as::<_, PresenceSheetRecord>(
        r#"
        SELECT id, employee_id, year, month, file_name, file_path,
               generated_by, generated_at, file_size
        FROM presence_sheets
        WHERE id = ?
        "#,
    )
    .bind(record_id)
    .fetch_optional(pool)
    .await
}

/// The catalog row can outlive its file (wiped volume, moved storage root).
pub fn read_sheet_file(record: &PresenceSheetRecord) -> Result<Vec<u8>, AppError> {
    fs::read(&record.file_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound("Stored file not found on disk. Please regenerate.".to_string())
        } else {
            AppError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_zero_pads_the_month() {
        assert_eq!(
            sheet_file_name("EMP007", 2026, 2),
            "Feuille_de_presence_EMP007_2026-02.xlsx"
        );
        assert_eq!(
            sheet_file_name("EMP007", 2026, 11),
            "Feuille_de_presence_EMP007_2026-11.xlsx"
        );
    }

    #[test]
    fn sheets_are_grouped_by_period_directory() {
        let path = sheet_path(Path::new("storage"), "EMP007", 2026, 2);
        assert_eq!(
            path,
            Path::new("storage")
                .join("presence")
                .join("2026-02")
                .join("Feuille_de_presence_EMP007_2026-02.xlsx")
        );
    }

    #[test]
    fn missing_file_reports_regeneration_hint() {
        let record = PresenceSheetRecord {
            id: 1,
            employee_id: 7,
            year: 2026,
            month: 2,
            file_name: "Feuille_de_presence_EMP007_2026-02.xlsx".to_string(),
            file_path: "storage/presence/2026-02/nonexistent-for-test.xlsx".to_string(),
            generated_by: None,
            generated_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            file_size: 0,
        };
        match read_sheet_file(&record) {
            Err(AppError::NotFound(message)) => {
                assert_eq!(message, "Stored file not found on disk. Please regenerate.")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
