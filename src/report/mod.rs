//! Monthly presence sheet generation.
//!
//! A generation run pulls one month of attendance and planning rows,
//! reconciles them into 31 day slots, renders the xlsx template and stores
//! the result on disk plus one catalog row per (employee, period).

pub mod calendar;
pub mod reconcile;
pub mod storage;
pub mod template;

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppError;
use crate::model::employee::{self, Employee};
use crate::model::presence_sheet::PresenceSheetRecord;
use crate::report::calendar::Locale;
use crate::report::template::PresenceTemplate;

pub struct GeneratedSheet {
    pub record: PresenceSheetRecord,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkFailure {
    pub employee_code: String,
    pub employee_name: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkSummary {
    pub year: i32,
    pub month: u32,
    pub attempted: usize,
    pub generated: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

/// French sheets carry the name family-name first.
fn provider_name(employee: &Employee) -> String {
    format!("{} {}", employee.last_name, employee.first_name)
}

fn month_span(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    calendar::month_bounds(year, month)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid period {year}-{month:02}")))
}

/// The period is validated before anything is looked up, so a bogus month
/// reads as a bad request even when the employee is missing too.
pub async fn generate_for_employee(
    pool: &MySqlPool,
    config: &Config,
    employee_id: u64,
    year: i32,
    month: u32,
    generated_by: Option<u64>,
) -> Result<GeneratedSheet, AppError> {
    month_span(year, month)?;
    let employee = employee::find_by_id(pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))?;
    let template = PresenceTemplate::load(Path::new(&config.template_path))?;
    generate_and_store(pool, config, &template, &employee, year, month, generated_by).await
}

/// The template is taken by reference so bulk runs parse it once.
pub async fn generate_and_store(
    pool: &MySqlPool,
    config: &Config,
    template: &PresenceTemplate,
    employee: &Employee,
    year: i32,
    month: u32,
    generated_by: Option<u64>,
) -> Result<GeneratedSheet, AppError> {
    let (start, end) = month_span(year, month)?;
    let locale = Locale::default();

    let (attendance, planning) = futures::try_join!(
        reconcile::month_attendance(pool, employee.id, start, end),
        reconcile::month_planning(pool, employee.id, &employee.employee_code, start, end),
    )?;

    let slots = reconcile::month_grid(year, month, &attendance, &planning, &locale);
    tracing::debug!(
        employee_code = %employee.employee_code,
        planned = slots.iter().filter(|s| s.shift.is_some()).count(),
        absences = slots.iter().filter(|s| s.absent).count(),
        weekend_days = slots.iter().filter(|s| s.weekend).count(),
        "month reconciled"
    );
    let bytes = template.render(
        &provider_name(employee),
        &locale.period_heading(start),
        &slots,
    )?;

    let record = storage::store_sheet(
        pool,
        Path::new(&config.storage_root),
        employee,
        year,
        month,
        generated_by,
        &bytes,
    )
    .await?;
    tracing::info!(
        employee_code = %employee.employee_code,
        year,
        month,
        size = bytes.len(),
        "presence sheet generated"
    );
    Ok(GeneratedSheet { record, bytes })
}

/// Generates sheets for every active employee, one at a time. A broken
/// template aborts the run; a failure for one employee is recorded in the
/// summary and the run moves on.
pub async fn bulk_generate(
    pool: &MySqlPool,
    config: &Config,
    year: i32,
    month: u32,
    department: Option<&str>,
    generated_by: Option<u64>,
) -> Result<BulkSummary, AppError> {
    month_span(year, month)?;
    let template = PresenceTemplate::load(Path::new(&config.template_path))?;
    let employees = employee::active(pool, department).await?;

    let mut summary = BulkSummary {
        year,
        month,
        attempted: employees.len(),
        generated: 0,
        failed: 0,
        failures: Vec::new(),
    };
    for employee in &employees {
        match generate_and_store(pool, config, &template, employee, year, month, generated_by)
            .await
        {
            Ok(_) => summary.generated += 1,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    employee_code = %employee.employee_code,
                    "bulk presence generation failed"
                );
                summary.failed += 1;
                summary.failures.push(BulkFailure {
                    employee_code: employee.employee_code.clone(),
                    employee_name: employee.full_name(),
                    message: e.to_string(),
                });
            }
        }
    }
    tracing::info!(
        year,
        month,
        attempted = summary.attempted,
        generated = summary.generated,
        failed = summary.failed,
        "bulk presence generation finished"
    );
    Ok(summary)
}
