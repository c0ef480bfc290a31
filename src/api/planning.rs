use crate::auth::auth::AuthUser;
use crate::model::planning::{is_valid_shift_time, normalize_code, PlanningRecord};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::{code_filter, employee_cache};
use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// One planned day as uploaded from the roster spreadsheet. Codes are
/// matched case-insensitively; rows whose code is unknown are stored
/// unlinked and picked up later by relink.
#[derive(Deserialize, ToSchema)]
pub struct PlanningEntry {
    #[schema(example = "EMP007")]
    pub employee_code: String,
    #[schema(example = "Awa Diallo")]
    pub employee_name: String,
    #[schema(example = "2026-02-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Shift 1")]
    pub shift: String,
    #[schema(example = "06:00")]
    pub start_time: String,
    #[schema(example = "14:00")]
    pub end_time: String,
    #[schema(example = 30, nullable = true)]
    pub break_minutes: Option<u32>,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkPlanningRequest {
    pub entries: Vec<PlanningEntry>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PlanningFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "EMP007")]
    /// Filter by employee code
    pub employee_code: Option<String>,
    #[schema(example = "0b8a4a9e-3a44-4d53-8f2e-0d41c8b2a671")]
    /// Filter by import batch
    pub batch_id: Option<String>,
    #[schema(example = "2026-02-01", value_type = String)]
    /// Earliest date included
    pub date_from: Option<NaiveDate>,
    #[schema(example = "2026-02-28", value_type = String)]
    /// Latest date included
    pub date_to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

#[derive(Serialize, ToSchema)]
pub struct PlanningListResponse {
    pub data: Vec<PlanningRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Columns an admin may change through the dynamic update endpoint.
const EDITABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "employee_name",
    "date",
    "shift",
    "start_time",
    "end_time",
    "break_minutes",
    "notes",
];

fn validate_entry(entry: &PlanningEntry) -> Result<(), String> {
    if normalize_code(&entry.employee_code).is_empty() {
        return Err("employee_code is required".to_string());
    }
    if entry.employee_name.trim().is_empty() {
        return Err("employee_name is required".to_string());
    }
    if !is_valid_shift_time(&entry.start_time) {
        return Err(format!(
            "start_time must be HH:mm, got {:?}",
            entry.start_time
        ));
    }
    if !is_valid_shift_time(&entry.end_time) {
        return Err(format!("end_time must be HH:mm, got {:?}", entry.end_time));
    }
    Ok(())
}

/// Bulk resolution: filter first, then cache, then database. A definite
/// filter miss means the code matches no employee and the row stays
/// unlinked until relink runs.
async fn resolve_for_bulk(pool: &MySqlPool, code: &str) -> Result<Option<u64>, sqlx::Error> {
    if !code_filter::might_exist(code) {
        return Ok(None);
    }
    employee_cache::resolve(pool, code).await
}

/// Single-row resolution skips the membership filter and asks the cache or
/// database directly; a hit also feeds the filter so codes created after
/// warmup stop being rejected in bulk runs.
async fn resolve_single(pool: &MySqlPool, code: &str) -> Result<Option<u64>, sqlx::Error> {
    let id = employee_cache::resolve(pool, code).await?;
    if id.is_some() {
        code_filter::insert(code);
    }
    Ok(id)
}

/* =========================
Create one entry (HR/Admin)
========================= */
/// Swagger doc for create_planning endpoint
#[utoipa::path(
    post,
    path = "/api/v1/planning",
    request_body(
        content = PlanningEntry,
        description = "Planning entry payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Planning entry created", body = Object, example = json!({
            "message": "Planning entry created",
            "id": 17,
            "linked": true
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn create_planning(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PlanningEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if let Err(message) = validate_entry(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
    }

    let code = normalize_code(&payload.employee_code);
    let employee_id = resolve_single(pool.get_ref(), &code).await.map_err(|e| {
        tracing::error!(error = %e, code, "Employee resolution failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO planning_records
            (employee_id, employee_code, employee_name, date, shift,
             start_time, end_time, break_minutes, uploaded_by, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(&code)
    .bind(payload.employee_name.trim())
    .bind(payload.date)
    .bind(payload.shift.trim())
    .bind(&payload.start_time)
    .bind(&payload.end_time)
    .bind(payload.break_minutes.unwrap_or(0))
    .bind(auth.user_id)
    .bind(payload.notes.as_deref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, code, "Planning insert failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Planning entry created",
        "id": result.last_insert_id(),
        "linked": employee_id.is_some()
    })))
}

/* =========================
Bulk import (HR/Admin)
========================= */
/// Swagger doc for bulk_import endpoint
#[utoipa::path(
    post,
    path = "/api/v1/planning/bulk",
    request_body(
        content = BulkPlanningRequest,
        description = "Batch of planning entries; inserted all-or-nothing",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Planning imported", body = Object, example = json!({
            "message": "Planning imported",
            "batch_id": "0b8a4a9e-3a44-4d53-8f2e-0d41c8b2a671",
            "inserted": 120,
            "matched": 118,
            "unmatched": 2
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn bulk_import(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkPlanningRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.entries.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No entries provided"
        })));
    }

    let batch_id = Uuid::new_v4().to_string();
    let mut matched = 0usize;
    let mut unmatched = 0usize;

    // All-or-nothing: one bad row aborts the whole upload so a roster is
    // never half imported.
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    for (index, entry) in payload.entries.iter().enumerate() {
        if let Err(message) = validate_entry(entry) {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": format!("Row {}: {}", index + 1, message)
            })));
        }

        let code = normalize_code(&entry.employee_code);
        let employee_id = resolve_for_bulk(pool.get_ref(), &code)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, code, "Employee resolution failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
        match employee_id {
            Some(_) => matched += 1,
            None => unmatched += 1,
        }

        sqlx::query(
            r#"
            INSERT INTO planning_records
                (employee_id, employee_code, employee_name, date, shift,
                 start_time, end_time, break_minutes, batch_id, uploaded_by, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(&code)
        .bind(entry.employee_name.trim())
        .bind(entry.date)
        .bind(entry.shift.trim())
        .bind(&entry.start_time)
        .bind(&entry.end_time)
        .bind(entry.break_minutes.unwrap_or(0))
        .bind(&batch_id)
        .bind(auth.user_id)
        .bind(entry.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, code, batch_id, "Planning batch insert failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, batch_id, "Failed to commit planning batch");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tracing::info!(
        batch_id,
        inserted = payload.entries.len(),
        matched,
        unmatched,
        "planning batch imported"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Planning imported",
        "batch_id": batch_id,
        "inserted": payload.entries.len(),
        "matched": matched,
        "unmatched": unmatched
    })))
}

/* =========================
List planning (HR/Admin)
========================= */
/// Swagger doc for planning_list endpoint
#[utoipa::path(
    get,
    path = "/api/v1/planning",
    params(PlanningFilter),
    responses(
        (status = 200, description = "Paginated planning list", body = PlanningListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn planning_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PlanningFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let normalized_code = query.employee_code.as_deref().map(normalize_code);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(code) = normalized_code.as_deref() {
        where_sql.push_str(" AND employee_code = ?");
        args.push(FilterValue::Str(code));
    }

    if let Some(batch) = query.batch_id.as_deref() {
        where_sql.push_str(" AND batch_id = ?");
        args.push(FilterValue::Str(batch));
    }

    if let Some(from) = query.date_from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.date_to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM planning_records{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count planning records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, employee_code, employee_name, date, shift,
               start_time, end_time, break_minutes, batch_id, uploaded_by, notes
        FROM planning_records
        {}
        ORDER BY date, employee_code, id
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, PlanningRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch planning list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = PlanningListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Edit one entry (HR/Admin)
========================= */
/// Swagger doc for update_planning endpoint
#[utoipa::path(
    put,
    path = "/api/v1/planning/{record_id}",
    params(
        ("record_id" = u64, Path, description = "ID of the planning entry to edit")
    ),
    request_body(
        content = Object,
        description = "Subset of editable columns as a JSON object",
        content_type = "application/json",
        example = json!({"shift": "Shift 2", "notes": "swapped with EMP012"})
    ),
    responses(
        (status = 200, description = "Planning entry updated", body = Object, example = json!({
            "message": "Planning entry updated"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Planning entry not found", body = Object, example = json!({
            "message": "Planning entry not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn update_planning(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<serde_json::Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let record_id = path.into_inner();
    let payload = payload.into_inner();

    for field in ["start_time", "end_time"] {
        if let Some(value) = payload.get(field).and_then(|v| v.as_str()) {
            if !is_valid_shift_time(value) {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": format!("{field} must be HH:mm, got {value:?}")
                })));
            }
        }
    }

    let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM planning_records WHERE id = ?")
        .bind(record_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Planning lookup failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if exists.is_none() {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Planning entry not found"
        })));
    }

    let update = build_update_sql(
        "planning_records",
        &payload,
        EDITABLE_COLUMNS,
        "id",
        record_id,
    )?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        tracing::error!(error = %e, record_id, "Planning update failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // A changed code re-resolves the link, possibly back to NULL.
    if let Some(code) = payload.get("employee_code").and_then(|v| v.as_str()) {
        let employee_id = resolve_single(pool.get_ref(), &normalize_code(code))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, record_id, "Employee resolution failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
        sqlx::query("UPDATE planning_records SET employee_id = ? WHERE id = ?")
            .bind(employee_id)
            .bind(record_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, record_id, "Planning relink failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Planning entry updated"
    })))
}

/* =========================
Delete one entry (HR/Admin)
========================= */
/// Swagger doc for delete_planning endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/planning/{record_id}",
    params(
        ("record_id" = u64, Path, description = "ID of the planning entry to delete")
    ),
    responses(
        (status = 200, description = "Planning entry deleted", body = Object, example = json!({
            "message": "Planning entry deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Planning entry not found", body = Object, example = json!({
            "message": "Planning entry not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn delete_planning(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let record_id = path.into_inner();

    let result = sqlx::query("DELETE FROM planning_records WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Planning delete failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Planning entry not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Planning entry deleted"
    })))
}

/* =========================
Delete a batch (HR/Admin)
========================= */
/// Swagger doc for delete_batch endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/planning/batch/{batch_id}",
    params(
        ("batch_id" = String, Path, description = "Import batch to delete")
    ),
    responses(
        (status = 200, description = "Batch deleted", body = Object, example = json!({
            "message": "Batch deleted",
            "deleted": 120
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No entries for that batch", body = Object, example = json!({
            "message": "No entries for that batch"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn delete_batch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let batch_id = path.into_inner();

    let result = sqlx::query("DELETE FROM planning_records WHERE batch_id = ?")
        .bind(&batch_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, batch_id, "Batch delete failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No entries for that batch"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Batch deleted",
        "deleted": result.rows_affected()
    })))
}

/* =========================
Relink unmatched rows (HR/Admin)
========================= */
/// Swagger doc for relink endpoint
#[utoipa::path(
    post,
    path = "/api/v1/planning/relink",
    responses(
        (status = 200, description = "Planning entries linked", body = Object, example = json!({
            "message": "Planning entries linked",
            "linked": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Planning"
)]
pub async fn relink(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // Imports can precede the employee record; this picks the stragglers up
    // once the code exists.
    let result = sqlx::query(
        r#"
        UPDATE planning_records p
        JOIN employees e ON e.employee_code = p.employee_code
        SET p.employee_id = e.id
        WHERE p.employee_id IS NULL
        "#,
    )
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Planning relink failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Planning entries linked",
        "linked": result.rows_affected()
    })))
}
