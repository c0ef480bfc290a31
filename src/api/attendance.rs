use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::{
    computed_hours, merge_notes, status_for_check_in, AttendanceRecord, AttendanceStatus,
};
use crate::utils::geo;
use actix_web::{web, HttpResponse, Responder};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Optional location and note attached to a clock event.
#[derive(Default, Deserialize, ToSchema)]
pub struct ClockPayload {
    #[schema(example = 48.8566, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 2.3522, nullable = true)]
    pub longitude: Option<f64>,
    #[schema(example = "client site", nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AbsenceRequest {
    #[schema(example = "2026-02-20", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Medical appointment")]
    pub reason: String,
    /// HR/Admin may declare an absence for another employee
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,
}

/// Correction payload; omitted fields keep their stored value.
#[derive(Deserialize, ToSchema)]
pub struct AttendanceEdit {
    #[schema(example = "2026-02-10T06:05:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(example = "2026-02-10T14:10:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveDateTime>,
    #[schema(example = "present", nullable = true)]
    pub status: Option<AttendanceStatus>,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "late")]
    /// Filter by day status
    pub status: Option<String>,
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
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

const RECORD_COLUMNS: &str = r#"
    id, employee_id, date, check_in, check_out, status,
    work_hours, overtime_hours, notes,
    check_in_latitude, check_in_longitude,
    check_out_latitude, check_out_longitude
"#;

async fn today_record(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

fn verify_geofence(
    config: &Config,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> actix_web::Result<()> {
    if !config.geofence_enabled {
        return Ok(());
    }
    let (lat, lon) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(actix_web::error::ErrorForbidden(
                "Location required for check-in",
            ))
        }
    };
    if !geo::within_radius(
        lat,
        lon,
        config.office_latitude,
        config.office_longitude,
        config.geofence_radius_m,
    ) {
        return Err(actix_web::error::ErrorForbidden(
            "Outside the allowed check-in area",
        ));
    }
    Ok(())
}

/* =========================
Check-in
========================= */
/// Swagger doc for check_in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body(
        content = ClockPayload,
        description = "Optional location and note",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "status": "present"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Option<web::Json<ClockPayload>>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();

    verify_geofence(&config, payload.latitude, payload.longitude)?;

    let now = Local::now().naive_local();
    let today = now.date();
    let status = status_for_check_in(now, config.late_cutoff);

    let existing = today_record(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-in lookup failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match existing {
        Some(record) if record.check_in.is_some() => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Already checked in today"
            })))
        }
        Some(record) => {
            // A declared absence for today flips back to a worked day when
            // the employee shows up.
            let notes = merge_notes(record.notes.as_deref(), payload.notes.as_deref());
            sqlx::query(
                r#"
                UPDATE attendance_records
                SET check_in = ?, status = ?, notes = ?,
                    check_in_latitude = ?, check_in_longitude = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(status)
            .bind(notes)
            .bind(payload.latitude)
            .bind(payload.longitude)
            .bind(record.id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, employee_id, "Check-in update failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Checked in successfully",
                "status": status.to_string()
            })))
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance_records
                    (employee_id, date, check_in, status, notes,
                     check_in_latitude, check_in_longitude)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(employee_id)
            .bind(today)
            .bind(now)
            .bind(status)
            .bind(payload.notes.as_deref())
            .bind(payload.latitude)
            .bind(payload.longitude)
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
                    "message": "Checked in successfully",
                    "status": status.to_string()
                }))),

                Err(e) => {
                    // Two devices racing on the same day hit the unique key
                    if let sqlx::Error::Database(db_err) = &e {
                        if db_err.code().as_deref() == Some("23000") {
                            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                                "message": "Already checked in today"
                            })));
                        }
                    }

                    tracing::error!(error = %e, employee_id, "Check-in failed");
                    Err(actix_web::error::ErrorInternalServerError(
                        "Internal Server Error",
                    ))
                }
            }
        }
    }
}

/* =========================
Check-out
========================= */
/// Swagger doc for check_out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body(
        content = ClockPayload,
        description = "Optional location and note",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "work_hours": 8.08,
            "overtime_hours": 0.08
        })),
        (status = 400, description = "No check-in found for today", body = Object, example = json!({
            "message": "No check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: Option<web::Json<ClockPayload>>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let payload = payload.map(web::Json::into_inner).unwrap_or_default();

    let now = Local::now().naive_local();
    let today = now.date();

    let record = today_record(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-out lookup failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let record = match record {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "No check-in found for today"
            })))
        }
    };
    let check_in = match record.check_in {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "No check-in found for today"
            })))
        }
    };
    if record.check_out.is_some() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already checked out today"
        })));
    }

    let (work_hours, overtime_hours) = computed_hours(check_in, now);
    let notes = merge_notes(record.notes.as_deref(), payload.notes.as_deref());

    sqlx::query(
        r#"
        UPDATE attendance_records
        SET check_out = ?, work_hours = ?, overtime_hours = ?, notes = ?,
            check_out_latitude = ?, check_out_longitude = ?
        WHERE id = ?
        "#,
    )
    .bind(now)
    .bind(work_hours)
    .bind(overtime_hours)
    .bind(notes)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(record.id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "work_hours": work_hours,
        "overtime_hours": overtime_hours
    })))
}

/* =========================
Declare absence
========================= */
/// Swagger doc for declare_absence endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/absence",
    request_body(
        content = AbsenceRequest,
        description = "Absence declaration payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Absence declared", body = Object, example = json!({
            "message": "Absence declared",
            "status": "pending-absence"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn declare_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AbsenceRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match payload.employee_id {
        Some(id) => {
            auth.require_hr_or_admin()?;
            id
        }
        None => auth.require_employee_id()?,
    };

    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "A reason is required"
        })));
    }

    let today = Local::now().date_naive();
    if payload.date < today {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Cannot declare an absence in the past"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records (employee_id, date, status, notes)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.date)
    .bind(AttendanceStatus::PendingAbsence)
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Absence declared",
            "status": "pending-absence"
        }))),

        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "Attendance already recorded for that date"
                    })));
                }
            }

            tracing::error!(error = %e, employee_id, "Absence declaration failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/* =========================
Approve absence (HR/Admin)
========================= */
/// Swagger doc for approve_absence endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/absence/{record_id}/approve",
    params(
        ("record_id" = u64, Path, description = "ID of the attendance record to approve")
    ),
    responses(
        (status = 200, description = "Absence approved", body = Object, example = json!({
            "message": "Absence approved"
        })),
        (status = 400, description = "Absence request not found or already processed", body = Object, example = json!({
            "message": "Absence request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn approve_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let record_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE attendance_records
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(AttendanceStatus::Absent)
    .bind(record_id)
    .bind(AttendanceStatus::PendingAbsence)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Approve absence failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Absence request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Absence approved"
    })))
}

/* =========================
Reject absence (HR/Admin)
========================= */
/// Swagger doc for reject_absence endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/absence/{record_id}/reject",
    params(
        ("record_id" = u64, Path, description = "ID of the attendance record to reject")
    ),
    responses(
        (status = 200, description = "Absence rejected", body = Object, example = json!({
            "message": "Absence rejected"
        })),
        (status = 400, description = "Absence request not found or already processed", body = Object, example = json!({
            "message": "Absence request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reject_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let record_id = path.into_inner();

    // A rejected declaration leaves no row; the day reads as a plain no-show.
    let result = sqlx::query(
        r#"
        DELETE FROM attendance_records
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(record_id)
    .bind(AttendanceStatus::PendingAbsence)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Reject absence failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Absence request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Absence rejected"
    })))
}

/* =========================
Edit a day (HR/Admin)
========================= */
/// Swagger doc for edit_attendance endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{record_id}",
    params(
        ("record_id" = u64, Path, description = "ID of the attendance record to edit")
    ),
    request_body(
        content = AttendanceEdit,
        description = "Fields to change; omitted fields are kept",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Attendance updated", body = Object, example = json!({
            "message": "Attendance updated",
            "work_hours": 8.08,
            "overtime_hours": 0.08
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn edit_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AttendanceEdit>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let record_id = path.into_inner();

    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = ?"
    ))
    .bind(record_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Attendance lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let record = match record {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Attendance record not found"
            })))
        }
    };

    let check_in = payload.check_in.or(record.check_in);
    let check_out = payload.check_out.or(record.check_out);
    let status = payload.status.unwrap_or(record.status);
    let notes = payload.notes.clone().or(record.notes);

    // Hours always follow the stamps, including when an edit re-opens a day.
    let (work_hours, overtime_hours) = match (check_in, check_out) {
        (Some(start), Some(end)) => computed_hours(start, end),
        _ => (0.0, 0.0),
    };

    sqlx::query(
        r#"
        UPDATE attendance_records
        SET check_in = ?, check_out = ?, status = ?, notes = ?,
            work_hours = ?, overtime_hours = ?
        WHERE id = ?
        "#,
    )
    .bind(check_in)
    .bind(check_out)
    .bind(status)
    .bind(notes)
    .bind(work_hours)
    .bind(overtime_hours)
    .bind(record_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Attendance edit failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance updated",
        "work_hours": work_hours,
        "overtime_hours": overtime_hours
    })))
}

/* =========================
List attendance (HR/Admin)
========================= */
/// Swagger doc for attendance_list endpoint
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        if AttendanceStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": format!("Unknown status: {status}")
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
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
    let count_sql = format!("SELECT COUNT(*) FROM attendance_records{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {RECORD_COLUMNS}
        FROM attendance_records
        {}
        ORDER BY date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
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
            tracing::error!(error=%e, "Failed to fetch attendance list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
