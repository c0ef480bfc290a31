use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::presence_sheet::PresenceSheetRecord;
use crate::report::{self, storage, BulkSummary};
use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 2)]
    pub month: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkGenerateRequest {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 2)]
    pub month: u32,
    /// Restrict the run to one department
    #[schema(example = "Supervision", nullable = true)]
    pub department: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SheetFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = 2026)]
    /// Filter by year
    pub year: Option<i32>,
    #[schema(example = 2)]
    /// Filter by month
    pub month: Option<u32>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    I64(i64),
}

#[derive(Serialize, ToSchema)]
pub struct SheetListResponse {
    pub data: Vec<PresenceSheetRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

fn xlsx_response(file_name: &str, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_MIME)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(bytes)
}

/* =========================
Own sheet (any employee)
========================= */
/// Swagger doc for my_sheet endpoint
#[utoipa::path(
    get,
    path = "/api/v1/presence-sheets/me",
    params(PeriodQuery),
    responses(
        (status = 200, description = "The filled presence sheet workbook",
         content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
         body = Vec<u8>),
        (status = 400, description = "Invalid period"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presence Sheets"
)]
pub async fn my_sheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;

    let sheet = report::generate_for_employee(
        pool.get_ref(),
        &config,
        employee_id,
        query.year,
        query.month,
        Some(auth.user_id),
    )
    .await?;

    Ok(xlsx_response(&sheet.record.file_name, sheet.bytes))
}

/* =========================
Generate for one employee (HR/Admin)
========================= */
/// Swagger doc for generate endpoint
#[utoipa::path(
    post,
    path = "/api/v1/presence-sheets/{employee_id}/generate",
    params(
        ("employee_id" = u64, Path, description = "Employee to generate for"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "The filled presence sheet workbook",
         content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
         body = Vec<u8>),
        (status = 400, description = "Invalid period or template layout"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presence Sheets"
)]
pub async fn generate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let sheet = report::generate_for_employee(
        pool.get_ref(),
        &config,
        employee_id,
        query.year,
        query.month,
        Some(auth.user_id),
    )
    .await?;

    Ok(xlsx_response(&sheet.record.file_name, sheet.bytes))
}

/* =========================
Generate for everyone (Admin)
========================= */
/// Swagger doc for bulk_generate endpoint
#[utoipa::path(
    post,
    path = "/api/v1/presence-sheets/bulk",
    request_body(
        content = BulkGenerateRequest,
        description = "Period to generate, optionally narrowed to a department",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Run summary with per-employee failures", body = BulkSummary),
        (status = 400, description = "Invalid period or template layout"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presence Sheets"
)]
pub async fn bulk_generate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<BulkGenerateRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let summary = report::bulk_generate(
        pool.get_ref(),
        &config,
        payload.year,
        payload.month,
        payload.department.as_deref(),
        Some(auth.user_id),
    )
    .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/* =========================
List generated sheets (HR/Admin)
========================= */
/// Swagger doc for sheet_list endpoint
#[utoipa::path(
    get,
    path = "/api/v1/presence-sheets",
    params(SheetFilter),
    responses(
        (status = 200, description = "Paginated sheet catalog", body = SheetListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presence Sheets"
)]
pub async fn sheet_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SheetFilter>,
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

    if let Some(year) = query.year {
        where_sql.push_str(" AND year = ?");
        args.push(FilterValue::I64(year as i64));
    }

    if let Some(month) = query.month {
        where_sql.push_str(" AND month = ?");
        args.push(FilterValue::U64(month as u64));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM presence_sheets{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::I64(v) => count_q.bind(*v),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count presence sheets");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, year, month, file_name, file_path,
               generated_by, generated_at, file_size
        FROM presence_sheets
        {}
        ORDER BY year DESC, month DESC, employee_id
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, PresenceSheetRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::I64(v) => data_q.bind(v),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch sheet list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = SheetListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Download a stored sheet
========================= */
/// Swagger doc for download endpoint
#[utoipa::path(
    get,
    path = "/api/v1/presence-sheets/{record_id}/download",
    params(
        ("record_id" = u64, Path, description = "Catalog row of the sheet to download")
    ),
    responses(
        (status = 200, description = "The stored workbook",
         content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
         body = Vec<u8>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Sheet or file not found", body = Object, example = json!({
            "message": "Stored file not found on disk. Please regenerate."
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presence Sheets"
)]
pub async fn download(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record_id = path.into_inner();

    let record = storage::find_by_id(pool.get_ref(), record_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Sheet lookup failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let record = match record {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Presence sheet not found"
            })))
        }
    };

    // Employees may only fetch their own sheets.
    if auth.require_hr_or_admin().is_err() && auth.employee_id != Some(record.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your presence sheet"));
    }

    let bytes = storage::read_sheet_file(&record)?;

    Ok(xlsx_response(&record.file_name, bytes))
}
