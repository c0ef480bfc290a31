use crate::api::attendance::{
    AbsenceRequest, AttendanceEdit, AttendanceFilter, AttendanceListResponse, ClockPayload,
};
use crate::api::planning::{
    BulkPlanningRequest, PlanningEntry, PlanningFilter, PlanningListResponse,
};
use crate::api::presence_sheet::{
    BulkGenerateRequest, PeriodQuery, SheetFilter, SheetListResponse,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::planning::PlanningRecord;
use crate::model::presence_sheet::PresenceSheetRecord;
use crate::report::{BulkFailure, BulkSummary};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::Modify;
use utoipa::{openapi, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presence Tracking API",
        version = "1.0.0",
        description = r#"
## Attendance & Presence Sheet Service

This API tracks daily attendance, holds the imported shift planning and turns
both into the monthly **feuille de présence** workbook sent with invoices.

### 🔹 Key Features
- **Attendance**
  - Daily check-in / check-out with optional geofencing
  - Absence declarations with HR approval
- **Planning**
  - Bulk roster imports grouped by batch
  - Relinking of rows uploaded before the employee existed
- **Presence Sheets**
  - One xlsx per employee per month, generated from a fixed template
  - Bulk generation for the whole company, stored and downloadable

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication** issued by the
user-management service. Sensitive operations require **Admin** or **HR**.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- Sheet downloads are served as xlsx attachments

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::declare_absence,
        crate::api::attendance::approve_absence,
        crate::api::attendance::reject_absence,
        crate::api::attendance::edit_attendance,
        crate::api::attendance::attendance_list,

        crate::api::planning::create_planning,
        crate::api::planning::bulk_import,
        crate::api::planning::planning_list,
        crate::api::planning::update_planning,
        crate::api::planning::delete_planning,
        crate::api::planning::delete_batch,
        crate::api::planning::relink,

        crate::api::presence_sheet::my_sheet,
        crate::api::presence_sheet::generate,
        crate::api::presence_sheet::bulk_generate,
        crate::api::presence_sheet::sheet_list,
        crate::api::presence_sheet::download
    ),
    components(
        schemas(
            ClockPayload,
            AbsenceRequest,
            AttendanceEdit,
            AttendanceFilter,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceListResponse,
            Employee,
            PlanningEntry,
            BulkPlanningRequest,
            PlanningFilter,
            PlanningRecord,
            PlanningListResponse,
            PeriodQuery,
            BulkGenerateRequest,
            SheetFilter,
            PresenceSheetRecord,
            SheetListResponse,
            BulkSummary,
            BulkFailure
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Planning", description = "Shift planning APIs"),
        (name = "Presence Sheets", description = "Monthly presence sheet APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
