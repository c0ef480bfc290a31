use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Employee profile, owned by the user-management service. This service
/// only reads id/code/name/department/active.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP007",
        "first_name": "Awa",
        "last_name": "Diallo",
        "department": "Supervision",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP007")]
    pub employee_code: String,

    #[schema(example = "Awa")]
    pub first_name: String,

    #[schema(example = "Diallo")]
    pub last_name: String,

    #[schema(example = "Supervision", nullable = true)]
    pub department: Option<String>,

    #[schema(example = true)]
    pub is_active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, first_name, last_name, department, is_active
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Active employees, optionally narrowed to one department, ordered by code
/// so bulk generation walks them deterministically.
pub async fn active(
    pool: &MySqlPool,
    department: Option<&str>,
) -> Result<Vec<Employee>, sqlx::Error> {
    match department {
        Some(dept) => {
            sqlx::query_as::<_, Employee>(
                r#"
                SELECT id, employee_code, first_name, last_name, department, is_active
                FROM employees
                WHERE is_active = TRUE AND department = ?
                ORDER BY employee_code
                "#,
            )
            .bind(dept)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Employee>(
                r#"
                SELECT id, employee_code, first_name, last_name, department, is_active
                FROM employees
                WHERE is_active = TRUE
                ORDER BY employee_code
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn id_by_code(pool: &MySqlPool, code: &str) -> Result<Option<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE employee_code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await
}
