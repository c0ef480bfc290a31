use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come straight from JSON keys, so every key must be in the
/// caller's allowlist before it reaches the statement text.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed_columns: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".to_string()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest(
            "No fields provided for update".to_string(),
        ));
    }

    for key in obj.keys() {
        if !allowed_columns.contains(&key.as_str()) {
            return Err(AppError::BadRequest(format!("Unknown field: {key}")));
        }
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values → SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => {
                return Err(AppError::BadRequest(
                    "Unsupported JSON value type".to_string(),
                ))
            }
        }
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &["shift", "notes", "date", "break_minutes"];

    #[test]
    fn builds_set_clause_and_trailing_id_bind() {
        let update = build_update_sql(
            "planning_records",
            &json!({"shift": "Shift 2"}),
            COLUMNS,
            "id",
            42,
        )
        .unwrap();
        assert_eq!(
            update.sql,
            "UPDATE planning_records SET shift = ? WHERE id = ?"
        );
        assert_eq!(update.values.len(), 2);
        assert!(matches!(update.values[0], SqlValue::String(_)));
        assert!(matches!(update.values[1], SqlValue::I64(42)));
    }

    #[test]
    fn keys_join_in_map_order() {
        // serde_json's default map is sorted, so the clause order is stable.
        let update = build_update_sql(
            "planning_records",
            &json!({"shift": "Shift 1", "notes": "swap"}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap();
        assert_eq!(
            update.sql,
            "UPDATE planning_records SET notes = ?, shift = ? WHERE id = ?"
        );
    }

    #[test]
    fn date_and_datetime_strings_are_typed() {
        let update = build_update_sql(
            "planning_records",
            &json!({"date": "2026-02-14"}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));

        let update = build_update_sql(
            "planning_records",
            &json!({"notes": "2026-02-14T06:00:00"}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::DateTime(_)));

        let update = build_update_sql(
            "planning_records",
            &json!({"notes": "2026-02-14 06:00:00"}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::DateTime(_)));
    }

    #[test]
    fn rejects_unknown_columns_and_empty_payloads() {
        let err =
            build_update_sql("planning_records", &json!({"id": 9}), COLUMNS, "id", 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = build_update_sql("planning_records", &json!({}), COLUMNS, "id", 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err =
            build_update_sql("planning_records", &json!("text"), COLUMNS, "id", 1).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_nested_json_values() {
        let err = build_update_sql(
            "planning_records",
            &json!({"notes": {"nested": true}}),
            COLUMNS,
            "id",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
