use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the attendance and presence-sheet surface.
///
/// Template problems come in two flavours: an unreadable asset is an
/// internal fault, while a readable workbook whose expected labels are
/// missing is reported to the caller so the template can be fixed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Template asset missing or corrupt.
    #[error("Template error: {0}")]
    Template(String),

    /// Template opened but the header anchors could not be located.
    #[error("Template layout error: {0}")]
    TemplateLayout(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

impl From<calamine::XlsxError> for AppError {
    fn from(e: calamine::XlsxError) -> Self {
        AppError::Template(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::TemplateLayout(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Template(_)
            | AppError::Database(_)
            | AppError::Io(_)
            | AppError::Spreadsheet(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal faults are logged at the call site; the response body
        // stays generic for them.
        let message = if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
