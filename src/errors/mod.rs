//! Unified error handling with consistent API response envelope.
//!
//! Two layers live here. [`AppError`] is a request-level failure that maps to
//! an HTTP status. [`Notice`] is a recoverable data condition (missing file,
//! missing column, empty selection) that is turned into an alert artifact and
//! returned as a normal, successful response.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }

    /// Wrap an error in the envelope.
    pub fn error(code: &str, message: &str) -> Json<Self> {
        Json(Self {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Check if this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<regex::Error> for AppError {
    fn from(e: regex::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                tracing::debug!(error = %msg, "Rejected dashboard controls");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Severity of an alert shown in place of a chart or table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
}

/// Recoverable data condition detected while answering a dashboard request.
///
/// Every variant is converted into an alert at the point of detection so the
/// rest of the page keeps rendering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Notice {
    /// The backing file was absent or unreadable and the table is empty.
    #[error("No hay datos de {dataset} disponibles")]
    MissingSource { dataset: String },

    /// A requested indicator or field is not a column of the table.
    #[error("El indicador '{column}' no existe en los datos")]
    MissingColumn { column: String },

    /// The current selection matched no rows.
    #[error("{0}")]
    EmptyResult(String),

    /// A control the view depends on has no value yet.
    #[error("{0}")]
    SelectionRequired(String),

    /// A pie chart was requested over a series with negative values.
    #[error("El gráfico de pastel requiere valores no negativos")]
    NegativeValues,
}

impl Notice {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn missing_source(dataset: impl Into<String>) -> Self {
        Self::MissingSource {
            dataset: dataset.into(),
        }
    }

    /// Alert level used when the notice is displayed.
    pub fn level(&self) -> AlertLevel {
        match self {
            Self::MissingSource { .. } | Self::MissingColumn { .. } | Self::NegativeValues => {
                AlertLevel::Warning
            }
            Self::EmptyResult(_) | Self::SelectionRequired(_) => AlertLevel::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success() {
        let response = ApiResponse::success("hello");
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["data"], "hello");
        assert!(json["error"].is_null());
    }

    #[test]
    fn api_response_error() {
        let response = ApiResponse::<()>::error("NOT_FOUND", "Item not found");
        let json = serde_json::to_value(&response.0).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Item not found");
    }

    #[test]
    fn app_error_is_not_found() {
        let err = AppError::NotFound("/api/v1/nope".to_string());
        assert!(err.is_not_found());
        assert!(!AppError::Validation("x".to_string()).is_not_found());
    }

    #[test]
    fn app_error_display() {
        let err = AppError::Validation("unknown variant `foo`".to_string());
        assert_eq!(err.to_string(), "Validation error: unknown variant `foo`");
    }

    #[test]
    fn notice_messages_are_user_facing() {
        assert_eq!(
            Notice::missing_column("CPN_Precoz").to_string(),
            "El indicador 'CPN_Precoz' no existe en los datos"
        );
        assert_eq!(
            Notice::missing_source("CPN").to_string(),
            "No hay datos de CPN disponibles"
        );
    }

    #[test]
    fn notice_levels() {
        assert_eq!(Notice::NegativeValues.level(), AlertLevel::Warning);
        assert_eq!(
            Notice::EmptyResult("No hay datos".to_string()).level(),
            AlertLevel::Info
        );
    }
}
