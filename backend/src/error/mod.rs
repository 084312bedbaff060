use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::validation::{format_errors, FormattedFieldError, RequestError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<FormattedFieldError>),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();
        let (error, details) = match self {
            AppError::NotFound(msg) | AppError::Forbidden(msg) | AppError::BadRequest(msg) => {
                (msg, None)
            }
            AppError::InternalServerError(err) => {
                tracing::error!(error = ?err, "unhandled error while serving request");
                ("Internal server error".to_string(), None)
            }
            AppError::Validation(errors) => (
                "Validation failed".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        (status, Json(ErrorResponse { error, code, details })).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Forbidden => AppError::Forbidden(err.to_string()),
            RequestError::Validation(errors) => AppError::Validation(format_errors(&errors)),
            RequestError::UnsupportedOperation(_) | RequestError::Conversion(_) => {
                AppError::InternalServerError(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldErrors;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn simple_errors_carry_their_message() {
        let cases = [
            (AppError::BadRequest("bad".into()), "bad", StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Forbidden("denied".into()), "denied", StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::NotFound("missing".into()), "missing", StatusCode::NOT_FOUND, "NOT_FOUND"),
        ];
        for (err, message, status, code) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), status);
            let json = response_json(response).await;
            assert_eq!(json["error"], message);
            assert_eq!(json["code"], code);
        }
    }

    #[tokio::test]
    async fn validation_failure_lists_every_field() {
        let errors: FieldErrors = [
            ("username", "already taken"),
            ("roles", "Roles are required."),
        ]
        .into_iter()
        .collect();
        let response = AppError::from(RequestError::Validation(errors)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = response_json(response).await;
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(
            json["details"]["errors"][0],
            serde_json::json!({
                "field": "username",
                "messages": ["already taken"],
                "first_message": "already taken"
            })
        );
        assert_eq!(json["details"]["errors"][1]["field"], "roles");
    }

    #[tokio::test]
    async fn forbidden_request_maps_to_forbidden_response() {
        let response = AppError::from(RequestError::Forbidden).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["error"], "This action is unauthorized.");
    }

    #[tokio::test]
    async fn unsupported_operation_is_an_internal_error() {
        let err = RequestError::UnsupportedOperation("users.index".to_string());
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert!(json["details"].is_null());
    }
}
