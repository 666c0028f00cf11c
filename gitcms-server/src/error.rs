use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A failed request: HTTP status plus the `{status: "failure", message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    file_relative_path: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            file_relative_path: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a core error. Path errors are always the caller's fault (400);
    /// everything else gets `status`.
    pub fn core(err: gitcms::Error, status: StatusCode) -> Self {
        let status = if err.is_path_error() {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        Self::new(status, err.to_string())
    }

    /// Errors from create/delete/upload.
    pub fn mutation(err: gitcms::Error) -> Self {
        let status = match err {
            gitcms::Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::core(err, status)
    }

    /// Errors from commit/reset: the caller can retry once the tree is sorted out.
    pub fn repository(err: gitcms::Error) -> Self {
        Self::core(err, StatusCode::PRECONDITION_FAILED)
    }

    /// Errors from show; echoes the requested path.
    pub fn show(err: gitcms::Error, file_relative_path: impl Into<String>) -> Self {
        let mut this = Self::core(err, StatusCode::NOT_IMPLEMENTED);
        this.file_relative_path = Some(file_relative_path.into());
        this
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.file_relative_path {
            Some(path) => json!({
                "status": "failure",
                "message": self.message,
                "fileRelativePath": path,
            }),
            None => json!({ "status": "failure", "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}
