use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use newsseek_common::NewsSeekError;
use std::fmt;

use crate::types::ErrorResponse;

/// HTTP wrapper around [`NewsSeekError`]
#[derive(Debug)]
pub struct ApiError(pub NewsSeekError);

impl ApiError {
    /// Short error kind for response bodies
    pub fn kind(&self) -> &'static str {
        match &self.0 {
            NewsSeekError::Provider(_) => "provider_error",
            NewsSeekError::Schema { .. } => "schema_error",
            NewsSeekError::DuplicateId(_) => "duplicate_id",
            NewsSeekError::StoreUnavailable(_) => "store_unavailable",
            NewsSeekError::NotReady(_) => "not_ready",
            NewsSeekError::PartialWrite { .. } => "partial_write",
            NewsSeekError::Config(_) => "config_error",
            NewsSeekError::InvalidInput(_) => "invalid_input",
            NewsSeekError::Io(_) => "io_error",
            NewsSeekError::Json(_) => "json_error",
            NewsSeekError::Other(_) => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<NewsSeekError> for ApiError {
    fn from(err: NewsSeekError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.0.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_ready = ApiError::from(NewsSeekError::not_ready("empty"));
        assert_eq!(not_ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(not_ready.kind(), "not_ready");

        let bad = ApiError::from(NewsSeekError::invalid_input("blank"));
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let provider = ApiError::from(NewsSeekError::provider("down"));
        assert_eq!(provider.status_code(), StatusCode::BAD_GATEWAY);
    }
}
