//! Unified error handling for the dashboard.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::allocation::AllocationError;
use crate::services::carrier::TrackingError;
use crate::services::sweep::SweepError;

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Allocation/reversal operation failed.
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Status sweep failed.
    #[error("Sweep error: {0}")]
    Sweep(#[from] SweepError),

    /// Carrier tracking API failed.
    #[error("Carrier error: {0}")]
    Tracking(#[from] TrackingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Feature not configured (e.g., no carrier credentials).
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) => repository_status(e),
            Self::Allocation(e) => match e {
                AllocationError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                AllocationError::ProductNotFound(_) | AllocationError::OrderNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AllocationError::AlreadyAllocated(_) => StatusCode::CONFLICT,
                AllocationError::Repository(e) => repository_status(e),
            },
            Self::Sweep(e) => match e {
                SweepError::AlreadyRunning => StatusCode::CONFLICT,
                SweepError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Tracking(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else if status == StatusCode::BAD_GATEWAY {
            "Carrier service error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parceldesk_core::{OrderId, ProductId};

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unavailable("test".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_allocation_error_status_codes() {
        fn get_status(err: AllocationError) -> StatusCode {
            AppError::from(err).into_response().status()
        }

        assert_eq!(
            get_status(AllocationError::InvalidQuantity(0)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AllocationError::ProductNotFound(ProductId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AllocationError::AlreadyAllocated(OrderId::new(1))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_repository_conflict_maps_to_conflict() {
        let err = AppError::Database(RepositoryError::Conflict("duplicate".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_errors_are_not_exposed() {
        let err = AppError::Internal("secret connection string".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
