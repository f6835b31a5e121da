// MindGarden/backend/src/error_handler.rs
use crate::db::StoreError;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    PersistenceError(String), // Shown to the user as-is, it tells them what to fix
}

impl ServiceError {
    fn from_store_error(error: StoreError) -> ServiceError {
        match error {
            StoreError::SchemaMismatch(_)
            | StoreError::DuplicateId(_)
            | StoreError::InvalidValue { .. } => ServiceError::BadRequest(error.to_string()),
            StoreError::RecordNotFound(_) => ServiceError::NotFound(error.to_string()),
            StoreError::PersistFailure { ref path, ref source } => {
                log::error!("Persist failure on {}: {:?}", path.display(), source);
                ServiceError::PersistenceError(format!(
                    "Could not save your changes to {}. Check free disk space and the \
                     permissions of the data directory, then try again.",
                    path.display()
                ))
            }
        }
    }

    fn from_blocking_error(error: BlockingError) -> ServiceError {
        log::error!("Blocking file task failed: {:?}", error);
        ServiceError::InternalServerError("File operation was interrupted.".to_string())
    }

    /// Message that is safe to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::PersistenceError(msg) => msg.clone(),
            other if other.status_code().is_server_error() => {
                "An internal server error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> ServiceError {
        ServiceError::from_store_error(error)
    }
}

impl From<BlockingError> for ServiceError {
    fn from(error: BlockingError) -> ServiceError {
        ServiceError::from_blocking_error(error)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ServiceError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::PersistenceError(msg) => write!(f, "Persistence Error: {}", msg),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ServiceError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let user_facing_message = self.user_message();

        if status_code.is_server_error() {
            log::error!(
                "Responding with server error ({}): {}",
                status_code,
                user_facing_message
            );
        } else {
            log::warn!(
                "Responding with client error ({}): {}",
                status_code,
                user_facing_message
            );
        }

        HttpResponse::build(status_code).json(json!({
            "status": "error",
            "statusCode": status_code.as_u16(),
            "message": user_facing_message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn store_errors_map_to_http_statuses() {
        let cases = [
            (
                StoreError::SchemaMismatch("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::DuplicateId("1".into()), StatusCode::BAD_REQUEST),
            (
                StoreError::InvalidValue {
                    column: "점수".into(),
                    value: "many".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::RecordNotFound("1".into()), StatusCode::NOT_FOUND),
        ];
        for (store_error, expected) in cases {
            assert_eq!(ServiceError::from(store_error).status_code(), expected);
        }
    }

    #[test]
    fn persist_failure_keeps_an_actionable_message() {
        let err = ServiceError::from(StoreError::PersistFailure {
            path: PathBuf::from("data/medications.csv"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = err.user_message();
        assert!(message.contains("data/medications.csv"));
        assert!(message.contains("permissions"));
    }

    #[test]
    fn other_server_errors_stay_generic() {
        let err = ServiceError::InternalServerError("secret detail".into());
        assert!(!err.user_message().contains("secret"));
    }
}
