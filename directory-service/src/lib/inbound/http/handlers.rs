use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::contact::errors::ContactError;
use crate::credential::errors::CredentialError;

pub mod create_contact;
pub mod delete_contact;
pub mod forgot_password;
pub mod get_contact;
pub mod health;
pub mod list_contacts;
pub mod login;
pub mod register;
pub mod reset_password;
pub mod update_contact;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, message: &str, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(message, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    ServiceUnavailable(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error.".to_string(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(error = %msg, "Dependency unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable.".to_string(),
                )
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        (status, Json(ApiResponseBody::<()>::failure(message))).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidUserId(_)
            | CredentialError::InvalidFullName(_)
            | CredentialError::InvalidEmail(_)
            | CredentialError::EmptyPassword => ApiError::UnprocessableEntity(err.to_string()),
            CredentialError::AlreadyExists(_) => {
                ApiError::Conflict("User with this email already exists.".to_string())
            }
            CredentialError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password.".to_string())
            }
            CredentialError::InvalidResetToken => {
                ApiError::Unauthorized("Invalid or expired token.".to_string())
            }
            CredentialError::NotFound(_) => ApiError::NotFound("Email not found.".to_string()),
            CredentialError::Unavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            CredentialError::DatabaseError(_) | CredentialError::Unknown(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::InvalidContactId(_)
            | ContactError::InvalidName(_)
            | ContactError::InvalidEmail(_)
            | ContactError::InvalidPhone(_)
            | ContactError::InvalidAddress { .. } => ApiError::UnprocessableEntity(err.to_string()),
            ContactError::NotFound(_) => ApiError::NotFound("Contact not found.".to_string()),
            ContactError::DatabaseError(_) | ContactError::Unknown(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

/// Outcome envelope shared by every JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    success: bool,
    message: String,
    data: Option<T>,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::errors::EmailError;

    #[test]
    fn test_credential_error_status_mapping() {
        assert_eq!(
            ApiError::from(CredentialError::InvalidCredentials),
            ApiError::Unauthorized("Invalid email or password.".to_string())
        );
        assert_eq!(
            ApiError::from(CredentialError::AlreadyExists("a@b.com".to_string())),
            ApiError::Conflict("User with this email already exists.".to_string())
        );
        assert!(matches!(
            ApiError::from(CredentialError::InvalidEmail(EmailError::InvalidFormat(
                "x".to_string()
            ))),
            ApiError::UnprocessableEntity(_)
        ));
        assert!(matches!(
            ApiError::from(CredentialError::Unavailable("redis".to_string())),
            ApiError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_contact_error_status_mapping() {
        assert_eq!(
            ApiError::from(ContactError::NotFound("id".to_string())),
            ApiError::NotFound("Contact not found.".to_string())
        );
        assert!(matches!(
            ApiError::from(ContactError::DatabaseError("down".to_string())),
            ApiError::InternalServerError(_)
        ));
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response =
            ApiError::InternalServerError("password=hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
