use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::errors::CredentialError;
use crate::credential::models::EmailAddress;
use crate::credential::models::FullName;
use crate::credential::models::RegisterCommand;
use crate::credential::models::User;
use crate::credential::ports::CredentialServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .credential_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::CREATED,
                "User registered successfully.",
                user.into(),
            )
        })
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    full_name: String,
    email: String,
    password: String,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, CredentialError> {
        let full_name = FullName::new(self.full_name)?;
        let email = EmailAddress::new(self.email)?;
        Ok(RegisterCommand::new(full_name, email, self.password))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}
