use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::register::UserData;
use super::ApiError;
use super::ApiSuccess;
use crate::credential::models::LoginCommand;
use crate::credential::ports::CredentialServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let outcome = state
        .credential_service
        .login(LoginCommand {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        "Login successful.",
        LoginResponseData {
            user: (&outcome.user).into(),
            token: outcome.access_token,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub user: UserData,
    pub token: String,
}
