use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::ports::CredentialServicePort;
use crate::inbound::http::router::AppState;

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state.credential_service.forgot_password(&body.email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        "Reset password email sent successfully.",
        (),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
}
