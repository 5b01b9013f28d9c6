use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Form;
use axum::Json;
use handlebars::Handlebars;
use handlebars::TemplateError;
use serde::Deserialize;
use serde_json::json;

use super::ApiError;
use super::ApiSuccess;
use crate::credential::ports::CredentialServicePort;
use crate::inbound::http::router::AppState;

pub const RESET_FORM_TEMPLATE: &str = "reset_password_form";

const RESET_FORM_SOURCE: &str = r#"<html>
<body>
    <form action="/api/auth/reset-password-form" method="post">
        <input type="hidden" name="token" value="{{token}}" />
        <label>New Password:</label>
        <input type="password" name="new_password" required />
        <button type="submit">Reset Password</button>
    </form>
</body>
</html>"#;

/// Register the HTML templates served by the reset flow.
pub fn register_templates(templates: &mut Handlebars<'static>) -> Result<(), TemplateError> {
    templates.register_template_string(RESET_FORM_TEMPLATE, RESET_FORM_SOURCE)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetFormQuery {
    token: Option<String>,
}

/// Serve the reset form for the emailed link. The token is HTML-escaped on render.
pub async fn reset_password_form(
    State(state): State<AppState>,
    Query(query): Query<ResetFormQuery>,
) -> Result<Html<String>, ApiError> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token is required.".to_string()))?;

    let page = state
        .templates
        .render(RESET_FORM_TEMPLATE, &json!({ "token": token }))
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(Html(page))
}

/// Reset request, accepted as JSON or as a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    new_password: Option<String>,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    apply_reset(&state, body).await
}

pub async fn reset_password_submit(
    State(state): State<AppState>,
    Form(body): Form<ResetPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    apply_reset(&state, body).await
}

async fn apply_reset(
    state: &AppState,
    request: ResetPasswordRequest,
) -> Result<ApiSuccess<()>, ApiError> {
    let (token, new_password) = match (request.token, request.new_password) {
        (Some(token), Some(new_password)) if !token.is_empty() && !new_password.is_empty() => {
            (token, new_password)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Token and new password are required.".to_string(),
            ))
        }
    };

    state
        .credential_service
        .reset_password(&token, &new_password)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        "Password reset successfully.",
        (),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_form_escapes_token() {
        let mut templates = Handlebars::new();
        register_templates(&mut templates).unwrap();

        let page = templates
            .render(
                RESET_FORM_TEMPLATE,
                &json!({ "token": "\"><script>alert(1)</script>" }),
            )
            .unwrap();

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("action=\"/api/auth/reset-password-form\""));
    }
}
