use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use crate::contact::errors::ContactError;
use crate::contact::models::ContactId;
use crate::contact::ports::ContactServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let contact_id = ContactId::from_string(&id).map_err(ContactError::from)?;

    state
        .contact_service
        .delete_contact(&contact_id)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, "Contact deleted successfully.", ()))
}
