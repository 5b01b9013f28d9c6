use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::create_contact::ContactData;
use super::ApiError;
use super::ApiSuccess;
use crate::contact::errors::ContactError;
use crate::contact::models::ContactId;
use crate::contact::ports::ContactServicePort;
use crate::inbound::http::router::AppState;

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ContactData>, ApiError> {
    let contact_id = ContactId::from_string(&id).map_err(ContactError::from)?;

    state
        .contact_service
        .get_contact(&contact_id)
        .await
        .map_err(ApiError::from)
        .map(|ref contact| {
            ApiSuccess::new(
                StatusCode::OK,
                "Contact retrieved successfully.",
                contact.into(),
            )
        })
}
