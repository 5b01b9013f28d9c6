use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::create_contact::ContactData;
use super::create_contact::ContactRequest;
use super::ApiError;
use super::ApiSuccess;
use crate::contact::errors::ContactError;
use crate::contact::models::ContactId;
use crate::contact::ports::ContactServicePort;
use crate::inbound::http::router::AppState;

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ContactRequest>,
) -> Result<ApiSuccess<ContactData>, ApiError> {
    let contact_id = ContactId::from_string(&id).map_err(ContactError::from)?;
    let details = body.try_into_details()?;

    state
        .contact_service
        .update_contact(&contact_id, details)
        .await
        .map_err(ApiError::from)
        .map(|ref contact| {
            ApiSuccess::new(
                StatusCode::OK,
                "Contact updated successfully.",
                contact.into(),
            )
        })
}
