use axum::extract::State;
use axum::http::StatusCode;

use super::create_contact::ContactData;
use super::ApiError;
use super::ApiSuccess;
use crate::contact::ports::ContactServicePort;
use crate::inbound::http::router::AppState;

pub async fn list_contacts(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<ContactData>>, ApiError> {
    let contacts = state.contact_service.list_contacts().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        "Contacts retrieved successfully.",
        contacts.iter().map(ContactData::from).collect(),
    ))
}
