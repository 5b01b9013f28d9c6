use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::contact::errors::ContactError;
use crate::contact::models::Contact;
use crate::contact::models::ContactDetails;
use crate::contact::ports::ContactServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn create_contact(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<ContactRequest>,
) -> Result<ApiSuccess<ContactData>, ApiError> {
    let details = body.try_into_details()?;

    state
        .contact_service
        .create_contact(&caller.user_id, details)
        .await
        .map_err(ApiError::from)
        .map(|ref contact| {
            ApiSuccess::new(
                StatusCode::CREATED,
                "Contact added successfully.",
                contact.into(),
            )
        })
}

/// HTTP request body for creating or replacing a contact (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactRequest {
    name: String,
    email: String,
    phone: String,
    #[serde(default)]
    address: Option<String>,
}

impl ContactRequest {
    pub(super) fn try_into_details(self) -> Result<ContactDetails, ContactError> {
        ContactDetails::parse(self.name, self.email, self.phone, self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactData {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Contact> for ContactData {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.to_string(),
            owner_id: contact.owner_id.to_string(),
            name: contact.name.as_str().to_string(),
            email: contact.email.as_str().to_string(),
            phone: contact.phone.as_str().to_string(),
            address: contact
                .address
                .as_ref()
                .map(|address| address.as_str().to_string()),
            created_at: contact.created_at,
        }
    }
}
