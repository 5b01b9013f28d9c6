use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::contact::errors::ContactError;
use crate::contact::models::Address;
use crate::contact::models::Contact;
use crate::contact::models::ContactId;
use crate::contact::models::ContactName;
use crate::contact::models::PhoneNumber;
use crate::credential::models::EmailAddress;
use crate::credential::models::UserId;
use crate::domain::cache::CacheError;

/// Serialized form of a contact inside the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Contact> for ContactSnapshot {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.0,
            owner_id: contact.owner_id.0,
            name: contact.name.as_str().to_string(),
            email: contact.email.as_str().to_string(),
            phone: contact.phone.as_str().to_string(),
            address: contact.address.as_ref().map(|a| a.as_str().to_string()),
            created_at: contact.created_at,
        }
    }
}

impl TryFrom<ContactSnapshot> for Contact {
    type Error = ContactError;

    fn try_from(snapshot: ContactSnapshot) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: ContactId(snapshot.id),
            owner_id: UserId(snapshot.owner_id),
            name: ContactName::new(snapshot.name)?,
            email: EmailAddress::new(snapshot.email)?,
            phone: PhoneNumber::new(snapshot.phone)?,
            address: Address::new(snapshot.address)?,
            created_at: snapshot.created_at,
        })
    }
}

/// Encode a contact list as cached JSON.
pub fn encode_contacts(contacts: &[Contact]) -> Result<Vec<u8>, CacheError> {
    let snapshots: Vec<ContactSnapshot> = contacts.iter().map(ContactSnapshot::from).collect();
    serde_json::to_vec(&snapshots).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Decode cached JSON back into contacts. Any invalid entry fails the whole list.
pub fn decode_contacts(bytes: &[u8]) -> Result<Vec<Contact>, CacheError> {
    let snapshots: Vec<ContactSnapshot> =
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))?;

    snapshots
        .into_iter()
        .map(|snapshot| {
            Contact::try_from(snapshot).map_err(|e| CacheError::Serialization(e.to_string()))
        })
        .collect()
}
