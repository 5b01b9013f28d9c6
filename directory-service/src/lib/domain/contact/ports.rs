use async_trait::async_trait;

use crate::contact::errors::ContactError;
use crate::contact::models::Contact;
use crate::contact::models::ContactDetails;
use crate::contact::models::ContactId;
use crate::credential::models::UserId;

/// Port for contact directory operations.
#[async_trait]
pub trait ContactServicePort: Send + Sync + 'static {
    /// List every contact, served from the cache when possible.
    ///
    /// # Errors
    /// * `DatabaseError` - Cache missed and the store failed
    async fn list_contacts(&self) -> Result<Vec<Contact>, ContactError>;

    /// Retrieve a single contact from the store.
    ///
    /// # Errors
    /// * `NotFound` - Contact does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_contact(&self, id: &ContactId) -> Result<Contact, ContactError>;

    /// Create a contact owned by `owner`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create_contact(
        &self,
        owner: &UserId,
        details: ContactDetails,
    ) -> Result<Contact, ContactError>;

    /// Replace the fields of an existing contact.
    ///
    /// # Errors
    /// * `NotFound` - Contact does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_contact(
        &self,
        id: &ContactId,
        details: ContactDetails,
    ) -> Result<Contact, ContactError>;

    /// Delete a contact.
    ///
    /// # Errors
    /// * `NotFound` - Contact does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete_contact(&self, id: &ContactId) -> Result<(), ContactError>;
}

/// Persistence operations for contacts.
#[async_trait]
pub trait ContactRepository: Send + Sync + 'static {
    /// Retrieve all contacts, oldest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_all(&self) -> Result<Vec<Contact>, ContactError>;

    /// Retrieve contact by identifier.
    ///
    /// # Returns
    /// Optional contact (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, ContactError>;

    /// Persist new contact.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, contact: Contact) -> Result<Contact, ContactError>;

    /// Replace the mutable fields of a contact.
    ///
    /// # Returns
    /// Updated contact, or None if the id is unknown
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        id: &ContactId,
        details: ContactDetails,
    ) -> Result<Option<Contact>, ContactError>;

    /// Remove a contact.
    ///
    /// # Returns
    /// True if a contact was removed, false if the id is unknown
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &ContactId) -> Result<bool, ContactError>;
}
