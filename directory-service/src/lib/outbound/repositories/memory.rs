use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::contact::errors::ContactError;
use crate::contact::models::Contact;
use crate::contact::models::ContactDetails;
use crate::contact::models::ContactId;
use crate::contact::ports::ContactRepository;
use crate::credential::errors::CredentialError;
use crate::credential::models::User;
use crate::credential::models::UserId;
use crate::credential::ports::UserRepository;

/// User store kept in process memory, for local mode and tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, CredentialError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|existing| existing.email.as_str() == user.email.as_str())
        {
            return Err(CredentialError::AlreadyExists(
                user.email.as_str().to_string(),
            ));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), CredentialError> {
        let mut users = self.users.write().await;

        let user = users
            .get_mut(id)
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        user.password_hash = password_hash.to_string();

        Ok(())
    }
}

/// Contact store kept in process memory; lists in insertion order.
#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: RwLock<Vec<Contact>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list_all(&self) -> Result<Vec<Contact>, ContactError> {
        Ok(self.contacts.read().await.clone())
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, ContactError> {
        let contacts = self.contacts.read().await;

        Ok(contacts.iter().find(|contact| contact.id == *id).cloned())
    }

    async fn create(&self, contact: Contact) -> Result<Contact, ContactError> {
        self.contacts.write().await.push(contact.clone());
        Ok(contact)
    }

    async fn update(
        &self,
        id: &ContactId,
        details: ContactDetails,
    ) -> Result<Option<Contact>, ContactError> {
        let mut contacts = self.contacts.write().await;

        Ok(contacts
            .iter_mut()
            .find(|contact| contact.id == *id)
            .map(|contact| {
                contact.name = details.name;
                contact.email = details.email;
                contact.phone = details.phone;
                contact.address = details.address;
                contact.clone()
            }))
    }

    async fn delete(&self, id: &ContactId) -> Result<bool, ContactError> {
        let mut contacts = self.contacts.write().await;

        let before = contacts.len();
        contacts.retain(|contact| contact.id != *id);

        Ok(contacts.len() < before)
    }
}
