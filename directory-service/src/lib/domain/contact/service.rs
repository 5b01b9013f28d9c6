use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Clock;

use crate::contact::errors::ContactError;
use crate::contact::models::Contact;
use crate::contact::models::ContactDetails;
use crate::contact::models::ContactId;
use crate::contact::ports::ContactRepository;
use crate::contact::ports::ContactServicePort;
use crate::contact::snapshot::decode_contacts;
use crate::contact::snapshot::encode_contacts;
use crate::credential::models::UserId;
use crate::domain::cache::CacheStore;
use crate::domain::events::models::DirectoryEvent;
use crate::domain::events::ports::EventPublisher;

/// Cache key of the full contact list.
pub const CONTACTS_CACHE_KEY: &str = "contacts:all";

#[derive(Debug, Clone)]
pub struct ContactSettings {
    /// Lifetime of the cached contact list
    pub contacts_ttl: Duration,
    /// Routing key of published directory events
    pub routing_key: String,
}

/// Domain service implementation for contact operations.
///
/// Reads go through the cache; writes go to the store and then drop the
/// cached list. A reader that missed before a write may still refill the
/// cache with the pre-write list, so staleness is bounded by the list TTL.
pub struct ContactService<CR, CS, EP>
where
    CR: ContactRepository + ?Sized,
    CS: CacheStore + ?Sized,
    EP: EventPublisher + ?Sized,
{
    repository: Arc<CR>,
    cache: Arc<CS>,
    event_publisher: Arc<EP>,
    clock: Arc<dyn Clock>,
    settings: ContactSettings,
}

impl<CR, CS, EP> ContactService<CR, CS, EP>
where
    CR: ContactRepository + ?Sized,
    CS: CacheStore + ?Sized,
    EP: EventPublisher + ?Sized,
{
    /// Create a new contact service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Contact persistence implementation
    /// * `cache` - Cache holding the contact list
    /// * `event_publisher` - Directory event publishing implementation
    /// * `clock` - Source of contact creation timestamps
    /// * `settings` - List TTL and event routing key
    pub fn new(
        repository: Arc<CR>,
        cache: Arc<CS>,
        event_publisher: Arc<EP>,
        clock: Arc<dyn Clock>,
        settings: ContactSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            event_publisher,
            clock,
            settings,
        }
    }

    async fn cached_contacts(&self) -> Option<Vec<Contact>> {
        match self.cache.get(CONTACTS_CACHE_KEY).await {
            Ok(Some(bytes)) => match decode_contacts(&bytes) {
                Ok(contacts) => Some(contacts),
                Err(e) => {
                    tracing::warn!(
                        key = CONTACTS_CACHE_KEY,
                        error = %e,
                        "Ignoring corrupt cache entry"
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    key = CONTACTS_CACHE_KEY,
                    error = %e,
                    "Cache read failed, reading store"
                );
                None
            }
        }
    }

    async fn fill_cache(&self, contacts: &[Contact]) {
        let result = match encode_contacts(contacts) {
            Ok(bytes) => {
                self.cache
                    .set(CONTACTS_CACHE_KEY, &bytes, self.settings.contacts_ttl)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(key = CONTACTS_CACHE_KEY, error = %e, "Failed to fill cache");
        }
    }

    async fn invalidate_contacts(&self) {
        if let Err(e) = self.cache.invalidate(CONTACTS_CACHE_KEY).await {
            tracing::error!(
                key = CONTACTS_CACHE_KEY,
                error = %e,
                ttl_secs = self.settings.contacts_ttl.as_secs(),
                "Failed to invalidate cache, entry may be stale until it expires"
            );
        }
    }
}

#[async_trait]
impl<CR, CS, EP> ContactServicePort for ContactService<CR, CS, EP>
where
    CR: ContactRepository + ?Sized,
    CS: CacheStore + ?Sized,
    EP: EventPublisher + ?Sized,
{
    async fn list_contacts(&self) -> Result<Vec<Contact>, ContactError> {
        if let Some(contacts) = self.cached_contacts().await {
            tracing::debug!(key = CONTACTS_CACHE_KEY, count = contacts.len(), "Cache hit");
            return Ok(contacts);
        }

        tracing::debug!(key = CONTACTS_CACHE_KEY, "Cache miss");
        let contacts = self.repository.list_all().await?;
        self.fill_cache(&contacts).await;

        Ok(contacts)
    }

    async fn get_contact(&self, id: &ContactId) -> Result<Contact, ContactError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ContactError::NotFound(id.to_string()))
    }

    async fn create_contact(
        &self,
        owner: &UserId,
        details: ContactDetails,
    ) -> Result<Contact, ContactError> {
        let contact = Contact {
            id: ContactId::new(),
            owner_id: *owner,
            name: details.name,
            email: details.email,
            phone: details.phone,
            address: details.address,
            created_at: self.clock.utc(),
        };

        let created_contact = self.repository.create(contact).await?;
        self.invalidate_contacts().await;

        tracing::info!(contact_id = %created_contact.id, owner_id = %owner, "Contact created");

        let event = DirectoryEvent::ContactAdded {
            name: created_contact.name.as_str().to_string(),
            email: created_contact.email.as_str().to_string(),
            owner: owner.to_string(),
        }
        .to_string();
        if let Err(e) = self
            .event_publisher
            .publish(event.as_bytes(), &self.settings.routing_key)
            .await
        {
            tracing::error!(
                contact_id = %created_contact.id,
                error = %e,
                "Failed to publish ContactAdded event"
            );
        }

        Ok(created_contact)
    }

    async fn update_contact(
        &self,
        id: &ContactId,
        details: ContactDetails,
    ) -> Result<Contact, ContactError> {
        let updated_contact = self
            .repository
            .update(id, details)
            .await?
            .ok_or(ContactError::NotFound(id.to_string()))?;

        self.invalidate_contacts().await;
        tracing::info!(contact_id = %id, "Contact updated");

        Ok(updated_contact)
    }

    async fn delete_contact(&self, id: &ContactId) -> Result<(), ContactError> {
        if !self.repository.delete(id).await? {
            return Err(ContactError::NotFound(id.to_string()));
        }

        self.invalidate_contacts().await;
        tracing::info!(contact_id = %id, "Contact deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::ManualClock;
    use chrono::DateTime;
    use chrono::TimeZone;
    use chrono::Utc;
    use mockall::mock;
    use mockall::Sequence;

    use super::*;
    use crate::domain::cache::CacheError;
    use crate::domain::events::errors::EventPublisherError;

    mock! {
        pub TestContactRepository {}

        #[async_trait]
        impl ContactRepository for TestContactRepository {
            async fn list_all(&self) -> Result<Vec<Contact>, ContactError>;
            async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, ContactError>;
            async fn create(&self, contact: Contact) -> Result<Contact, ContactError>;
            async fn update(&self, id: &ContactId, details: ContactDetails) -> Result<Option<Contact>, ContactError>;
            async fn delete(&self, id: &ContactId) -> Result<bool, ContactError>;
        }
    }

    mock! {
        pub TestCacheStore {}

        #[async_trait]
        impl CacheStore for TestCacheStore {
            async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
            async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
            async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, CacheError>;
            async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
        }
    }

    mock! {
        pub TestEventPublisher {}

        #[async_trait]
        impl EventPublisher for TestEventPublisher {
            async fn publish(&self, message: &[u8], routing_key: &str) -> Result<(), EventPublisherError>;
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(now()))
    }

    fn settings() -> ContactSettings {
        ContactSettings {
            contacts_ttl: Duration::from_secs(600),
            routing_key: "directory".to_string(),
        }
    }

    fn details(name: &str) -> ContactDetails {
        ContactDetails::parse(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
            "1234567890".to_string(),
            None,
        )
        .unwrap()
    }

    fn contact(name: &str) -> Contact {
        let details = details(name);
        Contact {
            id: ContactId::new(),
            owner_id: UserId::new(),
            name: details.name,
            email: details.email,
            phone: details.phone,
            address: details.address,
            created_at: now(),
        }
    }

    #[tokio::test]
    async fn test_list_contacts_cache_hit_skips_store() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        let cached = vec![contact("John")];
        let bytes = encode_contacts(&cached).unwrap();

        cache
            .expect_get()
            .withf(|key| key == CONTACTS_CACHE_KEY)
            .times(1)
            .returning(move |_| Ok(Some(bytes.clone())));
        repository.expect_list_all().times(0);
        cache.expect_set().times(0);

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        assert_eq!(service.list_contacts().await.unwrap(), cached);
    }

    #[tokio::test]
    async fn test_list_contacts_cache_miss_fills_cache() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        let stored = vec![contact("John"), contact("Jane")];
        let returned = stored.clone();
        let expected_bytes = encode_contacts(&stored).unwrap();

        cache.expect_get().times(1).returning(|_| Ok(None));
        repository
            .expect_list_all()
            .times(1)
            .returning(move || Ok(returned.clone()));
        cache
            .expect_set()
            .withf(move |key, value, ttl| {
                key == CONTACTS_CACHE_KEY
                    && value == expected_bytes.as_slice()
                    && *ttl == Duration::from_secs(600)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        assert_eq!(service.list_contacts().await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_list_contacts_degrades_when_cache_unavailable() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        let stored = vec![contact("John")];
        let returned = stored.clone();

        cache
            .expect_get()
            .times(1)
            .returning(|_| Err(CacheError::Unavailable("connection refused".to_string())));
        repository
            .expect_list_all()
            .times(1)
            .returning(move || Ok(returned.clone()));
        cache
            .expect_set()
            .times(1)
            .returning(|_, _, _| Err(CacheError::Unavailable("connection refused".to_string())));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        assert_eq!(service.list_contacts().await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_list_contacts_ignores_corrupt_entry() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        cache
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(b"garbage".to_vec())));
        repository
            .expect_list_all()
            .times(1)
            .returning(|| Ok(Vec::new()));
        cache.expect_set().times(1).returning(|_, _, _| Ok(()));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        assert!(service.list_contacts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_contact_not_found() {
        let mut repository = MockTestContactRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(MockTestCacheStore::new()),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        let result = service.get_contact(&ContactId::new()).await;
        assert!(matches!(result, Err(ContactError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_contact_stamps_clock_then_invalidates_then_publishes() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();
        let mut event_publisher = MockTestEventPublisher::new();
        let mut sequence = Sequence::new();

        let owner = UserId::new();
        let expected_event = format!("Contact Added: John <john@example.com> (owner {})", owner);

        repository
            .expect_create()
            .withf(move |contact| contact.owner_id == owner && contact.name.as_str() == "John")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|contact| Ok(contact));
        cache
            .expect_invalidate()
            .withf(|key| key == CONTACTS_CACHE_KEY)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        event_publisher
            .expect_publish()
            .withf(move |message, routing_key| {
                message == expected_event.as_bytes() && routing_key == "directory"
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(event_publisher),
            clock(),
            settings(),
        );

        let created = service
            .create_contact(&owner, details("John"))
            .await
            .unwrap();
        assert_eq!(created.owner_id, owner);
        assert_eq!(created.created_at, now());
    }

    #[tokio::test]
    async fn test_create_contact_survives_side_effect_failures() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_create()
            .times(1)
            .returning(|contact| Ok(contact));
        cache
            .expect_invalidate()
            .times(1)
            .returning(|_| Err(CacheError::Unavailable("timeout".to_string())));
        event_publisher
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(EventPublisherError::PublishFailed("broker down".to_string())));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(event_publisher),
            clock(),
            settings(),
        );

        assert!(service
            .create_contact(&UserId::new(), details("John"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_contact_store_failure_skips_side_effects() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_create()
            .times(1)
            .returning(|_| Err(ContactError::DatabaseError("disk full".to_string())));
        cache.expect_invalidate().times(0);
        event_publisher.expect_publish().times(0);

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(event_publisher),
            clock(),
            settings(),
        );

        let result = service.create_contact(&UserId::new(), details("John")).await;
        assert!(matches!(result, Err(ContactError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_update_contact_success_invalidates() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        let existing = contact("John");
        let id = existing.id;

        repository
            .expect_update()
            .withf(move |contact_id, details| {
                *contact_id == id && details.name.as_str() == "Johnny"
            })
            .times(1)
            .returning(move |_, details| {
                Ok(Some(Contact {
                    name: details.name,
                    ..existing.clone()
                }))
            });
        cache.expect_invalidate().times(1).returning(|_| Ok(()));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        let updated = service.update_contact(&id, details("Johnny")).await.unwrap();
        assert_eq!(updated.name.as_str(), "Johnny");
    }

    #[tokio::test]
    async fn test_update_contact_not_found() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        repository
            .expect_update()
            .times(1)
            .returning(|_, _| Ok(None));
        cache.expect_invalidate().times(0);

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        let result = service.update_contact(&ContactId::new(), details("John")).await;
        assert!(matches!(result, Err(ContactError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_contact_success_invalidates() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        repository.expect_delete().times(1).returning(|_| Ok(true));
        cache
            .expect_invalidate()
            .withf(|key| key == CONTACTS_CACHE_KEY)
            .times(1)
            .returning(|_| Ok(()));

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        assert!(service.delete_contact(&ContactId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_contact_not_found() {
        let mut repository = MockTestContactRepository::new();
        let mut cache = MockTestCacheStore::new();

        repository.expect_delete().times(1).returning(|_| Ok(false));
        cache.expect_invalidate().times(0);

        let service = ContactService::new(
            Arc::new(repository),
            Arc::new(cache),
            Arc::new(MockTestEventPublisher::new()),
            clock(),
            settings(),
        );

        let result = service.delete_contact(&ContactId::new()).await;
        assert!(matches!(result, Err(ContactError::NotFound(_))));
    }
}
