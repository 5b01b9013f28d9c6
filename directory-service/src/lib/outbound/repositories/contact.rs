use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::contact::errors::ContactError;
use crate::contact::models::Address;
use crate::contact::models::Contact;
use crate::contact::models::ContactDetails;
use crate::contact::models::ContactId;
use crate::contact::models::ContactName;
use crate::contact::models::PhoneNumber;
use crate::contact::ports::ContactRepository;
use crate::credential::models::EmailAddress;
use crate::credential::models::UserId;

pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ContactRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    email: String,
    phone: String,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = ContactError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: ContactId(row.id),
            owner_id: UserId(row.owner_id),
            name: ContactName::new(row.name)?,
            email: EmailAddress::new(row.email)?,
            phone: PhoneNumber::new(row.phone)?,
            address: Address::new(row.address)?,
            created_at: row.created_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> ContactError {
    ContactError::DatabaseError(e.to_string())
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn list_all(&self) -> Result<Vec<Contact>, ContactError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, email, phone, address, created_at
            FROM contacts
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, ContactError> {
        let row: Option<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, email, phone, address, created_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Contact::try_from).transpose()
    }

    async fn create(&self, contact: Contact) -> Result<Contact, ContactError> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, owner_id, name, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(contact.id.0)
        .bind(contact.owner_id.0)
        .bind(contact.name.as_str())
        .bind(contact.email.as_str())
        .bind(contact.phone.as_str())
        .bind(contact.address.as_ref().map(Address::as_str))
        .bind(contact.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(contact)
    }

    async fn update(
        &self,
        id: &ContactId,
        details: ContactDetails,
    ) -> Result<Option<Contact>, ContactError> {
        let row: Option<ContactRow> = sqlx::query_as(
            r#"
            UPDATE contacts
            SET name = $2, email = $3, phone = $4, address = $5
            WHERE id = $1
            RETURNING id, owner_id, name, email, phone, address, created_at
            "#,
        )
        .bind(id.0)
        .bind(details.name.as_str())
        .bind(details.email.as_str())
        .bind(details.phone.as_str())
        .bind(details.address.as_ref().map(Address::as_str))
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Contact::try_from).transpose()
    }

    async fn delete(&self, id: &ContactId) -> Result<bool, ContactError> {
        let result = sqlx::query(
            r#"
            DELETE FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}
