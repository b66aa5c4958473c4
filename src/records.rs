//! Contact records and the snapshot source for archiving
//!
//! The archiver does not know what it archives. It asks a [`RecordSource`]
//! for a JSON snapshot at the moment a run completes. [`ContactStore`] is the
//! in-memory contact list the application keeps, and is the source used in
//! practice.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::config::RecordsConfig;
use crate::error::{Error, Result};

/// Supplies the data a completed archive job serializes
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use contact_archiver::records::RecordSource;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl RecordSource for Fixed {
///     async fn snapshot(&self) -> contact_archiver::Result<serde_json::Value> {
///         Ok(serde_json::json!([{ "id": 1 }]))
///     }
///
///     fn name(&self) -> &'static str {
///         "fixed"
///     }
/// }
/// ```
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Current records as a JSON array
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be serialized.
    async fn snapshot(&self) -> Result<serde_json::Value>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Identifier assigned by the store
pub type ContactId = u64;

/// A stored contact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    /// Store-assigned id
    pub id: ContactId,
    /// First name
    pub first: String,
    /// Last name
    pub last: String,
    /// Phone number
    pub phone: String,
    /// Email address (required, unique across the store)
    pub email: String,
}

impl Contact {
    fn matches(&self, needle: &str) -> bool {
        [&self.first, &self.last, &self.phone, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Contact fields supplied on create and update
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewContact {
    /// First name
    #[serde(default)]
    pub first: String,
    /// Last name
    #[serde(default)]
    pub last: String,
    /// Phone number
    #[serde(default)]
    pub phone: String,
    /// Email address
    #[serde(default)]
    pub email: String,
}

#[derive(Debug)]
struct Inner {
    contacts: BTreeMap<ContactId, Contact>,
    /// None once the id space is used up
    next_id: Option<ContactId>,
}

impl Inner {
    fn check_email(&self, email: &str, own_id: Option<ContactId>) -> Result<()> {
        if email.trim().is_empty() {
            return Err(Error::Validation {
                field: "email".into(),
                message: "Email Required".into(),
            });
        }
        let taken = self
            .contacts
            .values()
            .any(|c| c.email == email && Some(c.id) != own_id);
        if taken {
            return Err(Error::Validation {
                field: "email".into(),
                message: "Email Must Be Unique".into(),
            });
        }
        Ok(())
    }
}

/// In-memory contact list
///
/// Cloneable; clones share the same contacts.
#[derive(Clone, Debug)]
pub struct ContactStore {
    inner: Arc<RwLock<Inner>>,
    page_size: usize,
}

impl ContactStore {
    /// Create an empty store
    pub fn new(config: &RecordsConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                contacts: BTreeMap::new(),
                next_id: Some(1),
            })),
            page_size: config.page_size.max(1),
        }
    }

    /// Create a store seeded with existing contacts (ids are kept)
    pub fn from_contacts(config: &RecordsConfig, contacts: Vec<Contact>) -> Self {
        let contacts: BTreeMap<_, _> = contacts.into_iter().map(|c| (c.id, c)).collect();
        let next_id = contacts
            .keys()
            .next_back()
            .map_or(Some(1), |id| id.checked_add(1));
        Self {
            inner: Arc::new(RwLock::new(Inner { contacts, next_id })),
            page_size: config.page_size.max(1),
        }
    }

    /// Add a contact
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the email is empty or already used,
    /// or if no ids are left to assign.
    pub async fn insert(&self, new: NewContact) -> Result<Contact> {
        let mut inner = self.inner.write().await;
        inner.check_email(&new.email, None)?;

        let id = inner.next_id.ok_or_else(|| Error::Validation {
            field: "id".into(),
            message: "No Contact Ids Left".into(),
        })?;
        inner.next_id = id.checked_add(1);
        let contact = Contact {
            id,
            first: new.first,
            last: new.last,
            phone: new.phone,
            email: new.email,
        };
        inner.contacts.insert(id, contact.clone());
        tracing::debug!(contact_id = id, "Contact created");
        Ok(contact)
    }

    /// Replace a contact's fields
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::Validation`] if the email is empty or used by another contact.
    pub async fn update(&self, id: ContactId, fields: NewContact) -> Result<Contact> {
        let mut inner = self.inner.write().await;
        if !inner.contacts.contains_key(&id) {
            return Err(Error::NotFound(format!("contact {id}")));
        }
        inner.check_email(&fields.email, Some(id))?;

        let contact = Contact {
            id,
            first: fields.first,
            last: fields.last,
            phone: fields.phone,
            email: fields.email,
        };
        inner.contacts.insert(id, contact.clone());
        tracing::debug!(contact_id = id, "Contact updated");
        Ok(contact)
    }

    /// Look up a contact by id
    pub async fn find(&self, id: ContactId) -> Option<Contact> {
        self.inner.read().await.contacts.get(&id).cloned()
    }

    /// Remove a contact
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn delete(&self, id: ContactId) -> Result<Contact> {
        let removed = self.inner.write().await.contacts.remove(&id);
        match removed {
            Some(contact) => {
                tracing::debug!(contact_id = id, "Contact deleted");
                Ok(contact)
            }
            None => Err(Error::NotFound(format!("contact {id}"))),
        }
    }

    /// Remove several contacts at once
    ///
    /// Either all ids are removed or none are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the first unknown id.
    pub async fn delete_many(&self, ids: &[ContactId]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        if let Some(missing) = ids.iter().find(|id| !inner.contacts.contains_key(*id)) {
            return Err(Error::NotFound(format!("contact {missing}")));
        }
        let removed = ids
            .iter()
            .filter(|id| inner.contacts.remove(*id).is_some())
            .count();
        tracing::info!(count = removed, "Contacts deleted");
        Ok(removed)
    }

    /// Number of stored contacts
    pub async fn count(&self) -> usize {
        self.inner.read().await.contacts.len()
    }

    /// One page of contacts in id order (pages start at 1)
    ///
    /// Page 0 is treated as page 1; pages past the end are empty.
    pub async fn all(&self, page: usize) -> Vec<Contact> {
        let skip = page.saturating_sub(1).saturating_mul(self.page_size);
        self.inner
            .read()
            .await
            .contacts
            .values()
            .skip(skip)
            .take(self.page_size)
            .cloned()
            .collect()
    }

    /// Contacts whose name, phone or email contains `text` (case-insensitive)
    pub async fn search(&self, text: &str) -> Vec<Contact> {
        let needle = text.to_lowercase();
        self.inner
            .read()
            .await
            .contacts
            .values()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordSource for ContactStore {
    async fn snapshot(&self) -> Result<serde_json::Value> {
        let inner = self.inner.read().await;
        let contacts: Vec<&Contact> = inner.contacts.values().collect();
        Ok(serde_json::to_value(contacts)?)
    }

    fn name(&self) -> &'static str {
        "contacts"
    }
}
