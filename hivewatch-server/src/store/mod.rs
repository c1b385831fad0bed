//! Report and contact persistence
//!
//! A document database is the primary backend; when it is unreachable
//! at call time every read and write transparently falls over to a
//! local JSON file store with the same ordering and shape guarantees.
//! The backends are never reconciled; the file store is a fallback of
//! last resort, not a replica.

pub mod file;
pub mod mongo;

pub use file::FileStore;
pub use mongo::DocumentStore;

use async_trait::async_trait;
use hivewatch_common::models::{ContactInput, EmergencyContact, NewReport, Report};
use hivewatch_common::Result;
use tracing::warn;
use uuid::Uuid;

/// Colony report persistence.
///
/// `save` always returns a report with a generated id and server
/// timestamp, regardless of which backend served it.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, report: NewReport) -> Result<Report>;

    /// All reports, newest first.
    async fn list_all(&self) -> Result<Vec<Report>>;
}

/// Emergency contact directory (admin CRUD + lookup primitives).
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, input: ContactInput) -> Result<EmergencyContact>;
    async fn update(&self, id: Uuid, input: ContactInput) -> Result<EmergencyContact>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All contacts, sorted by region.
    async fn list_all(&self) -> Result<Vec<EmergencyContact>>;
    async fn find_by_city(&self, city: &str) -> Result<Option<EmergencyContact>>;
    async fn find_any(&self) -> Result<Option<EmergencyContact>>;
}

/// City -> any contact -> national default. Always yields exactly one
/// contact; an empty directory is not an error for a citizen in front
/// of a hive.
pub async fn lookup_contact(
    store: &dyn ContactStore,
    city: Option<&str>,
) -> Result<EmergencyContact> {
    if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(contact) = store.find_by_city(city).await? {
            return Ok(contact);
        }
    }
    if let Some(contact) = store.find_any().await? {
        return Ok(contact);
    }
    Ok(EmergencyContact::national_default())
}

/// Primary/fallback pair selected by a connectivity probe per call.
pub struct FallbackStore {
    primary: Option<DocumentStore>,
    fallback: FileStore,
}

enum Backend<'a> {
    Primary(&'a DocumentStore),
    Fallback(&'a FileStore),
}

impl FallbackStore {
    pub fn new(primary: Option<DocumentStore>, fallback: FileStore) -> Self {
        FallbackStore { primary, fallback }
    }

    async fn backend(&self) -> Backend<'_> {
        match &self.primary {
            Some(primary) if primary.is_reachable().await => Backend::Primary(primary),
            Some(_) => {
                warn!("Document store unreachable, using local file fallback");
                Backend::Fallback(&self.fallback)
            }
            None => Backend::Fallback(&self.fallback),
        }
    }

    async fn reports(&self) -> &dyn ReportStore {
        match self.backend().await {
            Backend::Primary(store) => store,
            Backend::Fallback(store) => store,
        }
    }

    async fn contacts(&self) -> &dyn ContactStore {
        match self.backend().await {
            Backend::Primary(store) => store,
            Backend::Fallback(store) => store,
        }
    }
}

#[async_trait]
impl ReportStore for FallbackStore {
    async fn save(&self, report: NewReport) -> Result<Report> {
        self.reports().await.save(report).await
    }

    async fn list_all(&self) -> Result<Vec<Report>> {
        self.reports().await.list_all().await
    }
}

#[async_trait]
impl ContactStore for FallbackStore {
    async fn create(&self, input: ContactInput) -> Result<EmergencyContact> {
        self.contacts().await.create(input).await
    }

    async fn update(&self, id: Uuid, input: ContactInput) -> Result<EmergencyContact> {
        self.contacts().await.update(id, input).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.contacts().await.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<EmergencyContact>> {
        self.contacts().await.list_all().await
    }

    async fn find_by_city(&self, city: &str) -> Result<Option<EmergencyContact>> {
        self.contacts().await.find_by_city(city).await
    }

    async fn find_any(&self) -> Result<Option<EmergencyContact>> {
        self.contacts().await.find_any().await
    }
}
