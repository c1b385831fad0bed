//! MongoDB document store
//!
//! Primary persistence backend. Documents carry the uuid string as
//! `_id` and BSON datetimes for sorting, translated to and from the
//! domain types at the boundary so the wire shape stays identical to
//! the file fallback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use hivewatch_common::models::{ContactInput, EmergencyContact, Gps, NewReport, Report};
use hivewatch_common::{Error, Result};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::options::{ClientOptions, ReturnDocument, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{ContactStore, ReportStore};

const REPORTS_COLLECTION: &str = "reports";
const CONTACTS_COLLECTION: &str = "emergency_contacts";
/// Keep the per-call connectivity probe snappy
const SELECTION_TIMEOUT: Duration = Duration::from_secs(2);

pub struct DocumentStore {
    client: Client,
    reports: Collection<ReportDoc>,
    contacts: Collection<ContactDoc>,
}

impl DocumentStore {
    /// Parse the connection options and build the handle. The driver
    /// connects lazily; reachability is probed per call, so a dead
    /// database at startup is not an error here.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| Error::Storage(format!("Invalid MongoDB URI: {}", e)))?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.server_selection_timeout = Some(SELECTION_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|e| Error::Storage(format!("MongoDB client setup failed: {}", e)))?;
        let db = client.database(database);
        Ok(DocumentStore {
            reports: db.collection(REPORTS_COLLECTION),
            contacts: db.collection(CONTACTS_COLLECTION),
            client,
        })
    }

    /// Connectivity probe used by the fallback selector before every
    /// read and write.
    pub async fn is_reachable(&self) -> bool {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }
}

fn storage_err(e: mongodb::error::Error) -> Error {
    Error::Storage(format!("Document store error: {}", e))
}

fn to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| Error::Storage(format!("Corrupt document id {}: {}", id, e)))
}

/// Report document shape, BSON datetime for sort-by-timestamp
#[derive(Debug, Serialize, Deserialize)]
struct ReportDoc {
    #[serde(rename = "_id")]
    id: String,
    image: String,
    gps: Gps,
    location_type: hivewatch_common::models::LocationType,
    user_role: hivewatch_common::models::UserRole,
    address: Option<String>,
    phone_number: Option<String>,
    timestamp: BsonDateTime,
}

impl From<&Report> for ReportDoc {
    fn from(report: &Report) -> Self {
        ReportDoc {
            id: report.id.to_string(),
            image: report.image.clone(),
            gps: report.gps,
            location_type: report.location_type,
            user_role: report.user_role,
            address: report.address.clone(),
            phone_number: report.phone_number.clone(),
            timestamp: BsonDateTime::from_millis(report.timestamp.timestamp_millis()),
        }
    }
}

impl TryFrom<ReportDoc> for Report {
    type Error = Error;

    fn try_from(doc: ReportDoc) -> Result<Self> {
        Ok(Report {
            id: parse_id(&doc.id)?,
            image: doc.image,
            gps: doc.gps,
            location_type: doc.location_type,
            user_role: doc.user_role,
            address: doc.address,
            phone_number: doc.phone_number,
            timestamp: to_chrono(doc.timestamp),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ContactDoc {
    #[serde(rename = "_id")]
    id: String,
    region: String,
    contact_name: String,
    phone_number: String,
    designation: String,
    city: Option<String>,
    state: Option<String>,
    created_at: BsonDateTime,
}

impl From<&EmergencyContact> for ContactDoc {
    fn from(contact: &EmergencyContact) -> Self {
        ContactDoc {
            id: contact.id.to_string(),
            region: contact.region.clone(),
            contact_name: contact.contact_name.clone(),
            phone_number: contact.phone_number.clone(),
            designation: contact.designation.clone(),
            city: contact.city.clone(),
            state: contact.state.clone(),
            created_at: BsonDateTime::from_millis(contact.created_at.timestamp_millis()),
        }
    }
}

impl TryFrom<ContactDoc> for EmergencyContact {
    type Error = Error;

    fn try_from(doc: ContactDoc) -> Result<Self> {
        Ok(EmergencyContact {
            id: parse_id(&doc.id)?,
            region: doc.region,
            contact_name: doc.contact_name,
            phone_number: doc.phone_number,
            designation: doc.designation,
            city: doc.city,
            state: doc.state,
            created_at: to_chrono(doc.created_at),
        })
    }
}

#[async_trait]
impl ReportStore for DocumentStore {
    async fn save(&self, report: NewReport) -> Result<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            image: report.image,
            gps: report.gps,
            location_type: report.location_type,
            user_role: report.user_role,
            address: report.address,
            phone_number: report.phone_number,
            timestamp: Utc::now(),
        };
        self.reports
            .insert_one(ReportDoc::from(&report))
            .await
            .map_err(storage_err)?;
        Ok(report)
    }

    async fn list_all(&self) -> Result<Vec<Report>> {
        let docs: Vec<ReportDoc> = self
            .reports
            .find(doc! {})
            .sort(doc! { "timestamp": -1 })
            .await
            .map_err(storage_err)?
            .try_collect()
            .await
            .map_err(storage_err)?;
        docs.into_iter().map(Report::try_from).collect()
    }
}

#[async_trait]
impl ContactStore for DocumentStore {
    async fn create(&self, input: ContactInput) -> Result<EmergencyContact> {
        let contact = EmergencyContact {
            id: Uuid::new_v4(),
            region: input.region,
            contact_name: input.contact_name,
            phone_number: input.phone_number,
            designation: input.designation,
            city: input.city,
            state: input.state,
            created_at: Utc::now(),
        };
        self.contacts
            .insert_one(ContactDoc::from(&contact))
            .await
            .map_err(storage_err)?;
        Ok(contact)
    }

    async fn update(&self, id: Uuid, input: ContactInput) -> Result<EmergencyContact> {
        let update = doc! {
            "$set": {
                "region": &input.region,
                "contact_name": &input.contact_name,
                "phone_number": &input.phone_number,
                "designation": &input.designation,
                "city": input.city.clone(),
                "state": input.state.clone(),
            }
        };
        let updated = self
            .contacts
            .find_one_and_update(doc! { "_id": id.to_string() }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(storage_err)?
            .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))?;
        EmergencyContact::try_from(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = self
            .contacts
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(storage_err)?;
        if result.deleted_count == 0 {
            return Err(Error::NotFound(format!("Contact not found: {}", id)));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<EmergencyContact>> {
        let docs: Vec<ContactDoc> = self
            .contacts
            .find(doc! {})
            .sort(doc! { "region": 1 })
            .await
            .map_err(storage_err)?
            .try_collect()
            .await
            .map_err(storage_err)?;
        docs.into_iter().map(EmergencyContact::try_from).collect()
    }

    async fn find_by_city(&self, city: &str) -> Result<Option<EmergencyContact>> {
        self.contacts
            .find_one(doc! { "city": city })
            .await
            .map_err(storage_err)?
            .map(EmergencyContact::try_from)
            .transpose()
    }

    async fn find_any(&self) -> Result<Option<EmergencyContact>> {
        self.contacts
            .find_one(doc! {})
            .await
            .map_err(storage_err)?
            .map(EmergencyContact::try_from)
            .transpose()
    }
}
