//! Local JSON file fallback store
//!
//! Reports live in a single JSON array ordered newest first; contacts
//! in a sibling file. Each mutation rewrites the file atomically
//! (temp + rename) under an async mutex, which is plenty for a
//! fallback that only exists so field reports survive a database
//! outage.

use async_trait::async_trait;
use chrono::Utc;
use hivewatch_common::models::{ContactInput, EmergencyContact, NewReport, Report};
use hivewatch_common::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ContactStore, ReportStore};

pub struct FileStore {
    reports_path: PathBuf,
    contacts_path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(reports_path: PathBuf, contacts_path: PathBuf) -> Self {
        FileStore {
            reports_path,
            contacts_path,
            lock: Mutex::new(()),
        }
    }

    fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Corrupt store file {}: {}", path.display(), e)))
    }

    fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| Error::Storage(format!("Serialization failed: {}", e)))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| Error::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for FileStore {
    async fn save(&self, report: NewReport) -> Result<Report> {
        let _guard = self.lock.lock().await;
        let mut reports: Vec<Report> = Self::read_array(&self.reports_path)?;
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
        // Newest first, so readers get list order for free
        reports.insert(0, report.clone());
        Self::write_array(&self.reports_path, &reports)?;
        Ok(report)
    }

    async fn list_all(&self) -> Result<Vec<Report>> {
        let _guard = self.lock.lock().await;
        Self::read_array(&self.reports_path)
    }
}

#[async_trait]
impl ContactStore for FileStore {
    async fn create(&self, input: ContactInput) -> Result<EmergencyContact> {
        let _guard = self.lock.lock().await;
        let mut contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
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
        contacts.push(contact.clone());
        Self::write_array(&self.contacts_path, &contacts)?;
        Ok(contact)
    }

    async fn update(&self, id: Uuid, input: ContactInput) -> Result<EmergencyContact> {
        let _guard = self.lock.lock().await;
        let mut contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
        let contact = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))?;
        contact.region = input.region;
        contact.contact_name = input.contact_name;
        contact.phone_number = input.phone_number;
        contact.designation = input.designation;
        contact.city = input.city;
        contact.state = input.state;
        let updated = contact.clone();
        Self::write_array(&self.contacts_path, &contacts)?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            return Err(Error::NotFound(format!("Contact not found: {}", id)));
        }
        Self::write_array(&self.contacts_path, &contacts)?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<EmergencyContact>> {
        let _guard = self.lock.lock().await;
        let mut contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
        contacts.sort_by(|a, b| a.region.cmp(&b.region));
        Ok(contacts)
    }

    async fn find_by_city(&self, city: &str) -> Result<Option<EmergencyContact>> {
        let _guard = self.lock.lock().await;
        let contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
        Ok(contacts
            .into_iter()
            .find(|c| c.city.as_deref() == Some(city)))
    }

    async fn find_any(&self) -> Result<Option<EmergencyContact>> {
        let _guard = self.lock.lock().await;
        let contacts: Vec<EmergencyContact> = Self::read_array(&self.contacts_path)?;
        Ok(contacts.into_iter().next())
    }
}
