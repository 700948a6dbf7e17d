//! Local demo appointment store
//!
//! A JSON file holding an ordered list of demo appointment records. This
//! is visibly separate from on-chain data: the contract clients never
//! read or write it, and nothing here is reported as a chain-confirmed
//! booking. Unlike the chain's tombstone flag, a local cancel deletes
//! the record outright.

use crate::error::NodeResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A demo appointment as persisted on disk. Field names mirror the view
/// records the chain clients produce, so either source renders the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAppointment {
    pub id: String,
    pub doctor_id: u64,
    pub doctor_name: String,
    pub doctor_specialization: String,
    pub timestamp: u64,
    #[serde(rename = "feeInEth")]
    pub fee_eth: String,
    pub is_paid: bool,
    pub is_cancelled: bool,
}

pub struct LocalAppointmentStore {
    path: PathBuf,
}

impl LocalAppointmentStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records, oldest first. A missing file is an empty list;
    /// a corrupt file is an error.
    pub fn load(&self) -> NodeResult<Vec<StoredAppointment>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Append a record and persist the whole list.
    pub fn add(&self, record: StoredAppointment) -> NodeResult<()> {
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)
    }

    /// Delete a record by id. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> NodeResult<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    fn save(&self, records: &[StoredAppointment]) -> NodeResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), count = records.len(), "saved local appointments");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> StoredAppointment {
        StoredAppointment {
            id: id.to_string(),
            doctor_id: 2,
            doctor_name: "Dr. Michael Chen".into(),
            doctor_specialization: "Neurologist".into(),
            timestamp: 1_700_000_000,
            fee_eth: "0.025".into(),
            is_paid: true,
            is_cancelled: false,
        }
    }

    #[test]
    fn missing_file_is_empty_list() {
        let dir = TempDir::new().expect("tempdir");
        let store = LocalAppointmentStore::open(dir.path().join("appointments.json"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn add_and_remove_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = LocalAppointmentStore::open(dir.path().join("appointments.json"));

        store.add(record("a")).expect("add");
        store.add(record("b")).expect("add");
        assert_eq!(store.load().expect("load").len(), 2);

        assert!(store.remove("a").expect("remove"));
        let remaining = store.load().expect("load");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");

        assert!(!store.remove("missing").expect("remove"));
    }

    #[test]
    fn corrupt_file_surfaces_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("appointments.json");
        std::fs::write(&path, "not json").expect("write");
        let store = LocalAppointmentStore::open(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn preserves_record_field_names() {
        let json = serde_json::to_value(record("a")).expect("json");
        assert!(json.get("doctorName").is_some());
        assert!(json.get("feeInEth").is_some());
        assert!(json.get("isCancelled").is_some());
    }
}
