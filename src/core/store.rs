//! Record store behind a narrow data-access interface.
//!
//! The timeline only ever queries records. `MemoryStore` is the store the
//! application ships with: collections of JSON records kept in memory and
//! loaded from / saved to a single JSON document of the form
//! `{"collection": [record, ...], ...}`.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use super::calendar::CalendarDate;
use super::record::{
    self, CAMPAIGN, CURRENT_DATE_FIELD, NSCS, OBJECTS, Record, RecordSet, STORY_EVENTS,
};

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store document is not valid JSON
    #[error("Invalid JSON syntax: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    /// The store document is valid JSON but not shaped like a store
    #[error("Invalid store document: {message}")]
    InvalidDocument { message: String },

    /// Reading or writing the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No record with the given id exists in the collection
    #[error("No record '{id}' in collection '{collection}'")]
    RecordNotFound { collection: String, id: String },

    /// The service could not be reached
    #[allow(dead_code)] // Raised by remote services, not by `MemoryStore`
    #[error("Data service unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Field equality constraints for a query. Empty matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality constraint on a field.
    #[allow(dead_code)] // The timeline queries whole collections
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check if a record satisfies every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }
}

/// The data-access interface the timeline consumes.
pub trait DataService: Send + Sync {
    /// Return all records of `collection` matching `filter`.
    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError>;
}

/// In-memory record store, safe to share across threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Vec<Record>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store document.
    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let document: Value = serde_json::from_str(content)?;
        let Value::Object(document) = document else {
            return Err(StoreError::InvalidDocument {
                message: "top level must be an object of collections".to_string(),
            });
        };

        let mut collections = BTreeMap::new();
        for (name, records) in document {
            let Value::Array(records) = records else {
                return Err(StoreError::InvalidDocument {
                    message: format!("collection '{}' must be an array", name),
                });
            };

            let mut parsed = Vec::with_capacity(records.len());
            for (index, record) in records.into_iter().enumerate() {
                match record {
                    Value::Object(map) => parsed.push(map),
                    _ => {
                        return Err(StoreError::InvalidDocument {
                            message: format!("record {} in '{}' must be an object", index, name),
                        });
                    }
                }
            }
            collections.insert(name, parsed);
        }

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Load a store document from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        debug!(
            "loaded store from {} ({} records)",
            path.display(),
            store.record_count()
        );
        Ok(store)
    }

    /// Serialize the store as a pretty-printed document.
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        let collections = self.collections.read();
        let document: serde_json::Map<String, Value> = collections
            .iter()
            .map(|(name, records)| {
                let records = records.iter().cloned().map(Value::Object).collect();
                (name.clone(), Value::Array(records))
            })
            .collect();
        Ok(serde_json::to_string_pretty(&Value::Object(document))?)
    }

    /// Write the store document to disk.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = self.to_json_string()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.collections.read().values().map(Vec::len).sum()
    }

    /// Append a record to a collection, creating the collection if needed.
    #[allow(dead_code)] // Record editing surface; the viewer only reads
    pub fn insert(&self, collection: &str, record: Record) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Merge `fields` into the record with the given id. Last write wins.
    #[allow(dead_code)] // Record editing surface; the viewer only reads
    pub fn update(&self, collection: &str, id: &str, fields: Record) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| record::read_id(r).as_deref() == Some(id))
            })
            .ok_or_else(|| StoreError::RecordNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        for (field, value) in fields {
            target.insert(field, value);
        }
        Ok(())
    }

    /// Remove the record with the given id.
    #[allow(dead_code)] // Record editing surface; the viewer only reads
    pub fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let records = collections.get_mut(collection);
        let position = records.as_ref().and_then(|records| {
            records
                .iter()
                .position(|r| record::read_id(r).as_deref() == Some(id))
        });

        match (records, position) {
            (Some(records), Some(index)) => {
                records.remove(index);
                Ok(())
            }
            _ => Err(StoreError::RecordNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// The campaign's current date as stored now, ahead of any pending reload.
    pub fn reference_date(&self) -> Option<CalendarDate> {
        self.collections
            .read()
            .get(CAMPAIGN)?
            .iter()
            .find_map(|r| record::read_date(r, CURRENT_DATE_FIELD))
    }

    /// Set the campaign's current date, creating the campaign record if needed.
    pub fn set_reference_date(&self, date: CalendarDate) {
        let mut collections = self.collections.write();
        let campaign = collections.entry(CAMPAIGN.to_string()).or_default();
        match campaign.first_mut() {
            Some(state) => {
                state.insert(CURRENT_DATE_FIELD.to_string(), record::date_value(date));
            }
            None => {
                let mut state = Record::new();
                state.insert(CURRENT_DATE_FIELD.to_string(), record::date_value(date));
                campaign.push(state);
            }
        }
    }
}

impl DataService for MemoryStore {
    fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Query one collection, treating any failure as an empty result.
fn query_or_empty(service: &dyn DataService, collection: &str) -> Vec<Record> {
    match service.query(collection, &Filter::all()) {
        Ok(records) => records,
        Err(e) => {
            warn!("query of '{}' failed, treating as empty: {}", collection, e);
            Vec::new()
        }
    }
}

/// Fetch everything one timeline render needs.
///
/// Never fails: each collection that cannot be fetched contributes no
/// records, and the others are still returned.
pub fn fetch_record_set(service: &dyn DataService) -> RecordSet {
    let reference_date = query_or_empty(service, CAMPAIGN)
        .iter()
        .find_map(|r| record::read_date(r, CURRENT_DATE_FIELD));

    let set = RecordSet {
        story_events: query_or_empty(service, STORY_EVENTS),
        nscs: query_or_empty(service, NSCS),
        objects: query_or_empty(service, OBJECTS),
        reference_date,
    };
    debug!(
        "fetched {} story events, {} nscs, {} objects",
        set.story_events.len(),
        set.nscs.len(),
        set.objects.len()
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOCUMENT: &str = r#"{
        "campaign": [{ "id": "main", "current_date": { "year": 1027, "month": 6, "day": 15 } }],
        "story_events": [
            { "id": "e1", "title": "Arrival", "start_date": "1027-01-05" },
            { "id": "e2", "title": "Siege", "start_date": "1027-03-01", "end_date": "1027-03-20" }
        ],
        "nscs": [
            { "id": 1, "name": "Alrik", "first_seen": "1027-01-05", "is_active": true, "faction": "guard" },
            { "id": 2, "name": "Rondrian", "first_seen": "1027-02-01", "last_seen": "1027-04-01", "faction": "guard" },
            { "id": 3, "name": "Yasmina", "first_seen": "1027-02-10", "faction": "merchants" }
        ]
    }"#;

    struct FailingService;

    impl DataService for FailingService {
        fn query(&self, collection: &str, _filter: &Filter) -> Result<Vec<Record>, StoreError> {
            if collection == NSCS {
                return Err(StoreError::Unavailable {
                    reason: "connection reset".to_string(),
                });
            }
            Ok(vec![json!({ "id": "x", "title": "t", "start_date": "1027-01-01" })
                .as_object()
                .cloned()
                .unwrap_or_default()])
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_document() {
        let store = MemoryStore::from_json_str(DOCUMENT).unwrap();
        assert_eq!(store.record_count(), 6);
        assert_eq!(store.query(STORY_EVENTS, &Filter::all()).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            MemoryStore::from_json_str("{ nope"),
            Err(StoreError::JsonSyntax(_))
        ));
        assert!(matches!(
            MemoryStore::from_json_str("[1, 2]"),
            Err(StoreError::InvalidDocument { .. })
        ));
        assert!(matches!(
            MemoryStore::from_json_str(r#"{"nscs": {}}"#),
            Err(StoreError::InvalidDocument { .. })
        ));
        assert!(matches!(
            MemoryStore::from_json_str(r#"{"nscs": [1]}"#),
            Err(StoreError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_query_with_filter() {
        let store = MemoryStore::from_json_str(DOCUMENT).unwrap();
        let guards = store
            .query(NSCS, &Filter::all().eq("faction", "guard"))
            .unwrap();
        assert_eq!(guards.len(), 2);

        let active = store
            .query(NSCS, &Filter::all().eq("faction", "guard").eq("is_active", true))
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(record::read_str(&active[0], "name"), Some("Alrik"));
    }

    #[test]
    fn test_query_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.query("diary", &Filter::all()).unwrap().is_empty());
    }

    #[test]
    fn test_insert_update_delete() {
        let store = MemoryStore::new();
        store.insert(OBJECTS, record(json!({ "id": "o1", "name": "Sword" })));
        store
            .update(OBJECTS, "o1", record(json!({ "name": "Rusty Sword", "is_active": true })))
            .unwrap();

        let objects = store.query(OBJECTS, &Filter::all()).unwrap();
        assert_eq!(record::read_str(&objects[0], "name"), Some("Rusty Sword"));
        assert!(record::read_flag(&objects[0], "is_active"));

        assert!(matches!(
            store.update(OBJECTS, "missing", Record::new()),
            Err(StoreError::RecordNotFound { .. })
        ));

        store.delete(OBJECTS, "o1").unwrap();
        assert_eq!(store.record_count(), 0);
        assert!(store.delete(OBJECTS, "o1").is_err());
    }

    #[test]
    fn test_set_reference_date_creates_campaign_record() {
        let store = MemoryStore::new();
        let date = CalendarDate::new(1027, 7, 1).unwrap();
        store.set_reference_date(date);
        assert_eq!(fetch_record_set(&store).reference_date, Some(date));

        let later = date.add_days(10);
        store.set_reference_date(later);
        assert_eq!(store.query(CAMPAIGN, &Filter::all()).unwrap().len(), 1);
        assert_eq!(fetch_record_set(&store).reference_date, Some(later));
    }

    #[test]
    fn test_reference_date_reads_latest_write() {
        let store = MemoryStore::from_json_str(DOCUMENT).unwrap();
        let start = store.reference_date();

        let date = CalendarDate::new(1027, 7, 1).unwrap();
        store.set_reference_date(date);
        store.set_reference_date(store.reference_date().unwrap().add_days(1));
        assert_eq!(store.reference_date(), Some(date.add_days(1)));
        assert_ne!(store.reference_date(), start);

        assert_eq!(MemoryStore::new().reference_date(), None);
    }

    #[test]
    fn test_fetch_record_set() {
        let store = MemoryStore::from_json_str(DOCUMENT).unwrap();
        let set = fetch_record_set(&store);
        assert_eq!(set.story_events.len(), 2);
        assert_eq!(set.nscs.len(), 3);
        assert!(set.objects.is_empty());
        assert_eq!(set.reference_date, CalendarDate::new(1027, 6, 15));
    }

    #[test]
    fn test_fetch_failure_is_empty_for_that_collection_only() {
        let set = fetch_record_set(&FailingService);
        assert!(set.nscs.is_empty());
        assert_eq!(set.story_events.len(), 1);
        assert_eq!(set.objects.len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("campaign.json");

        let store = MemoryStore::from_json_str(DOCUMENT).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.record_count(), store.record_count());
        assert_eq!(
            fetch_record_set(&loaded).reference_date,
            CalendarDate::new(1027, 6, 15)
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = MemoryStore::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
