//! The persistent document store. One document, loaded once, replaced (never
//! edited in place) on every mutation, and flushed to durable storage before
//! the mutation returns.

use super::{
    errors::LoadError,
    models::{
        next_invoice_code, Appointment, Client, Document, Invoice, MileageLog,
        Settings, SettingsPatch,
    },
    storage::Storage,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// What views get to see of the store: a read-only snapshot and the
/// mutations. None of these report failure; persistence problems are logged
/// and the in-memory document stays authoritative.
pub trait StoreAccessor: Send + Sync {
    fn snapshot(&self) -> Arc<Document>;
    fn add_appointment(&self, entry: Appointment);
    fn add_client(&self, entry: Client);
    fn add_invoice(&self, entry: Invoice);
    /// Give `entry` the next invoice code and add it, as one step. Returns
    /// the invoice as stored.
    fn issue_invoice(&self, entry: Invoice) -> Invoice;
    fn add_mileage_log(&self, entry: MileageLog);
    fn update_settings(&self, partial: SettingsPatch);
}

pub struct DocumentStore<S> {
    storage: S,
    key: String,
    document: Arc<Document>,
}

impl<S: Storage> DocumentStore<S> {
    /// Load the document stored under `key`, or start from the default
    /// document if there is nothing usable there.
    pub fn open(storage: S, key: &str) -> Self {
        let document = load_document(&storage, key);
        Self {
            storage,
            key: key.to_string(),
            document: Arc::new(document),
        }
    }

    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn add_appointment(&mut self, entry: Appointment) {
        self.commit(|doc| doc.appointments.insert(0, entry));
    }

    pub fn add_client(&mut self, entry: Client) {
        self.commit(|doc| doc.clients.insert(0, entry));
    }

    pub fn add_invoice(&mut self, entry: Invoice) {
        self.commit(|doc| doc.invoices.insert(0, entry));
    }

    pub fn issue_invoice(&mut self, mut entry: Invoice) -> Invoice {
        entry.id = next_invoice_code(&self.document.invoices);
        self.add_invoice(entry.clone());
        entry
    }

    pub fn add_mileage_log(&mut self, entry: MileageLog) {
        self.commit(|doc| doc.mileage_logs.insert(0, entry));
    }

    pub fn update_settings(&mut self, partial: SettingsPatch) {
        self.commit(|doc| partial.apply(&mut doc.settings));
    }

    fn commit<F>(&mut self, change: F)
    where
        F: FnOnce(&mut Document),
    {
        // Anyone holding the previous snapshot keeps an unchanged document.
        let mut next = Document::clone(&self.document);
        change(&mut next);
        self.document = Arc::new(next);
        self.flush();
    }

    fn flush(&mut self) {
        let payload = match serde_json::to_string(self.document.as_ref()) {
            Ok(v) => v,
            Err(error) => {
                tracing::error!(
                    key = %self.key,
                    error = %error,
                    "failed to encode document; keeping in-memory copy",
                );
                return;
            }
        };
        if let Err(error) = self.storage.set_item(&self.key, &payload) {
            tracing::error!(
                key = %self.key,
                bytes = payload.len(),
                error = %error,
                "failed to flush document; keeping in-memory copy",
            );
        }
    }
}

/// Never fails: anything unreadable is logged and replaced by the default
/// document.
pub fn load_document(storage: &impl Storage, key: &str) -> Document {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Document::default(),
        Err(error) => {
            tracing::warn!(
                key = %key,
                error = %LoadError::from(error),
                "failed to read stored document; booting with defaults",
            );
            return Document::default();
        }
    };

    match merge_with_defaults(&raw) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!(
                key = %key,
                error = %error,
                "failed to parse stored document; booting with defaults",
            );
            Document::default()
        }
    }
}

/// Top-level fields missing from `raw` (or `null`) come from the default
/// document. `settings` is merged key by key, stored keys winning. A field
/// (or settings key) of the wrong shape is logged and keeps its default;
/// its siblings are still taken from `raw`.
pub fn merge_with_defaults(raw: &str) -> Result<Document, LoadError> {
    let Value::Object(stored) = serde_json::from_str::<Value>(raw)? else {
        return Err(LoadError::NotAnObject);
    };
    let Value::Object(mut merged) = serde_json::to_value(Document::default())?
    else {
        return Err(LoadError::NotAnObject);
    };

    for (field, value) in stored {
        let fits = match (field.as_str(), &value) {
            (_, Value::Null) => continue,
            ("settings", Value::Object(overrides)) => {
                merge_settings(&mut merged, overrides);
                continue;
            }
            ("settings", _) => false,
            ("appointments", v) => fits::<Vec<Appointment>>(v),
            ("clients", v) => fits::<Vec<Client>>(v),
            ("invoices", v) => fits::<Vec<Invoice>>(v),
            ("mileageLogs", v) => fits::<Vec<MileageLog>>(v),
            // not ours; dropped on the next flush
            _ => continue,
        };
        if fits {
            merged.insert(field, value);
        } else {
            tracing::warn!(
                field = %field,
                "stored field has the wrong shape; keeping default",
            );
        }
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

fn fits<T: DeserializeOwned>(value: &Value) -> bool {
    T::deserialize(value).is_ok()
}

fn merge_settings(
    merged: &mut Map<String, Value>,
    overrides: &Map<String, Value>,
) {
    let base = merged
        .entry("settings")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(base) = base else {
        return;
    };
    for (key, value) in overrides.iter().filter(|(_, v)| !v.is_null()) {
        let mut candidate = base.clone();
        candidate.insert(key.clone(), value.clone());
        if fits::<Settings>(&Value::Object(candidate)) {
            base.insert(key.clone(), value.clone());
        } else {
            tracing::warn!(
                key = %key,
                "stored setting has the wrong shape; keeping default",
            );
        }
    }
}

/// The store as handed to views: one `DocumentStore` behind a lock so every
/// mutation runs to completion before the next one starts.
pub struct SharedStore<S> {
    inner: Mutex<DocumentStore<S>>,
}

impl<S: Storage> SharedStore<S> {
    pub fn new(store: DocumentStore<S>) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut DocumentStore<S>) -> T) -> T {
        // A panic mid-mutation can't leave a half-built document behind
        // (commit swaps whole values), so a poisoned lock is still usable.
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl<S: Storage> StoreAccessor for SharedStore<S> {
    fn snapshot(&self) -> Arc<Document> {
        self.with_store(|s| s.snapshot())
    }
    fn add_appointment(&self, entry: Appointment) {
        self.with_store(|s| s.add_appointment(entry))
    }
    fn add_client(&self, entry: Client) {
        self.with_store(|s| s.add_client(entry))
    }
    fn add_invoice(&self, entry: Invoice) {
        self.with_store(|s| s.add_invoice(entry))
    }
    fn issue_invoice(&self, entry: Invoice) -> Invoice {
        self.with_store(|s| s.issue_invoice(entry))
    }
    fn add_mileage_log(&self, entry: MileageLog) {
        self.with_store(|s| s.add_mileage_log(entry))
    }
    fn update_settings(&self, partial: SettingsPatch) {
        self.with_store(|s| s.update_settings(partial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{InvoiceStatus, Settings},
        storage::MemoryStorage,
    };

    const KEY: &str = "bizdesk.document";

    fn fresh() -> DocumentStore<MemoryStorage> {
        DocumentStore::open(MemoryStorage::new(), KEY)
    }

    fn stored(raw: &str) -> DocumentStore<MemoryStorage> {
        DocumentStore::open(MemoryStorage::new().with_item(KEY, raw), KEY)
    }

    fn persisted(store: &DocumentStore<MemoryStorage>) -> Document {
        let raw = store
            .storage
            .get_item(KEY)
            .expect("memory storage reads")
            .expect("document was flushed");
        serde_json::from_str(&raw).expect("flushed document parses")
    }

    #[test]
    fn test_fresh_session_adds_client() {
        let mut store = fresh();
        let doc = store.snapshot();
        assert_eq!(doc.appointments.len(), 2);
        assert_eq!(doc.clients.len(), 2);

        store.add_client(Client::new("Acme"));

        let doc = store.snapshot();
        assert_eq!(doc.clients.len(), 3);
        assert_eq!(doc.clients[0].name, "Acme");
    }

    #[test]
    fn test_adds_prepend_one_at_a_time() {
        let mut store = fresh();
        for n in 0..5 {
            let before = store.snapshot();
            let appt = Appointment {
                id: format!("a{n}"),
                ..Default::default()
            };
            let log = MileageLog {
                id: format!("m{n}"),
                miles: n as f64,
                ..Default::default()
            };
            let invoice = Invoice {
                id: format!("INV-9{n}"),
                ..Default::default()
            };
            store.add_appointment(appt.clone());
            store.add_mileage_log(log.clone());
            store.add_invoice(invoice.clone());

            let after = store.snapshot();
            assert_eq!(after.appointments.len(), before.appointments.len() + 1);
            assert_eq!(after.mileage_logs.len(), before.mileage_logs.len() + 1);
            assert_eq!(after.invoices.len(), before.invoices.len() + 1);
            assert_eq!(after.appointments[0], appt);
            assert_eq!(after.mileage_logs[0], log);
            assert_eq!(after.invoices[0], invoice);
        }
    }

    #[test]
    fn test_every_mutation_is_flushed() {
        let mut store = fresh();
        store.add_client(Client::new("Acme"));
        assert_eq!(persisted(&store), *store.snapshot());

        store.update_settings(SettingsPatch {
            business_name: Some("Acme Notary".to_string()),
            ..Default::default()
        });
        assert_eq!(persisted(&store), *store.snapshot());
        assert_eq!(persisted(&store).settings.business_name, "Acme Notary");
    }

    #[test]
    fn test_old_snapshot_is_untouched() {
        let mut store = fresh();
        let before = store.snapshot();
        store.add_client(Client::new("Acme"));
        store.update_settings(SettingsPatch {
            tax_rate: Some(10.0),
            ..Default::default()
        });

        assert_eq!(*before, Document::default());
        assert_ne!(*store.snapshot(), *before);
    }

    #[test]
    fn test_partial_record_only_settings() {
        let store = stored(r#"{"settings":{"taxRate":20}}"#);
        let doc = store.snapshot();
        let defaults = Document::default();

        assert_eq!(doc.settings.tax_rate, 20.0);
        assert_eq!(doc.settings.monthly_goal, 15000.0);
        assert_eq!(doc.appointments, defaults.appointments);
        assert_eq!(doc.clients, defaults.clients);
        assert_eq!(doc.invoices, defaults.invoices);
        assert_eq!(doc.mileage_logs, defaults.mileage_logs);
    }

    #[test]
    fn test_merge_is_field_wise() {
        let defaults = Document::default();
        let raw = r#"{
            "clients": [{"id": "c9", "name": "Stored Client"}],
            "invoices": [],
            "mileageLogs": null
        }"#;
        let doc = merge_with_defaults(raw).expect("well formed");

        assert_eq!(doc.clients.len(), 1);
        assert_eq!(doc.clients[0].name, "Stored Client");
        assert!(doc.invoices.is_empty());
        assert_eq!(doc.mileage_logs, defaults.mileage_logs);
        assert_eq!(doc.appointments, defaults.appointments);
        assert_eq!(doc.settings, defaults.settings);
    }

    #[test]
    fn test_corrupt_record_falls_back_to_defaults() {
        for raw in ["{not json", "[1, 2, 3]", "42", "\"hello\"", "null"] {
            let store = stored(raw);
            assert_eq!(*store.snapshot(), Document::default(), "{raw}");
        }
    }

    #[test]
    fn test_wrong_shape_field_keeps_only_its_default() {
        let defaults = Document::default();
        let store = stored(
            r#"{
                "clients": 7,
                "invoices": [],
                "mileageLogs": [{"id": "m1", "miles": "far"}],
                "settings": {"taxRate": "high", "monthlyGoal": 100}
            }"#,
        );
        let doc = store.snapshot();

        assert_eq!(doc.clients, defaults.clients);
        assert!(doc.invoices.is_empty());
        assert_eq!(doc.mileage_logs, defaults.mileage_logs);
        assert_eq!(doc.appointments, defaults.appointments);
        assert_eq!(doc.settings.tax_rate, 25.0);
        assert_eq!(doc.settings.monthly_goal, 100.0);
    }

    #[test]
    fn test_non_object_settings_keeps_defaults() {
        let doc = merge_with_defaults(r#"{"settings": "oops"}"#)
            .expect("well formed");
        assert_eq!(doc.settings, Settings::default());
    }

    #[test]
    fn test_update_settings_changes_one_key() {
        let mut store = fresh();
        let patch = SettingsPatch {
            monthly_goal: Some(20000.0),
            ..Default::default()
        };
        store.update_settings(patch.clone());
        let once = store.snapshot();
        store.update_settings(patch);

        assert_eq!(*store.snapshot(), *once);
        assert_eq!(
            once.settings,
            Settings {
                monthly_goal: 20000.0,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_round_trip_through_storage() {
        let mut store = fresh();
        store.add_client(Client::new("Acme"));
        store.add_invoice(Invoice {
            id: "INV-003".to_string(),
            client: "Acme".to_string(),
            amount: 1200.5,
            date: "2025-06-01".to_string(),
            due_date: "2025-07-01".to_string(),
            status: InvoiceStatus::Overdue,
        });
        store.update_settings(SettingsPatch {
            owner_name: Some("Sam".to_string()),
            ..Default::default()
        });
        let expected = store.snapshot();

        let DocumentStore { storage, .. } = store;
        let reloaded = DocumentStore::open(storage, KEY);
        assert_eq!(*reloaded.snapshot(), *expected);
    }

    #[test]
    fn test_flush_failure_keeps_memory_authoritative() {
        let mut store = DocumentStore::open(MemoryStorage::with_quota(16), KEY);
        store.add_client(Client::new("Acme"));
        store.add_client(Client::new("Globex"));

        let doc = store.snapshot();
        assert_eq!(doc.clients.len(), 4);
        assert_eq!(doc.clients[0].name, "Globex");
        assert!(store.storage.get_item(KEY).expect("reads").is_none());
    }

    #[test]
    fn test_concurrent_invoices_get_distinct_codes() {
        let shared = SharedStore::new(fresh());
        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        shared.issue_invoice(Invoice {
                            client: "Acme".to_string(),
                            amount: 10.0,
                            ..Default::default()
                        });
                    }
                });
            }
        });

        let doc = shared.snapshot();
        let codes: std::collections::HashSet<&str> =
            doc.invoices.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(doc.invoices.len(), 2 + 16 * 20);
        assert_eq!(codes.len(), doc.invoices.len());
        assert_eq!(doc.invoices[0].id, "INV-322");
    }

    #[test]
    fn test_shared_store_snapshots() {
        let shared = SharedStore::new(fresh());
        let accessor: &dyn StoreAccessor = &shared;
        let before = accessor.snapshot();
        accessor.add_client(Client::new("Acme"));

        assert_eq!(before.clients.len(), 2);
        assert_eq!(accessor.snapshot().clients.len(), 3);
    }
}
