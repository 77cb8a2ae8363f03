use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use audit_trail_api::MetadataError;

use crate::filter::RowFilters;
use crate::metadata::{EntityDescriptor, KeyGeneration, ModelRegistry};
use crate::models::audit::{ChangeHeaderModel, PropertyDiffModel, CHANGE_HEADER_TABLE, PROPERTY_DIFF_TABLE};
use crate::models::entity::EntityType;
use crate::models::value::{PropertyBag, PropertyValue, ValueKind};
use crate::repository::entity_store::{EntityStore, EntityWrite, WriteKind};
use crate::repository::load_audits::LoadAudits;
use crate::repository::pagination::{Page, PageRequest};

#[derive(Error, Debug)]
pub enum InMemoryStoreError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Writes to table '{0}' are rejected")]
    WriteRejected(String),

    #[error("No row with key {key} in table '{table}'")]
    RowNotFound { table: String, key: String },

    #[error("Duplicate key {key} in table '{table}'")]
    DuplicateKey { table: String, key: String },

    #[error("Entity '{0}' has no key value")]
    MissingKey(String),

    #[error("Entity '{0}' has a generated key that is not an integer")]
    UnsupportedGeneratedKey(String),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    rows: HashMap<&'static str, Vec<PropertyBag>>,
    sequences: HashMap<&'static str, i64>,
}

/// In-process [`EntityStore`] keeping rows as property bags.
///
/// A batch of writes is applied to a copy of the tables and swapped in at
/// the end, so a failing batch leaves no trace. Generated keys come from a
/// per-table sequence starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    rejected: Mutex<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the next generated key of a table.
    pub fn set_next_key(&self, table: &'static str, next: i64) {
        self.tables.lock().sequences.insert(table, next - 1);
    }

    /// Makes every batch touching the table fail.
    pub fn fail_writes_to(&self, table: &str) {
        self.rejected.lock().insert(table.to_string());
    }

    pub fn accept_writes_to(&self, table: &str) {
        self.rejected.lock().remove(table);
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<PropertyBag> {
        self.tables.lock().rows.get(table).cloned().unwrap_or_default()
    }

    fn apply_one(
        tables: &mut Tables,
        descriptor: &EntityDescriptor,
        write: &mut EntityWrite,
    ) -> Result<(), InMemoryStoreError> {
        let key_property = descriptor.key.property;
        let rows = tables.rows.entry(descriptor.table).or_default();

        match write.kind {
            WriteKind::Insert => {
                let mut values = write.values.clone();
                let key = match write.key.clone().filter(|k| !k.is_null()) {
                    Some(key) => key,
                    None if descriptor.key_generation == KeyGeneration::Generated => {
                        if descriptor.key_kind != ValueKind::Int {
                            return Err(InMemoryStoreError::UnsupportedGeneratedKey(descriptor.name.to_string()));
                        }
                        let sequence = tables.sequences.entry(descriptor.table).or_insert(0);
                        *sequence += 1;
                        let key = PropertyValue::from(*sequence);
                        write.generated_key = Some(key.clone());
                        key
                    }
                    None => return Err(InMemoryStoreError::MissingKey(descriptor.name.to_string())),
                };

                if rows.iter().any(|row| row.get(key_property) == Some(&key)) {
                    return Err(InMemoryStoreError::DuplicateKey {
                        table: descriptor.table.to_string(),
                        key: key.to_audit_text().unwrap_or_default(),
                    });
                }
                values.insert(key_property, key);
                rows.push(values);
            }
            WriteKind::Update | WriteKind::Delete => {
                let key = write
                    .key
                    .clone()
                    .ok_or_else(|| InMemoryStoreError::MissingKey(descriptor.name.to_string()))?;
                let index = rows
                    .iter()
                    .position(|row| row.get(key_property) == Some(&key))
                    .ok_or_else(|| InMemoryStoreError::RowNotFound {
                        table: descriptor.table.to_string(),
                        key: key.to_audit_text().unwrap_or_default(),
                    })?;

                if write.kind == WriteKind::Update {
                    rows[index] = write.values.clone();
                } else {
                    rows.remove(index);
                }
            }
        }
        Ok(())
    }

    fn headers_where<F>(&self, predicate: F) -> Result<Vec<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&ChangeHeaderModel) -> bool,
    {
        let tables = self.tables.lock();
        let mut headers = Vec::new();
        for row in tables.rows.get(CHANGE_HEADER_TABLE).into_iter().flatten() {
            let mut header = ChangeHeaderModel::from_values(row)?;
            if predicate(&header) {
                header.property_diffs = Self::diffs_of(&tables, header.id)?;
                headers.push(header);
            }
        }
        Ok(headers)
    }

    fn diffs_of(tables: &Tables, change_header_id: Uuid) -> Result<Vec<PropertyDiffModel>, Box<dyn std::error::Error + Send + Sync>> {
        let mut diffs = Vec::new();
        for row in tables.rows.get(PROPERTY_DIFF_TABLE).into_iter().flatten() {
            let diff = PropertyDiffModel::from_values(row)?;
            if diff.change_header_id == change_header_id {
                diffs.push(diff);
            }
        }
        diffs.sort_by_key(|d| d.position);
        Ok(diffs)
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn apply(
        &self,
        registry: &ModelRegistry,
        writes: &mut [EntityWrite],
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let rejected = self.rejected.lock().clone();
        let mut tables = self.tables.lock();
        let mut staged = tables.clone();

        for write in writes.iter_mut() {
            let descriptor = registry.require(write.entity_name)?;
            if rejected.contains(descriptor.table) {
                return Err(InMemoryStoreError::WriteRejected(descriptor.table.to_string()).into());
            }
            Self::apply_one(&mut staged, descriptor, write)?;
        }

        *tables = staged;
        Ok(writes.len())
    }

    async fn query(
        &self,
        descriptor: &EntityDescriptor,
        filters: &RowFilters,
    ) -> Result<Vec<PropertyBag>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .rows(descriptor.table)
            .into_iter()
            .filter(|row| filters.matches(descriptor.name, row))
            .collect())
    }
}

#[async_trait]
impl LoadAudits for InMemoryStore {
    async fn find_by_transaction_id(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>> {
        self.headers_where(|h| h.transaction_id == transaction_id)
    }

    async fn load_audits(
        &self,
        entity_type_name: &str,
        owning_entity_id: &str,
        page: PageRequest,
    ) -> Result<Page<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = self.headers_where(|h| {
            h.entity_type_name.as_str() == entity_type_name
                && h.owning_entity_id.as_deref() == Some(owning_entity_id)
        })?;
        // Newest first; later inserts win ties.
        headers.reverse();
        headers.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(page.paginate(headers))
    }

    async fn find_diffs_by_change_header_id(
        &self,
        change_header_id: Uuid,
    ) -> Result<Vec<PropertyDiffModel>, Box<dyn std::error::Error + Send + Sync>> {
        let tables = self.tables.lock();
        Self::diffs_of(&tables, change_header_id)
    }
}
