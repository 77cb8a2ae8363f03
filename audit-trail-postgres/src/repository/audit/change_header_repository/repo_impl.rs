use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use audit_trail_db::models::audit::{ChangeHeaderModel, OperationKind, PropertyDiffModel};
use audit_trail_db::repository::load_audits::LoadAudits;
use audit_trail_db::repository::pagination::{Page, PageRequest};

use crate::executor::Executor;
use crate::repository::audit::property_diff_repository::find_by_change_header_ids::find_by_change_header_ids_impl;
use crate::utils::{get_heapless_string, get_optional_heapless_string, TryFromRow};

/// Columns selected for a change header, in table order.
pub(super) const CHANGE_HEADER_COLUMNS: &str = "id, transaction_id, correlation_id, entity_type_name, table_name, \
     operation_kind, owning_entity_id, parent_entity_name, parent_entity_id, changed_by, changed_at";

pub struct ChangeHeaderRepositoryImpl {
    pub(crate) executor: Executor,
}

impl ChangeHeaderRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Fills `property_diffs` of every header with one query.
    pub(super) async fn attach_diffs(
        executor: &Executor,
        headers: &mut [ChangeHeaderModel],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut by_header: HashMap<Uuid, Vec<PropertyDiffModel>> = HashMap::new();
        for diff in find_by_change_header_ids_impl(executor, &ids).await? {
            by_header.entry(diff.change_header_id).or_default().push(diff);
        }
        for header in headers.iter_mut() {
            header.property_diffs = by_header.remove(&header.id).unwrap_or_default();
        }
        Ok(())
    }
}

impl TryFromRow<PgRow> for ChangeHeaderModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let operation_kind: String = row.get("operation_kind");
        Ok(ChangeHeaderModel {
            id: row.get("id"),
            transaction_id: row.get("transaction_id"),
            correlation_id: row.get("correlation_id"),
            entity_type_name: get_heapless_string(row, "entity_type_name")?,
            table_name: get_heapless_string(row, "table_name")?,
            operation_kind: operation_kind.parse::<OperationKind>()?,
            owning_entity_id: row.get("owning_entity_id"),
            parent_entity_name: get_optional_heapless_string(row, "parent_entity_name")?,
            parent_entity_id: row.get("parent_entity_id"),
            changed_by: row.get("changed_by"),
            changed_at: row.get("changed_at"),
            property_diffs: Vec::new(),
        })
    }
}

#[async_trait]
impl LoadAudits for ChangeHeaderRepositoryImpl {
    async fn find_by_transaction_id(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ChangeHeaderModel>, Box<dyn Error + Send + Sync>> {
        Self::find_by_transaction_id_impl(self, transaction_id).await
    }

    async fn load_audits(
        &self,
        entity_type_name: &str,
        owning_entity_id: &str,
        page: PageRequest,
    ) -> Result<Page<ChangeHeaderModel>, Box<dyn Error + Send + Sync>> {
        Self::load_audits_impl(self, entity_type_name, owning_entity_id, page).await
    }

    async fn find_diffs_by_change_header_id(
        &self,
        change_header_id: Uuid,
    ) -> Result<Vec<PropertyDiffModel>, Box<dyn Error + Send + Sync>> {
        find_by_change_header_ids_impl(&self.executor, &[change_header_id]).await
    }
}
