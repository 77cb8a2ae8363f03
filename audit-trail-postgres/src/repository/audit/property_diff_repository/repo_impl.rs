use sqlx::postgres::PgRow;
use sqlx::Row;
use std::error::Error;
use uuid::Uuid;

use audit_trail_db::models::audit::PropertyDiffModel;

use crate::executor::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct PropertyDiffRepositoryImpl {
    pub(crate) executor: Executor,
}

impl PropertyDiffRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Diffs of one change header, ordered by position.
    pub async fn find_by_change_header_id(
        &self,
        change_header_id: Uuid,
    ) -> Result<Vec<PropertyDiffModel>, Box<dyn Error + Send + Sync>> {
        super::find_by_change_header_ids::find_by_change_header_ids_impl(&self.executor, &[change_header_id]).await
    }

    /// Diffs of several change headers, grouped by header then ordered by position.
    pub async fn find_by_change_header_ids(
        &self,
        change_header_ids: &[Uuid],
    ) -> Result<Vec<PropertyDiffModel>, Box<dyn Error + Send + Sync>> {
        super::find_by_change_header_ids::find_by_change_header_ids_impl(&self.executor, change_header_ids).await
    }
}

impl TryFromRow<PgRow> for PropertyDiffModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(PropertyDiffModel {
            id: row.get("id"),
            change_header_id: row.get("change_header_id"),
            position: row.get("position"),
            property_name: get_heapless_string(row, "property_name")?,
            column_name: get_heapless_string(row, "column_name")?,
            original_value: row.get("original_value"),
            new_value: row.get("new_value"),
            values_hidden: row.get("values_hidden"),
        })
    }
}
