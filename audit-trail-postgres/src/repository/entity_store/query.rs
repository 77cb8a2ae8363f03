use std::error::Error;

use audit_trail_db::filter::RowFilters;
use audit_trail_db::metadata::EntityDescriptor;
use audit_trail_db::models::PropertyBag;

use super::repo_impl::{PgEntityStore, StoreMode};
use super::sql;
use crate::utils::{bind_value, get_property_value};

impl PgEntityStore {
    pub(super) async fn query_impl(
        repo: &PgEntityStore,
        descriptor: &EntityDescriptor,
        filters: &RowFilters,
    ) -> Result<Vec<PropertyBag>, Box<dyn Error + Send + Sync>> {
        let statement = sql::select(descriptor, &filters.predicates_for(descriptor.name));
        let query = statement
            .params
            .iter()
            .fold(sqlx::query(&statement.sql), bind_value);

        let rows = match &repo.mode {
            StoreMode::Pool(pool) => query.fetch_all(pool.as_ref()).await?,
            StoreMode::Shared(executor) => {
                let mut tx = executor.tx.lock().await;
                if let Some(transaction) = tx.as_mut() {
                    query.fetch_all(&mut **transaction).await?
                } else {
                    return Err("Transaction has been consumed".into());
                }
            }
        };

        let mut bags = Vec::with_capacity(rows.len());
        for row in rows {
            let mut bag = PropertyBag::new();
            for property in descriptor.scalar_properties() {
                if let Some(kind) = property.kind() {
                    bag.insert(property.name, get_property_value(&row, property.column, kind)?);
                }
            }
            bags.push(bag);
        }
        Ok(bags)
    }
}
