use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error as ThisError;

use audit_trail_db::filter::RowFilters;
use audit_trail_db::metadata::{EntityDescriptor, ModelRegistry};
use audit_trail_db::models::PropertyBag;
use audit_trail_db::repository::entity_store::{EntityStore, EntityWrite};

use crate::executor::Executor;

#[derive(ThisError, Debug)]
pub enum PgStoreError {
    #[error("No row with key {key} in table '{table}'")]
    RowNotFound { table: String, key: String },

    #[error("Entity '{0}' has no key value")]
    MissingKey(String),
}

pub(crate) enum StoreMode {
    /// Every `apply` runs in its own transaction.
    Pool(Arc<PgPool>),
    /// Writes join the unit of work's transaction, each `apply` inside a savepoint.
    Shared(Executor),
}

/// PostgreSQL [`EntityStore`].
///
/// In pool mode the business write and the audit write of a save are two
/// committed transactions. In shared mode both run inside the caller's
/// transaction; a failed audit write only rolls back to its savepoint, so
/// the business rows survive and the caller still commits.
pub struct PgEntityStore {
    pub(crate) mode: StoreMode,
}

impl PgEntityStore {
    pub fn with_pool(pool: Arc<PgPool>) -> Self {
        Self {
            mode: StoreMode::Pool(pool),
        }
    }

    pub fn with_executor(executor: Executor) -> Self {
        Self {
            mode: StoreMode::Shared(executor),
        }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn apply(
        &self,
        registry: &ModelRegistry,
        writes: &mut [EntityWrite],
    ) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Self::apply_impl(self, registry, writes).await
    }

    async fn query(
        &self,
        descriptor: &EntityDescriptor,
        filters: &RowFilters,
    ) -> Result<Vec<PropertyBag>, Box<dyn Error + Send + Sync>> {
        Self::query_impl(self, descriptor, filters).await
    }
}
