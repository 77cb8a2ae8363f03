use sqlx::PgPool;
use std::sync::Arc;

use crate::executor::Executor;
use crate::repository::audit::{AuditRepoFactory, AuditRepositories};
use crate::repository::entity_store::PgEntityStore;

pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Entity store committing every save phase in its own transaction
    pub fn entity_store(&self) -> Arc<PgEntityStore> {
        Arc::new(PgEntityStore::with_pool(self.pool.clone()))
    }

    /// Create all repositories sharing a single transaction
    ///
    /// Nothing is visible to other connections until `executor.commit()`.
    pub async fn create_all_repositories(&self) -> Result<SharedRepositories, sqlx::Error> {
        let tx = self.pool.begin().await?;
        let executor = Executor::new(tx);

        let audit_repos = AuditRepoFactory::new().build_all_repos(&executor);
        let entity_store = Arc::new(PgEntityStore::with_executor(executor.clone()));

        Ok(SharedRepositories {
            executor,
            entity_store,
            audit_repos,
        })
    }
}

/// Repositories of one unit of work
pub struct SharedRepositories {
    pub executor: Executor,
    pub entity_store: Arc<PgEntityStore>,
    pub audit_repos: AuditRepositories,
}
