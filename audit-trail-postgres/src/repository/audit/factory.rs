use std::sync::Arc;

use super::{
    change_header_repository::ChangeHeaderRepositoryImpl,
    property_diff_repository::PropertyDiffRepositoryImpl,
};
use crate::executor::Executor;

/// Factory for creating audit trail read repositories
///
/// Holds no state today; kept as a singleton so callers build repositories
/// the same way for every unit of work.
#[derive(Default)]
pub struct AuditRepoFactory {}

impl AuditRepoFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {})
    }

    pub fn build_change_header_repo(&self, executor: &Executor) -> Arc<ChangeHeaderRepositoryImpl> {
        Arc::new(ChangeHeaderRepositoryImpl::new(executor.clone()))
    }

    pub fn build_property_diff_repo(&self, executor: &Executor) -> Arc<PropertyDiffRepositoryImpl> {
        Arc::new(PropertyDiffRepositoryImpl::new(executor.clone()))
    }

    /// Build all audit repositories on the given executor
    pub fn build_all_repos(&self, executor: &Executor) -> AuditRepositories {
        AuditRepositories {
            change_header_repository: self.build_change_header_repo(executor),
            property_diff_repository: self.build_property_diff_repo(executor),
        }
    }
}

/// Container for all audit trail repositories
pub struct AuditRepositories {
    pub change_header_repository: Arc<ChangeHeaderRepositoryImpl>,
    pub property_diff_repository: Arc<PropertyDiffRepositoryImpl>,
}
