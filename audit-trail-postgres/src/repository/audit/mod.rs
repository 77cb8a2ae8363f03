pub mod change_header_repository;
pub mod factory;
pub mod property_diff_repository;

pub use change_header_repository::ChangeHeaderRepositoryImpl;
pub use factory::{AuditRepoFactory, AuditRepositories};
pub use property_diff_repository::PropertyDiffRepositoryImpl;
