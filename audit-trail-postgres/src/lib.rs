pub mod executor;
pub mod postgres_repositories;
pub mod repository;
pub mod utils;

pub use executor::Executor;
pub use postgres_repositories::{PostgresRepositories, SharedRepositories};
pub use repository::audit::{ChangeHeaderRepositoryImpl, PropertyDiffRepositoryImpl};
pub use repository::entity_store::PgEntityStore;

#[cfg(test)]
pub mod test_helper;
