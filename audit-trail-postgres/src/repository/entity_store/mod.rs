pub mod apply;
pub mod query;
pub mod repo_impl;
pub mod sql;

pub use repo_impl::PgEntityStore;
