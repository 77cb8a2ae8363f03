pub mod find_by_transaction_id;
pub mod load_audits;
pub mod repo_impl;

pub use repo_impl::ChangeHeaderRepositoryImpl;
