pub mod find_by_change_header_ids;
pub mod repo_impl;

pub use repo_impl::PropertyDiffRepositoryImpl;
