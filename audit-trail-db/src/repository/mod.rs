pub mod entity_store;
pub mod in_memory;
pub mod load_audits;
pub mod pagination;

// Re-exports
pub use entity_store::*;
pub use in_memory::*;
pub use load_audits::*;
pub use pagination::*;
