pub mod audit;
pub mod db_init;
pub mod entity_store;

pub use audit::*;
pub use entity_store::*;
