pub mod audit;
pub mod capability;
pub mod entity;
pub mod value;

pub use audit::*;
pub use capability::*;
pub use entity::*;
pub use value::*;
