pub mod actor;
pub mod config;
pub mod error;

pub use actor::*;
pub use config::*;
pub use error::*;
