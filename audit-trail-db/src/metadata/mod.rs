pub mod builder;
pub mod registry;
pub mod resolver;

pub use builder::*;
pub use registry::*;
pub use resolver::*;
