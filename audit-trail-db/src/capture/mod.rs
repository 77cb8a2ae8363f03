pub mod committer;
pub mod engine;
pub mod key_resolver;
pub mod soft_delete;

pub use committer::*;
pub use engine::*;
pub use key_resolver::*;
pub use soft_delete::*;
