pub mod stamping;
pub mod tracker;

pub use stamping::*;
pub use tracker::*;
