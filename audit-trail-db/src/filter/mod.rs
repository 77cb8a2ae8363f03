pub mod row_filters;

pub use row_filters::*;
