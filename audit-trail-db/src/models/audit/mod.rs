pub mod change_header;
pub mod operation_kind;
pub mod property_diff;

pub use change_header::*;
pub use operation_kind::*;
pub use property_diff::*;

/// Table holding change headers.
pub const CHANGE_HEADER_TABLE: &str = "audit_change_header";

/// Table holding property diffs.
pub const PROPERTY_DIFF_TABLE: &str = "audit_property_diff";
