use thiserror::Error;

use audit_trail_api::{BoxError, MetadataError};

use crate::models::value::ValueKind;
use crate::tracking::EntryId;

/// Errors converting between property bags and typed entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Property '{0}' is missing")]
    Missing(String),

    #[error("Property '{property}' holds a {found:?} value, expected {expected:?}")]
    KindMismatch {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Property '{0}' is null")]
    Null(String),

    #[error("Value '{value}' for property '{property}' is invalid")]
    Invalid { property: String, value: String },
}

/// Errors raised by session operations other than the save itself.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Audit records of type '{0}' are only written by a save")]
    AuditRecord(String),

    #[error("Entry {0} is not tracked by this session")]
    UnknownEntry(EntryId),

    #[error("Entity '{entity}' is not {capability}")]
    CapabilityMissing {
        entity: String,
        capability: &'static str,
    },

    #[error("Entity '{entity}' declares {capability} but does not expose it")]
    CapabilityMismatch {
        entity: String,
        capability: &'static str,
    },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("Query failed: {0}")]
    Query(#[source] BoxError),
}
