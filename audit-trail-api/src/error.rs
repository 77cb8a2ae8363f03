use thiserror::Error;
use uuid::Uuid;

/// Boxed error used at the storage seams, matching the repository traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Model configuration errors.
///
/// These are detected while the model registry is built and must prevent
/// startup; they never surface from a save.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Entity '{entity}' tracks property changes but declares no tracked properties")]
    NoTrackedProperties { entity: String },

    #[error("Entity '{0}' is registered more than once")]
    DuplicateEntity(String),

    #[error("Entity '{entity}' declares property '{property}' more than once")]
    DuplicateProperty { entity: String, property: String },

    #[error("Entity '{entity}' uses undeclared property '{property}' as its key")]
    UnknownKey { entity: String, property: String },

    #[error("Entity '{entity}' is {capability} but declares no {field}")]
    MissingCapabilityField {
        entity: String,
        capability: &'static str,
        field: &'static str,
    },

    #[error("Entity '{entity}' refers to undeclared property '{property}'")]
    UnknownProperty { entity: String, property: String },

    #[error("Entity '{entity}' uses invalid identifier '{identifier}'")]
    InvalidIdentifier { entity: String, identifier: String },

    #[error("Entity '{0}' is not registered")]
    UnknownEntity(String),
}

/// Failures of the audit half of a save.
///
/// A fault means the business data was written but the audit trail for that
/// save is incomplete.
#[derive(Error, Debug)]
pub enum AuditFault {
    #[error("Owning key unresolved for {count} change header(s) in transaction {transaction_id}")]
    KeyResolution { transaction_id: Uuid, count: usize },

    #[error("Failed to persist audit records for transaction {transaction_id}: {source}")]
    Commit {
        transaction_id: Uuid,
        #[source]
        source: BoxError,
    },
}

impl AuditFault {
    pub fn transaction_id(&self) -> Uuid {
        match self {
            AuditFault::KeyResolution { transaction_id, .. } => *transaction_id,
            AuditFault::Commit { transaction_id, .. } => *transaction_id,
        }
    }
}

/// Error returned by a save.
///
/// `Business` means nothing was written. `Audit` means the business write is
/// committed and only the audit trail failed; it is only returned under
/// strict auditing.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Business write failed: {0}")]
    Business(#[source] BoxError),

    #[error("Business write succeeded ({entities_written} entities) but the audit trail is incomplete: {fault}")]
    Audit {
        entities_written: usize,
        #[source]
        fault: AuditFault,
    },
}

impl SaveError {
    /// True when the business data of the failed save is safe.
    pub fn business_data_committed(&self) -> bool {
        matches!(self, SaveError::Audit { .. })
    }
}

pub type SaveResult<T> = Result<T, SaveError>;
