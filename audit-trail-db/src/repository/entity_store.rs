use async_trait::async_trait;

use crate::filter::RowFilters;
use crate::metadata::{EntityDescriptor, ModelRegistry};
use crate::models::value::{PropertyBag, PropertyValue};
use crate::tracking::EntryId;

/// What a write does to its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// One row change produced from a pending tracker entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityWrite {
    pub entry: EntryId,
    pub entity_name: &'static str,
    pub kind: WriteKind,
    /// Current key; `None` for inserts of entities with a generated key.
    pub key: Option<PropertyValue>,
    /// Scalar values in declared order, key included.
    pub values: PropertyBag,
    /// Key assigned by the store during the write.
    pub generated_key: Option<PropertyValue>,
}

/// Storage backend a session writes through.
///
/// # Example
/// ```ignore
/// #[async_trait]
/// impl EntityStore for PgEntityStore {
///     async fn apply(&self, registry: &ModelRegistry, writes: &mut [EntityWrite]) -> Result<usize, Box<dyn Error + Send + Sync>> {
///         // One transaction for all writes
///     }
/// }
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Apply all writes atomically
    ///
    /// # Arguments
    /// * `registry` - Model registry describing tables, columns and key generation
    /// * `writes` - Writes in order; inserts of generated-key entities get `generated_key` set
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows written
    /// * `Err` - Nothing was written
    async fn apply(
        &self,
        registry: &ModelRegistry,
        writes: &mut [EntityWrite],
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;

    /// Load all rows of an entity type that pass the enabled row filters
    async fn query(
        &self,
        descriptor: &EntityDescriptor,
        filters: &RowFilters,
    ) -> Result<Vec<PropertyBag>, Box<dyn std::error::Error + Send + Sync>>;
}
