use async_trait::async_trait;
use uuid::Uuid;

use crate::models::audit::{ChangeHeaderModel, PropertyDiffModel};
use crate::repository::pagination::{Page, PageRequest};

/// Read-only access to the persisted audit trail
///
/// Change headers are returned with their property diffs populated, ordered
/// by position. There is no write method: audit records are only written by
/// a session's save.
///
/// # Example
/// ```ignore
/// use audit_trail_db::repository::pagination::PageRequest;
///
/// let page = repo.load_audits("Customer", "42", PageRequest::new(20, 0)).await?;
/// println!("Page {} of {}", page.page_number(), page.total_pages());
///
/// let together = repo.find_by_transaction_id(page.items[0].transaction_id).await?;
/// ```
#[async_trait]
pub trait LoadAudits: Send + Sync {
    /// Load every change header written by one save
    async fn find_by_transaction_id(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>>;

    /// Load paginated change headers of one entity instance, newest first
    ///
    /// # Arguments
    /// * `entity_type_name` - Registered entity name
    /// * `owning_entity_id` - Key of the instance as recorded in the trail
    /// * `page` - The pagination parameters (limit and offset)
    async fn load_audits(
        &self,
        entity_type_name: &str,
        owning_entity_id: &str,
        page: PageRequest,
    ) -> Result<Page<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>>;

    /// Load the property diffs of one change header in declared order
    async fn find_diffs_by_change_header_id(
        &self,
        change_header_id: Uuid,
    ) -> Result<Vec<PropertyDiffModel>, Box<dyn std::error::Error + Send + Sync>>;
}
