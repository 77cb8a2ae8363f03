use audit_trail_db::models::audit::ChangeHeaderModel;
use audit_trail_db::repository::pagination::{Page, PageRequest};
use std::error::Error;

use super::repo_impl::{ChangeHeaderRepositoryImpl, CHANGE_HEADER_COLUMNS};
use crate::utils::TryFromRow;

impl ChangeHeaderRepositoryImpl {
    pub(super) async fn load_audits_impl(
        repo: &ChangeHeaderRepositoryImpl,
        entity_type_name: &str,
        owning_entity_id: &str,
        page: PageRequest,
    ) -> Result<Page<ChangeHeaderModel>, Box<dyn Error + Send + Sync>> {
        // First, get the total count of change headers for this instance
        let count_query = r#"
            SELECT COUNT(*) as count FROM audit_change_header
            WHERE entity_type_name = $1 AND owning_entity_id = $2
        "#;
        let total: i64 = {
            let mut tx = repo.executor.tx.lock().await;
            if let Some(transaction) = tx.as_mut() {
                sqlx::query_scalar(count_query)
                    .bind(entity_type_name)
                    .bind(owning_entity_id)
                    .fetch_one(&mut **transaction)
                    .await?
            } else {
                return Err("Transaction has been consumed".into());
            }
        };

        // Then fetch the page, most recent first
        let query = format!(
            "SELECT {CHANGE_HEADER_COLUMNS} FROM audit_change_header \
             WHERE entity_type_name = $1 AND owning_entity_id = $2 \
             ORDER BY changed_at DESC, id \
             LIMIT $3 OFFSET $4"
        );

        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            if let Some(transaction) = tx.as_mut() {
                sqlx::query(&query)
                    .bind(entity_type_name)
                    .bind(owning_entity_id)
                    .bind(page.limit as i64)
                    .bind(page.offset as i64)
                    .fetch_all(&mut **transaction)
                    .await?
            } else {
                return Err("Transaction has been consumed".into());
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(ChangeHeaderModel::try_from_row(&row)?);
        }
        Self::attach_diffs(&repo.executor, &mut items).await?;

        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }
}
