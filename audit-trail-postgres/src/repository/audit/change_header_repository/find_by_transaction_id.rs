use audit_trail_db::models::audit::ChangeHeaderModel;
use uuid::Uuid;

use super::repo_impl::{ChangeHeaderRepositoryImpl, CHANGE_HEADER_COLUMNS};
use crate::utils::TryFromRow;

impl ChangeHeaderRepositoryImpl {
    pub(super) async fn find_by_transaction_id_impl(
        repo: &ChangeHeaderRepositoryImpl,
        transaction_id: Uuid,
    ) -> Result<Vec<ChangeHeaderModel>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "SELECT {CHANGE_HEADER_COLUMNS} FROM audit_change_header \
             WHERE transaction_id = $1 ORDER BY entity_type_name, owning_entity_id"
        );

        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            if let Some(transaction) = tx.as_mut() {
                sqlx::query(&sql)
                    .bind(transaction_id)
                    .fetch_all(&mut **transaction)
                    .await?
            } else {
                return Err("Transaction has been consumed".into());
            }
        };

        let mut headers = Vec::with_capacity(rows.len());
        for row in rows {
            headers.push(ChangeHeaderModel::try_from_row(&row)?);
        }
        Self::attach_diffs(&repo.executor, &mut headers).await?;

        Ok(headers)
    }
}
