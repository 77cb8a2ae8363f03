use audit_trail_db::models::audit::PropertyDiffModel;
use uuid::Uuid;

use crate::executor::Executor;
use crate::utils::TryFromRow;

pub async fn find_by_change_header_ids_impl(
    executor: &Executor,
    change_header_ids: &[Uuid],
) -> Result<Vec<PropertyDiffModel>, Box<dyn std::error::Error + Send + Sync>> {
    if change_header_ids.is_empty() {
        return Ok(vec![]);
    }

    let query = sqlx::query(
        r#"
        SELECT id, change_header_id, position, property_name, column_name,
               original_value, new_value, values_hidden
        FROM audit_property_diff
        WHERE change_header_id = ANY($1)
        ORDER BY change_header_id, position
        "#,
    )
    .bind(change_header_ids);

    let mut tx = executor.tx.lock().await;
    let rows = if let Some(transaction) = tx.as_mut() {
        query.fetch_all(&mut **transaction).await?
    } else {
        return Err("Transaction has been consumed".into());
    };

    let mut diffs = Vec::with_capacity(rows.len());
    for row in rows {
        diffs.push(PropertyDiffModel::try_from_row(&row)?);
    }
    Ok(diffs)
}
