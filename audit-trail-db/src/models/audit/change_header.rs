use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValueError;
use crate::metadata::{EntityTypeBuilder, KeyGeneration};
use crate::models::audit::{OperationKind, PropertyDiffModel, CHANGE_HEADER_TABLE};
use crate::models::entity::{Entity, EntityType};
use crate::models::value::{PropertyBag, PropertyValue, ValueKind};
use crate::utils::to_bounded;

/// # Documentation
/// - One change header per audited entity instance per save.
/// - All headers produced by one save share the same `transaction_id`.
/// - `owning_entity_id` stays `None` for creates until the generated key is known;
///   it is never `None` once persisted.
/// - Owns its property diffs; they are persisted as separate rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeHeaderModel {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub correlation_id: Option<Uuid>,
    pub entity_type_name: HeaplessString<64>,
    pub table_name: HeaplessString<64>,
    pub operation_kind: OperationKind,
    pub owning_entity_id: Option<String>,
    pub parent_entity_name: Option<HeaplessString<64>>,
    pub parent_entity_id: Option<String>,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    pub property_diffs: Vec<PropertyDiffModel>,
}

impl ChangeHeaderModel {
    pub fn diff(&self, property_name: &str) -> Option<&PropertyDiffModel> {
        self.property_diffs
            .iter()
            .find(|d| d.property_name.as_str() == property_name)
    }
}

impl Entity for ChangeHeaderModel {
    fn entity_name(&self) -> &'static str {
        Self::ENTITY_NAME
    }

    fn key(&self) -> Option<PropertyValue> {
        Some(self.id.into())
    }

    fn set_key(&mut self, key: PropertyValue) {
        if let PropertyValue::Uuid(Some(id)) = key {
            self.id = id;
        }
    }

    fn values(&self) -> PropertyBag {
        PropertyBag::new()
            .with("id", self.id)
            .with("transaction_id", self.transaction_id)
            .with("correlation_id", self.correlation_id)
            .with("entity_type_name", self.entity_type_name.as_str())
            .with("table_name", self.table_name.as_str())
            .with("operation_kind", self.operation_kind.as_str())
            .with("owning_entity_id", self.owning_entity_id.clone())
            .with(
                "parent_entity_name",
                self.parent_entity_name.as_ref().map(|n| n.as_str()),
            )
            .with("parent_entity_id", self.parent_entity_id.clone())
            .with("changed_by", self.changed_by)
            .with("changed_at", self.changed_at)
    }
}

impl EntityType for ChangeHeaderModel {
    const ENTITY_NAME: &'static str = "ChangeHeader";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity
            .table(CHANGE_HEADER_TABLE)
            .key("id", KeyGeneration::Client)
            .audit_record();
        entity.property("id", ValueKind::Uuid);
        entity.property("transaction_id", ValueKind::Uuid);
        entity.property("correlation_id", ValueKind::Uuid);
        entity.property("entity_type_name", ValueKind::Text);
        entity.property("table_name", ValueKind::Text);
        entity.property("operation_kind", ValueKind::Text);
        entity.property("owning_entity_id", ValueKind::Text);
        entity.property("parent_entity_name", ValueKind::Text);
        entity.property("parent_entity_id", ValueKind::Text);
        entity.property("changed_by", ValueKind::Uuid);
        entity.property("changed_at", ValueKind::Timestamp);
        entity.navigation("property_diffs");
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        let operation_kind: String = values.get_as("operation_kind")?;
        let operation_kind = operation_kind
            .parse::<OperationKind>()
            .map_err(|_| ValueError::Invalid {
                property: "operation_kind".to_string(),
                value: operation_kind.clone(),
            })?;

        let parent_entity_name = values
            .get_as::<Option<String>>("parent_entity_name")?
            .map(|n| to_bounded("parent_entity_name", &n))
            .transpose()?;

        Ok(ChangeHeaderModel {
            id: values.get_as("id")?,
            transaction_id: values.get_as("transaction_id")?,
            correlation_id: values.get_as("correlation_id")?,
            entity_type_name: to_bounded(
                "entity_type_name",
                &values.get_as::<String>("entity_type_name")?,
            )?,
            table_name: to_bounded("table_name", &values.get_as::<String>("table_name")?)?,
            operation_kind,
            owning_entity_id: values.get_as("owning_entity_id")?,
            parent_entity_name,
            parent_entity_id: values.get_as("parent_entity_id")?,
            changed_by: values.get_as("changed_by")?,
            changed_at: values.get_as("changed_at")?,
            property_diffs: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_change_header;

    #[test]
    fn test_values_round_trip_without_diffs() {
        let mut header = create_test_change_header(OperationKind::Update);
        header.owning_entity_id = Some("7".to_string());

        let restored = ChangeHeaderModel::from_values(&header.values()).unwrap();

        assert_eq!(restored.operation_kind, OperationKind::Update);
        assert_eq!(restored.owning_entity_id.as_deref(), Some("7"));
        assert!(restored.property_diffs.is_empty());
        assert!(header.values().get("property_diffs").is_none());
    }

    #[test]
    fn test_from_values_rejects_unknown_operation() {
        let header = create_test_change_header(OperationKind::Create);
        let mut values = header.values();
        values.insert("operation_kind", "Upsert");

        assert!(matches!(
            ChangeHeaderModel::from_values(&values),
            Err(ValueError::Invalid { .. })
        ));
    }
}
