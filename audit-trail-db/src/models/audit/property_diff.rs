use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValueError;
use crate::metadata::{EntityTypeBuilder, KeyGeneration};
use crate::models::audit::PROPERTY_DIFF_TABLE;
use crate::models::entity::{Entity, EntityType};
use crate::models::value::{PropertyBag, PropertyValue, ValueKind};
use crate::utils::to_bounded;

/// # Documentation
/// - One property diff per changed, tracked property of a change header.
/// - Values are stored as formatted text so the audit schema stays type agnostic.
/// - When `values_hidden` is set both values hold the redaction marker.
/// - `position` is the property's declared position among the tracked properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDiffModel {
    pub id: Uuid,
    pub change_header_id: Uuid,
    pub position: i64,
    pub property_name: HeaplessString<64>,
    pub column_name: HeaplessString<64>,
    pub original_value: Option<String>,
    pub new_value: Option<String>,
    pub values_hidden: bool,
}

impl Entity for PropertyDiffModel {
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
            .with("change_header_id", self.change_header_id)
            .with("position", self.position)
            .with("property_name", self.property_name.as_str())
            .with("column_name", self.column_name.as_str())
            .with("original_value", self.original_value.clone())
            .with("new_value", self.new_value.clone())
            .with("values_hidden", self.values_hidden)
    }
}

impl EntityType for PropertyDiffModel {
    const ENTITY_NAME: &'static str = "PropertyDiff";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity
            .table(PROPERTY_DIFF_TABLE)
            .key("id", KeyGeneration::Client)
            .parent("change_header_id", "ChangeHeader")
            .audit_record();
        entity.property("id", ValueKind::Uuid);
        entity.property("change_header_id", ValueKind::Uuid);
        entity.property("position", ValueKind::Int);
        entity.property("property_name", ValueKind::Text);
        entity.property("column_name", ValueKind::Text);
        entity.property("original_value", ValueKind::Text);
        entity.property("new_value", ValueKind::Text);
        entity.property("values_hidden", ValueKind::Bool);
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        Ok(PropertyDiffModel {
            id: values.get_as("id")?,
            change_header_id: values.get_as("change_header_id")?,
            position: values.get_as("position")?,
            property_name: to_bounded("property_name", &values.get_as::<String>("property_name")?)?,
            column_name: to_bounded("column_name", &values.get_as::<String>("column_name")?)?,
            original_value: values.get_as("original_value")?,
            new_value: values.get_as("new_value")?,
            values_hidden: values.get_as("values_hidden")?,
        })
    }
}
