use audit_trail_api::MetadataError;

use crate::metadata::registry::EntityDescriptor;
use crate::models::capability::Capability;

/// A property taking part in change capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub column: &'static str,
    pub values_hidden: bool,
}

/// Determines which properties of an entity type are diffed.
pub struct PropertyMetadataResolver;

impl PropertyMetadataResolver {
    /// Tracked scalar properties in declared order.
    ///
    /// Navigation properties and the key are never included, whatever their
    /// markers say. A property-change-auditable type without any tracked
    /// property is a configuration error.
    pub fn resolve(descriptor: &EntityDescriptor) -> Result<Vec<PropertySpec>, MetadataError> {
        let specs: Vec<PropertySpec> = descriptor
            .scalar_properties()
            .filter(|p| p.tracked && !descriptor.is_key(p.name))
            .map(|p| PropertySpec {
                name: p.name,
                column: p.column,
                values_hidden: p.hide_values,
            })
            .collect();

        if specs.is_empty() && descriptor.has(Capability::PropertyChangeAuditable) {
            return Err(MetadataError::NoTrackedProperties {
                entity: descriptor.name.to_string(),
            });
        }

        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityTypeBuilder, KeyGeneration, ModelRegistry};
    use crate::models::{Entity, EntityType, PropertyBag, PropertyValue, ValueKind};
    use crate::error::ValueError;
    use crate::test_utils::create_test_registry;

    #[derive(Debug)]
    struct Untracked;

    impl Entity for Untracked {
        fn entity_name(&self) -> &'static str {
            Self::ENTITY_NAME
        }

        fn key(&self) -> Option<PropertyValue> {
            None
        }

        fn set_key(&mut self, _key: PropertyValue) {}

        fn values(&self) -> PropertyBag {
            PropertyBag::new()
        }
    }

    impl EntityType for Untracked {
        const ENTITY_NAME: &'static str = "Untracked";

        fn configure(entity: &mut EntityTypeBuilder) {
            entity
                .key("id", KeyGeneration::Generated)
                .capability(Capability::PropertyChangeAuditable);
            entity.property("id", ValueKind::Int).tracked();
            entity.navigation("children").tracked();
            entity.property("name", ValueKind::Text);
        }

        fn from_values(_values: &PropertyBag) -> Result<Self, ValueError> {
            Ok(Untracked)
        }
    }

    #[test]
    fn test_auditable_type_without_tracked_properties_fails_build() {
        let err = ModelRegistry::builder().entity::<Untracked>().build().unwrap_err();
        assert_eq!(
            err,
            MetadataError::NoTrackedProperties {
                entity: "Untracked".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_keeps_declared_order_and_skips_key() {
        let registry = create_test_registry();
        let specs = registry.tracked_properties("Customer").unwrap();

        let names: Vec<_> = specs.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["display_name", "email", "closed_reason", "is_deleted"]);
        assert_eq!(specs[0].column, "name");
        assert!(specs.iter().all(|s| !s.values_hidden));
    }
}
