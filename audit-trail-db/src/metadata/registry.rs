use std::collections::{HashMap, HashSet};

use audit_trail_api::MetadataError;

use crate::metadata::builder::{EntityTypeBuilder, KeyGeneration, PropertyDescriptor};
use crate::metadata::resolver::{PropertyMetadataResolver, PropertySpec};
use crate::models::audit::{ChangeHeaderModel, PropertyDiffModel};
use crate::models::capability::{Capability, CapabilitySet};
use crate::models::entity::EntityType;
use crate::models::value::ValueKind;

/// Longest entity, table, property or column name the audit tables can hold.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Column a declared property maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub property: &'static str,
    pub column: &'static str,
}

/// Resolved model of one entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub table: &'static str,
    pub key: ColumnRef,
    pub key_kind: ValueKind,
    pub key_generation: KeyGeneration,
    pub capabilities: CapabilitySet,
    pub properties: Vec<PropertyDescriptor>,
    pub deletion_flag: Option<ColumnRef>,
    pub tenant: Option<ColumnRef>,
    /// Parent property and parent entity name.
    pub parent: Option<(ColumnRef, &'static str)>,
    /// Change headers and property diffs; never captured.
    pub audit_record: bool,
    tracked: Vec<PropertySpec>,
}

impl EntityDescriptor {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Stored (non-navigation) properties in declared order.
    pub fn scalar_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| !p.is_navigation())
    }

    /// Properties taking part in change capture, in declared order.
    pub fn tracked_properties(&self) -> &[PropertySpec] {
        &self.tracked
    }

    pub fn is_key(&self, property: &str) -> bool {
        self.key.property == property
    }
}

/// Registry of all entity types known to a persistence session type.
///
/// Built once at startup; a registry that builds is a valid model.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entities: HashMap<&'static str, EntityDescriptor>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    pub fn descriptor(&self, entity_name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(entity_name)
    }

    pub fn require(&self, entity_name: &str) -> Result<&EntityDescriptor, MetadataError> {
        self.descriptor(entity_name)
            .ok_or_else(|| MetadataError::UnknownEntity(entity_name.to_string()))
    }

    /// Tracked properties of an entity type.
    pub fn tracked_properties(&self, entity_name: &str) -> Result<&[PropertySpec], MetadataError> {
        Ok(self.require(entity_name)?.tracked_properties())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }
}

#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    drafts: Vec<EntityTypeBuilder>,
}

impl ModelRegistryBuilder {
    pub fn entity<T: EntityType>(mut self) -> Self {
        let mut draft = EntityTypeBuilder::new(T::ENTITY_NAME);
        T::configure(&mut draft);
        self.drafts.push(draft);
        self
    }

    /// Validates every declaration and resolves tracked properties.
    ///
    /// The audit record types are always registered.
    pub fn build(self) -> Result<ModelRegistry, MetadataError> {
        let builder = self
            .entity::<ChangeHeaderModel>()
            .entity::<PropertyDiffModel>();

        let mut entities = HashMap::new();
        for draft in builder.drafts {
            let descriptor = describe(draft)?;
            if entities.contains_key(descriptor.name) {
                return Err(MetadataError::DuplicateEntity(descriptor.name.to_string()));
            }
            entities.insert(descriptor.name, descriptor);
        }

        Ok(ModelRegistry { entities })
    }
}

fn describe(draft: EntityTypeBuilder) -> Result<EntityDescriptor, MetadataError> {
    let entity = draft.name;

    for identifier in [draft.name, draft.table] {
        check_identifier(entity, identifier)?;
    }

    let mut seen = HashSet::new();
    for property in &draft.properties {
        check_identifier(entity, property.name)?;
        check_identifier(entity, property.column)?;
        if !seen.insert(property.name) {
            return Err(MetadataError::DuplicateProperty {
                entity: entity.to_string(),
                property: property.name.to_string(),
            });
        }
    }

    let scalar = |name: &'static str| -> Option<(ColumnRef, ValueKind)> {
        draft
            .properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.kind().map(|kind| (ColumnRef { property: p.name, column: p.column }, kind)))
    };

    let declared = |name: &'static str| {
        scalar(name).ok_or_else(|| MetadataError::UnknownProperty {
            entity: entity.to_string(),
            property: name.to_string(),
        })
    };

    let (key_property, key_generation) = draft.key.unwrap_or(("id", KeyGeneration::Generated));
    let (key, key_kind) = scalar(key_property).ok_or_else(|| MetadataError::UnknownKey {
        entity: entity.to_string(),
        property: key_property.to_string(),
    })?;

    let deletion_flag = draft.deletion_flag.map(declared).transpose()?;
    if draft.capabilities.contains(Capability::FullyAuditable)
        && !matches!(deletion_flag, Some((_, ValueKind::Bool)))
    {
        return Err(MetadataError::MissingCapabilityField {
            entity: entity.to_string(),
            capability: Capability::FullyAuditable.as_str(),
            field: "boolean deletion flag",
        });
    }

    let tenant = draft.tenant_property.map(declared).transpose()?;
    if draft.capabilities.contains(Capability::TenantScoped)
        && !matches!(tenant, Some((_, ValueKind::Uuid)))
    {
        return Err(MetadataError::MissingCapabilityField {
            entity: entity.to_string(),
            capability: Capability::TenantScoped.as_str(),
            field: "uuid tenant property",
        });
    }

    let parent = match draft.parent {
        Some((property, parent_entity)) => {
            check_identifier(entity, parent_entity)?;
            let (column, _) = declared(property)?;
            Some((column, parent_entity))
        }
        None => None,
    };

    let mut descriptor = EntityDescriptor {
        name: draft.name,
        table: draft.table,
        key,
        key_kind,
        key_generation,
        capabilities: draft.capabilities,
        properties: draft.properties,
        deletion_flag: deletion_flag.map(|(c, _)| c),
        tenant: tenant.map(|(c, _)| c),
        parent,
        audit_record: draft.audit_record,
        tracked: Vec::new(),
    };
    descriptor.tracked = PropertyMetadataResolver::resolve(&descriptor)?;

    Ok(descriptor)
}

fn check_identifier(entity: &str, identifier: &str) -> Result<(), MetadataError> {
    if identifier.is_empty() || identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(MetadataError::InvalidIdentifier {
            entity: entity.to_string(),
            identifier: identifier.to_string(),
        });
    }
    Ok(())
}
