use crate::models::capability::{Capability, CapabilitySet};
use crate::models::value::ValueKind;

/// Where primary key values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGeneration {
    /// Assigned by the store during the write (identity / sequence).
    Generated,
    /// Assigned by the application before the write.
    Client,
}

/// Shape of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyShape {
    Scalar(ValueKind),
    /// Relationship to other entities; never stored or diffed.
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub column: &'static str,
    pub shape: PropertyShape,
    /// Opted into change capture.
    pub tracked: bool,
    /// Values are replaced by the redaction marker in the audit trail.
    pub hide_values: bool,
}

impl PropertyDescriptor {
    pub fn kind(&self) -> Option<ValueKind> {
        match self.shape {
            PropertyShape::Scalar(kind) => Some(kind),
            PropertyShape::Navigation => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.shape == PropertyShape::Navigation
    }
}

/// Per-property markers.
pub struct PropertyBuilder<'a> {
    descriptor: &'a mut PropertyDescriptor,
}

impl PropertyBuilder<'_> {
    pub fn column(self, column: &'static str) -> Self {
        self.descriptor.column = column;
        self
    }

    pub fn tracked(self) -> Self {
        self.descriptor.tracked = true;
        self
    }

    /// Tracked, with values masked in the audit trail.
    pub fn hide_values(self) -> Self {
        self.descriptor.tracked = true;
        self.descriptor.hide_values = true;
        self
    }
}

/// Declaration of one entity type, filled in by [`crate::EntityType::configure`].
#[derive(Debug, Clone)]
pub struct EntityTypeBuilder {
    pub(crate) name: &'static str,
    pub(crate) table: &'static str,
    pub(crate) key: Option<(&'static str, KeyGeneration)>,
    pub(crate) capabilities: CapabilitySet,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) deletion_flag: Option<&'static str>,
    pub(crate) tenant_property: Option<&'static str>,
    pub(crate) parent: Option<(&'static str, &'static str)>,
    pub(crate) audit_record: bool,
}

impl EntityTypeBuilder {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            table: name,
            key: None,
            capabilities: CapabilitySet::empty(),
            properties: Vec::new(),
            deletion_flag: None,
            tenant_property: None,
            parent: None,
            audit_record: false,
        }
    }

    pub fn table(&mut self, table: &'static str) -> &mut Self {
        self.table = table;
        self
    }

    pub fn key(&mut self, property: &'static str, generation: KeyGeneration) -> &mut Self {
        self.key = Some((property, generation));
        self
    }

    pub fn capability(&mut self, capability: Capability) -> &mut Self {
        self.capabilities.insert(capability);
        self
    }

    /// Boolean property marking a row as soft deleted.
    pub fn deletion_flag(&mut self, property: &'static str) -> &mut Self {
        self.deletion_flag = Some(property);
        self
    }

    /// Property holding the owning tenant.
    pub fn tenant_property(&mut self, property: &'static str) -> &mut Self {
        self.tenant_property = Some(property);
        self
    }

    /// Groups this entity's change headers under a parent entity.
    pub fn parent(&mut self, property: &'static str, parent_entity: &'static str) -> &mut Self {
        self.parent = Some((property, parent_entity));
        self
    }

    pub(crate) fn audit_record(&mut self) -> &mut Self {
        self.audit_record = true;
        self
    }

    /// Declares a scalar property; the column defaults to the property name.
    pub fn property(&mut self, name: &'static str, kind: ValueKind) -> PropertyBuilder<'_> {
        self.push(name, PropertyShape::Scalar(kind))
    }

    pub fn navigation(&mut self, name: &'static str) -> PropertyBuilder<'_> {
        self.push(name, PropertyShape::Navigation)
    }

    fn push(&mut self, name: &'static str, shape: PropertyShape) -> PropertyBuilder<'_> {
        self.properties.push(PropertyDescriptor {
            name,
            column: name,
            shape,
            tracked: false,
            hide_values: false,
        });
        let index = self.properties.len() - 1;
        PropertyBuilder {
            descriptor: &mut self.properties[index],
        }
    }
}
