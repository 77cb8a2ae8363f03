use std::any::Any;
use std::fmt;

use crate::error::ValueError;
use crate::metadata::EntityTypeBuilder;
use crate::models::capability::{FullyAuditable, TenantScoped, Timestamped};
use crate::models::value::{PropertyBag, PropertyValue};

/// Upcast helper so tracked entities can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Runtime view of a persistable entity.
///
/// Capability accessors default to `None`; an entity type overrides the ones
/// matching the capabilities it declares in [`EntityType::configure`].
pub trait Entity: AsAny + Send + Sync + fmt::Debug {
    /// Registered name of the entity type.
    fn entity_name(&self) -> &'static str;

    /// Primary key, `None` while a generated key is not known yet.
    fn key(&self) -> Option<PropertyValue>;

    fn set_key(&mut self, key: PropertyValue);

    /// Scalar property values in declared order, key included.
    fn values(&self) -> PropertyBag;

    fn as_timestamped_mut(&mut self) -> Option<&mut dyn Timestamped> {
        None
    }

    fn as_fully_auditable(&self) -> Option<&dyn FullyAuditable> {
        None
    }

    fn as_fully_auditable_mut(&mut self) -> Option<&mut dyn FullyAuditable> {
        None
    }

    fn as_tenant_scoped(&self) -> Option<&dyn TenantScoped> {
        None
    }

    fn as_tenant_scoped_mut(&mut self) -> Option<&mut dyn TenantScoped> {
        None
    }
}

/// Static side of an entity: its model declaration and row materialization.
pub trait EntityType: Entity + Sized {
    const ENTITY_NAME: &'static str;

    /// Declares table, key, capabilities and property markers.
    fn configure(entity: &mut EntityTypeBuilder);

    /// Builds an instance from a loaded row.
    fn from_values(values: &PropertyBag) -> Result<Self, ValueError>;
}

pub(crate) fn downcast_ref<T: 'static>(entity: &dyn Entity) -> Option<&T> {
    entity.as_any().downcast_ref::<T>()
}

pub(crate) fn downcast_mut<T: 'static>(entity: &mut dyn Entity) -> Option<&mut T> {
    entity.as_any_mut().downcast_mut::<T>()
}
