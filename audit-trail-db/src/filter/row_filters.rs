use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use audit_trail_api::TenantAccessor;

use crate::metadata::{ColumnRef, ModelRegistry};
use crate::models::value::{PropertyBag, PropertyValue};

/// Name under which a default row filter can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterName {
    SoftDelete,
    Tenant,
}

impl FilterName {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterName::SoftDelete => "soft_delete",
            FilterName::Tenant => "tenant",
        }
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soft_delete" => Ok(FilterName::SoftDelete),
            "tenant" => Ok(FilterName::Tenant),
            _ => Err(format!("Unknown row filter: {s}")),
        }
    }
}

/// Condition a row must meet to be visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPredicate {
    /// Flag is false or null.
    IsNotTrue {
        property: &'static str,
        column: &'static str,
    },
    /// Column equals the value. A null value matches no row.
    Equals {
        property: &'static str,
        column: &'static str,
        value: PropertyValue,
    },
}

impl RowPredicate {
    pub fn matches(&self, row: &PropertyBag) -> bool {
        match self {
            RowPredicate::IsNotTrue { property, .. } => !row.get(property).is_some_and(PropertyValue::is_set),
            RowPredicate::Equals { property, value, .. } => {
                !value.is_null() && row.get(property).is_some_and(|v| v == value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct EntityFilters {
    soft_delete: Option<ColumnRef>,
    tenant: Option<ColumnRef>,
}

/// Default-exclude row filters of one session.
///
/// Both filters start enabled and are toggled independently. The tenant is
/// read from the accessor each time a filter is evaluated.
#[derive(Clone)]
pub struct RowFilters {
    entities: Arc<HashMap<&'static str, EntityFilters>>,
    tenant: Arc<dyn TenantAccessor>,
    soft_delete_enabled: bool,
    tenant_enabled: bool,
}

impl RowFilters {
    pub fn enable(&mut self, name: FilterName) {
        self.set_enabled(name, true);
    }

    pub fn disable(&mut self, name: FilterName) {
        self.set_enabled(name, false);
    }

    pub fn is_enabled(&self, name: FilterName) -> bool {
        match name {
            FilterName::SoftDelete => self.soft_delete_enabled,
            FilterName::Tenant => self.tenant_enabled,
        }
    }

    fn set_enabled(&mut self, name: FilterName, enabled: bool) {
        match name {
            FilterName::SoftDelete => self.soft_delete_enabled = enabled,
            FilterName::Tenant => self.tenant_enabled = enabled,
        }
    }

    /// Whether the filter is registered for the entity type, enabled or not.
    pub fn applies_to(&self, entity_name: &str, name: FilterName) -> bool {
        self.entities.get(entity_name).is_some_and(|f| match name {
            FilterName::SoftDelete => f.soft_delete.is_some(),
            FilterName::Tenant => f.tenant.is_some(),
        })
    }

    /// Predicates of the enabled filters for an entity type.
    pub fn predicates_for(&self, entity_name: &str) -> Vec<RowPredicate> {
        let Some(filters) = self.entities.get(entity_name) else {
            return Vec::new();
        };

        let mut predicates = Vec::new();
        if let (true, Some(flag)) = (self.soft_delete_enabled, filters.soft_delete) {
            predicates.push(RowPredicate::IsNotTrue {
                property: flag.property,
                column: flag.column,
            });
        }
        if let (true, Some(tenant)) = (self.tenant_enabled, filters.tenant) {
            predicates.push(RowPredicate::Equals {
                property: tenant.property,
                column: tenant.column,
                value: self.tenant.current_tenant_id().into(),
            });
        }
        predicates
    }

    pub fn matches(&self, entity_name: &str, row: &PropertyBag) -> bool {
        self.predicates_for(entity_name).iter().all(|p| p.matches(row))
    }
}

impl fmt::Debug for RowFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilters")
            .field("entities", &self.entities.len())
            .field("soft_delete_enabled", &self.soft_delete_enabled)
            .field("tenant_enabled", &self.tenant_enabled)
            .finish()
    }
}

/// Registers the default row filters, once per registry.
pub struct RowFilterConfigurator;

impl RowFilterConfigurator {
    /// Soft-delete filter for every type with a deletion flag, tenant filter
    /// for every tenant-scoped type.
    pub fn configure(registry: &ModelRegistry, tenant: Arc<dyn TenantAccessor>) -> RowFilters {
        let entities = registry
            .descriptors()
            .filter_map(|d| {
                let filters = EntityFilters {
                    soft_delete: d.deletion_flag,
                    tenant: d.tenant,
                };
                (filters.soft_delete.is_some() || filters.tenant.is_some()).then_some((d.name, filters))
            })
            .collect();

        RowFilters {
            entities: Arc::new(entities),
            tenant,
            soft_delete_enabled: true,
            tenant_enabled: true,
        }
    }
}
