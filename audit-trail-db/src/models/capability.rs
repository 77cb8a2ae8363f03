use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Entities carrying creation and modification instants.
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn set_created_at(&mut self, at: DateTime<Utc>);
    fn modified_at(&self) -> Option<DateTime<Utc>>;
    fn set_modified_at(&mut self, at: DateTime<Utc>);
}

/// Entities carrying actor fields and a soft-delete flag.
pub trait FullyAuditable: Timestamped {
    fn created_by(&self) -> Option<Uuid>;
    fn set_created_by(&mut self, by: Option<Uuid>);
    fn modified_by(&self) -> Option<Uuid>;
    fn set_modified_by(&mut self, by: Option<Uuid>);
    fn is_deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted: bool);
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);
    fn deleted_by(&self) -> Option<Uuid>;
    fn set_deleted_by(&mut self, by: Option<Uuid>);
}

/// Entities owned by a tenant.
pub trait TenantScoped {
    fn tenant_id(&self) -> Option<Uuid>;
    fn set_tenant_id(&mut self, tenant_id: Option<Uuid>);
}

/// Capabilities an entity type can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Timestamped,
    /// Implies `Timestamped`.
    FullyAuditable,
    /// Subject to property-level change capture.
    PropertyChangeAuditable,
    TenantScoped,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Timestamped,
        Capability::FullyAuditable,
        Capability::PropertyChangeAuditable,
        Capability::TenantScoped,
    ];

    fn bit(self) -> u8 {
        match self {
            Capability::Timestamped => 1,
            Capability::FullyAuditable => 1 << 1,
            Capability::PropertyChangeAuditable => 1 << 2,
            Capability::TenantScoped => 1 << 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Timestamped => "timestamped",
            Capability::FullyAuditable => "fully auditable",
            Capability::PropertyChangeAuditable => "property-change auditable",
            Capability::TenantScoped => "tenant scoped",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Inserts a capability together with the ones it implies.
    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
        if capability == Capability::FullyAuditable {
            self.0 |= Capability::Timestamped.bit();
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_auditable_implies_timestamped() {
        let set: CapabilitySet = [Capability::FullyAuditable].into_iter().collect();
        assert!(set.contains(Capability::Timestamped));
        assert!(!set.contains(Capability::TenantScoped));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::Timestamped, Capability::FullyAuditable]
        );
    }
}
