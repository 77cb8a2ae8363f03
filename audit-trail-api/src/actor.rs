use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current tenant for row filtering.
///
/// Read every time a filter is evaluated, so implementations backed by
/// request-scoped state see tenant switches immediately.
pub trait TenantAccessor: Send + Sync {
    fn current_tenant_id(&self) -> Option<Uuid>;
}

/// Who is acting, for which tenant, inside which request.
///
/// All reads are synchronous and must not perform I/O. Any of the ids may be
/// absent; capture records an absent actor rather than failing the save.
pub trait ActorContext: Send + Sync {
    fn current_user_id(&self) -> Option<Uuid>;

    fn current_tenant_id(&self) -> Option<Uuid>;

    fn correlation_id(&self) -> Option<Uuid>;

    /// Timestamp used for every stamp and change header of one save.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed actor context, for services that resolve the actor up front and for tests.
///
/// # Example
///
/// ```
/// use audit_trail_api::{ActorContext, StaticActorContext};
/// use uuid::Uuid;
///
/// let actor = StaticActorContext::anonymous()
///     .with_user_id(Uuid::new_v4())
///     .with_correlation_id(Uuid::new_v4());
///
/// assert!(actor.current_user_id().is_some());
/// assert!(actor.current_tenant_id().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticActorContext {
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub correlation_id: Option<Uuid>,
    /// Pinned clock; `None` uses the system clock.
    pub fixed_time: Option<DateTime<Utc>>,
}

impl StaticActorContext {
    /// A context with no actor, tenant or correlation id.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            correlation_id: None,
            fixed_time: None,
        }
    }

    #[must_use]
    pub const fn with_user_id(mut self, id: Uuid) -> Self {
        self.user_id = Some(id);
        self
    }

    #[must_use]
    pub const fn with_tenant_id(mut self, id: Uuid) -> Self {
        self.tenant_id = Some(id);
        self
    }

    #[must_use]
    pub const fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    #[must_use]
    pub const fn with_fixed_time(mut self, at: DateTime<Utc>) -> Self {
        self.fixed_time = Some(at);
        self
    }
}

impl ActorContext for StaticActorContext {
    fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn current_tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_time.unwrap_or_else(Utc::now)
    }
}

impl TenantAccessor for StaticActorContext {
    fn current_tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_time_is_used() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let actor = StaticActorContext::anonymous().with_fixed_time(at);
        assert_eq!(actor.now(), at);
    }

    #[test]
    fn test_tenant_accessor_matches_actor_tenant() {
        let tenant = Uuid::new_v4();
        let actor = StaticActorContext::anonymous().with_tenant_id(tenant);
        assert_eq!(TenantAccessor::current_tenant_id(&actor), Some(tenant));
        assert_eq!(ActorContext::current_tenant_id(&actor), Some(tenant));
    }
}
