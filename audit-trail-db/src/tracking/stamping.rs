use chrono::{DateTime, Utc};
use tracing::warn;

use audit_trail_api::ActorContext;

use crate::metadata::ModelRegistry;
use crate::models::capability::Capability;
use crate::tracking::tracker::{ChangeTracker, EntryId, EntryState};

/// Fills auditing fields of pending entries from the actor context.
///
/// Deleted fully-auditable entities are turned into soft deletes: they stay
/// in the table with the deletion flag set and are written as updates.
pub fn stamp_pending(
    tracker: &mut ChangeTracker,
    registry: &ModelRegistry,
    actor: &dyn ActorContext,
    now: DateTime<Utc>,
) {
    let user = actor.current_user_id();
    let actor_tenant = actor.current_tenant_id();

    for id in tracker.pending_ids() {
        let Some(entry) = tracker.entry_mut(id) else {
            continue;
        };
        let Some(descriptor) = registry.descriptor(entry.entity().entity_name()) else {
            continue;
        };
        if descriptor.audit_record {
            continue;
        }

        let mut state = entry.state();
        let edited = entry.original_values() != Some(&entry.current_values());
        let entity = entry.entity_mut();

        if state == EntryState::Deleted && descriptor.has(Capability::FullyAuditable) {
            if let Some(auditable) = entity.as_fully_auditable_mut() {
                if auditable.is_deleted() {
                    // Already soft-deleted: the original deletion stamps stay.
                    state = if edited {
                        EntryState::Modified
                    } else {
                        EntryState::Unchanged
                    };
                } else {
                    auditable.set_deleted(true);
                    auditable.set_deleted_at(Some(now));
                    auditable.set_deleted_by(user);
                    state = EntryState::Modified;
                }
            }
        }

        match state {
            EntryState::Added => {
                if let Some(timestamped) = entity.as_timestamped_mut() {
                    timestamped.set_created_at(now);
                }
                if let Some(auditable) = entity.as_fully_auditable_mut() {
                    auditable.set_created_by(user);
                }
                if let Some(scoped) = entity.as_tenant_scoped_mut() {
                    if scoped.tenant_id().is_none() {
                        scoped.set_tenant_id(actor_tenant);
                    }
                }
            }
            EntryState::Modified => {
                if let Some(timestamped) = entity.as_timestamped_mut() {
                    timestamped.set_modified_at(now);
                }
                if let Some(auditable) = entity.as_fully_auditable_mut() {
                    auditable.set_modified_by(user);
                }
            }
            EntryState::Deleted | EntryState::Unchanged => {}
        }

        if let (Some(expected), Some(scoped)) = (actor_tenant, entity.as_tenant_scoped()) {
            if let Some(actual) = scoped.tenant_id().filter(|t| *t != expected) {
                warn!(
                    entity = descriptor.name,
                    entry = %id,
                    entity_tenant = %actual,
                    actor_tenant = %expected,
                    "Entity tenant differs from actor tenant"
                );
            }
        }

        tracker.set_state(id, state);
    }
}

/// Clears the soft-delete fields of a tracked entity and stamps the modification.
///
/// Returns false when the entity is not fully auditable.
pub fn restore_entry(
    tracker: &mut ChangeTracker,
    id: EntryId,
    actor: &dyn ActorContext,
    now: DateTime<Utc>,
) -> bool {
    let Some(entry) = tracker.entry_mut(id) else {
        return false;
    };
    let pending_delete = entry.state() == EntryState::Deleted;
    let Some(auditable) = entry.entity_mut().as_fully_auditable_mut() else {
        return false;
    };

    auditable.set_deleted(false);
    auditable.set_deleted_at(None);
    auditable.set_deleted_by(None);
    auditable.set_modified_at(now);
    auditable.set_modified_by(actor.current_user_id());

    // An unsaved remove is cancelled rather than turned into a soft delete.
    if pending_delete {
        tracker.set_state(id, EntryState::Modified);
    }
    true
}
