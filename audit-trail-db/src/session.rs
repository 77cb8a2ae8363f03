use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use audit_trail_api::{ActorContext, AuditConfig, AuditFault, AuditStrictness, SaveError, SaveResult};

use crate::capture::{AuditPersistenceCommitter, ChangeCaptureEngine, PendingChange, TemporaryKeyResolver};
use crate::error::SessionError;
use crate::filter::RowFilters;
use crate::metadata::ModelRegistry;
use crate::models::capability::Capability;
use crate::models::entity::{Entity, EntityType};
use crate::repository::entity_store::EntityStore;
use crate::tracking::{restore_entry, stamp_pending, ChangeTracker, EntryId};

/// What happened to the audit half of a save.
#[derive(Debug)]
pub enum AuditOutcome {
    Recorded { headers: usize, diffs: usize },
    /// No auditable entity changed, or auditing is disabled.
    NothingToRecord,
    /// Business data is saved; the audit trail for this save is incomplete.
    Failed(AuditFault),
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub transaction_id: Uuid,
    pub entities_written: usize,
    pub audit: AuditOutcome,
}

/// A unit of work over an [`EntityStore`] that records an audit trail.
///
/// Not meant to be shared between concurrent callers; create one per request.
pub struct AuditingSession<S: EntityStore> {
    store: Arc<S>,
    registry: Arc<ModelRegistry>,
    actor: Arc<dyn ActorContext>,
    filters: RowFilters,
    config: AuditConfig,
    tracker: ChangeTracker,
}

impl<S: EntityStore> AuditingSession<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<ModelRegistry>,
        actor: Arc<dyn ActorContext>,
        filters: RowFilters,
        config: AuditConfig,
    ) -> Self {
        Self {
            store,
            registry,
            actor,
            filters,
            config,
            tracker: ChangeTracker::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn filters(&self) -> &RowFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut RowFilters {
        &mut self.filters
    }

    /// Tracks a new entity for insertion on the next save.
    pub fn add<T: EntityType>(&mut self, mut entity: T) -> Result<EntryId, SessionError> {
        self.check_entity(&mut entity)?;
        Ok(self.tracker.add(Box::new(entity)))
    }

    /// Tracks an entity that already exists in the store.
    pub fn attach<T: EntityType>(&mut self, mut entity: T) -> Result<EntryId, SessionError> {
        self.check_entity(&mut entity)?;
        Ok(self.tracker.attach(Box::new(entity)))
    }

    /// Marks an entity for deletion. Fully auditable entities are soft deleted.
    pub fn remove(&mut self, id: EntryId) -> Result<(), SessionError> {
        if self.tracker.remove(id) {
            Ok(())
        } else {
            Err(SessionError::UnknownEntry(id))
        }
    }

    pub fn entity<T: EntityType>(&self, id: EntryId) -> Option<&T> {
        self.tracker.entity::<T>(id)
    }

    pub fn entity_mut<T: EntityType>(&mut self, id: EntryId) -> Option<&mut T> {
        self.tracker.entity_mut::<T>(id)
    }

    /// Undoes a soft delete; the next save records an ordinary update.
    pub fn restore(&mut self, id: EntryId) -> Result<(), SessionError> {
        let entity_name = self
            .tracker
            .entry(id)
            .map(|entry| entry.entity().entity_name())
            .ok_or(SessionError::UnknownEntry(id))?;

        let now = self.actor.now();
        if restore_entry(&mut self.tracker, id, self.actor.as_ref(), now) {
            Ok(())
        } else {
            Err(SessionError::CapabilityMissing {
                entity: entity_name.to_string(),
                capability: Capability::FullyAuditable.as_str(),
            })
        }
    }

    /// Loads rows passing the enabled row filters without tracking them.
    pub async fn query<T: EntityType>(&self) -> Result<Vec<T>, SessionError> {
        let descriptor = self.registry.require(T::ENTITY_NAME)?;
        let rows = self
            .store
            .query(descriptor, &self.filters)
            .await
            .map_err(SessionError::Query)?;

        rows.iter()
            .map(|row| T::from_values(row).map_err(SessionError::from))
            .collect()
    }

    /// Loads rows passing the enabled row filters and attaches them.
    pub async fn load<T: EntityType>(&mut self) -> Result<Vec<EntryId>, SessionError> {
        let entities = self.query::<T>().await?;
        entities.into_iter().map(|entity| self.attach(entity)).collect()
    }

    /// Writes all pending changes and records their audit trail.
    ///
    /// Changes are captured before the business write, owning keys are
    /// resolved after it, and the audit records are written as a second,
    /// separate write. A failing audit write never undoes the business write.
    pub async fn save_changes(&mut self) -> SaveResult<SaveOutcome> {
        let transaction_id = Uuid::new_v4();
        let now = self.actor.now();

        self.tracker.detect_changes();
        stamp_pending(&mut self.tracker, &self.registry, self.actor.as_ref(), now);

        let mut pending: Vec<PendingChange> = if self.config.enabled {
            ChangeCaptureEngine::new(&self.registry, &self.config.redaction_marker).capture_at(
                &self.tracker,
                transaction_id,
                self.actor.as_ref(),
                now,
            )
        } else {
            Vec::new()
        };

        let mut writes = self.tracker.pending_writes();
        if writes.is_empty() {
            return Ok(SaveOutcome {
                transaction_id,
                entities_written: 0,
                audit: AuditOutcome::NothingToRecord,
            });
        }

        let entities_written = self
            .store
            .apply(&self.registry, &mut writes)
            .await
            .map_err(SaveError::Business)?;

        for write in writes {
            if let Some(key) = write.generated_key {
                self.tracker.set_generated_key(write.entry, key);
            }
        }
        self.tracker.accept_all_changes();

        info!(%transaction_id, entities_written, captured = pending.len(), "Saved changes");

        if pending.is_empty() {
            return Ok(SaveOutcome {
                transaction_id,
                entities_written,
                audit: AuditOutcome::NothingToRecord,
            });
        }
        if self.actor.current_user_id().is_none() {
            warn!(%transaction_id, "No current user; changes recorded without an actor");
        }

        let unresolved = TemporaryKeyResolver::resolve(&mut pending, &self.tracker, &self.registry);
        let committed = if unresolved > 0 {
            Err(AuditFault::KeyResolution {
                transaction_id,
                count: unresolved,
            })
        } else {
            AuditPersistenceCommitter::new(self.store.as_ref(), &self.registry)
                .commit(&mut self.tracker, transaction_id, pending)
                .await
        };

        let audit = match committed {
            Ok(committed) => AuditOutcome::Recorded {
                headers: committed.headers,
                diffs: committed.diffs,
            },
            Err(fault) => {
                error!(%transaction_id, entities_written, error = %fault, "Audit trail incomplete");
                match self.config.strictness {
                    AuditStrictness::Strict => {
                        return Err(SaveError::Audit {
                            entities_written,
                            fault,
                        })
                    }
                    AuditStrictness::Lenient => AuditOutcome::Failed(fault),
                }
            }
        };

        Ok(SaveOutcome {
            transaction_id,
            entities_written,
            audit,
        })
    }

    fn check_entity(&self, entity: &mut dyn Entity) -> Result<(), SessionError> {
        let descriptor = self.registry.require(entity.entity_name())?;
        if descriptor.audit_record {
            return Err(SessionError::AuditRecord(descriptor.name.to_string()));
        }

        for capability in descriptor.capabilities.iter() {
            let exposed = match capability {
                Capability::Timestamped => entity.as_timestamped_mut().is_some(),
                Capability::FullyAuditable => entity.as_fully_auditable().is_some(),
                Capability::TenantScoped => entity.as_tenant_scoped().is_some(),
                Capability::PropertyChangeAuditable => true,
            };
            if !exposed {
                return Err(SessionError::CapabilityMismatch {
                    entity: descriptor.name.to_string(),
                    capability: capability.as_str(),
                });
            }
        }
        Ok(())
    }
}
