use std::mem;

use tracing::debug;
use uuid::Uuid;

use audit_trail_api::AuditFault;

use crate::capture::engine::PendingChange;
use crate::metadata::ModelRegistry;
use crate::repository::entity_store::EntityStore;
use crate::tracking::{ChangeTracker, EntryId};

/// Counts of audit records written by one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedAudit {
    pub headers: usize,
    pub diffs: usize,
}

/// Persists resolved change headers as a second write.
///
/// The records go through the tracker and the store like any entity, but
/// the write is issued directly: capture never runs for it, and the engine
/// skips audit record types anyway.
pub struct AuditPersistenceCommitter<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    registry: &'a ModelRegistry,
}

impl<'a, S: EntityStore + ?Sized> AuditPersistenceCommitter<'a, S> {
    pub fn new(store: &'a S, registry: &'a ModelRegistry) -> Self {
        Self { store, registry }
    }

    /// Writes headers, then their diffs.
    ///
    /// Fails without writing anything when a header has no owning key. The
    /// audit entries are detached from the tracker whatever the outcome.
    pub async fn commit(
        &self,
        tracker: &mut ChangeTracker,
        transaction_id: Uuid,
        changes: Vec<PendingChange>,
    ) -> Result<CommittedAudit, AuditFault> {
        let unresolved = changes
            .iter()
            .filter(|c| c.header.owning_entity_id.is_none())
            .count();
        if unresolved > 0 {
            return Err(AuditFault::KeyResolution {
                transaction_id,
                count: unresolved,
            });
        }

        let mut header_ids: Vec<EntryId> = Vec::with_capacity(changes.len());
        let mut diff_ids: Vec<EntryId> = Vec::new();
        for change in changes {
            let mut header = change.header;
            let diffs = mem::take(&mut header.property_diffs);
            header_ids.push(tracker.add(Box::new(header)));
            diff_ids.extend(diffs.into_iter().map(|diff| tracker.add(Box::new(diff))));
        }

        let committed = CommittedAudit {
            headers: header_ids.len(),
            diffs: diff_ids.len(),
        };
        let entries: Vec<EntryId> = header_ids.into_iter().chain(diff_ids).collect();
        let mut writes = tracker.writes_for(&entries);

        let result = self.store.apply(self.registry, &mut writes).await;
        for id in &entries {
            tracker.detach(*id);
        }

        result.map_err(|source| AuditFault::Commit {
            transaction_id,
            source,
        })?;

        debug!(
            %transaction_id,
            headers = committed.headers,
            diffs = committed.diffs,
            "Audit records written"
        );
        Ok(committed)
    }
}
