use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use audit_trail_api::ActorContext;

use crate::capture::soft_delete::{RawPropertyDiff, SoftDeleteClassifier};
use crate::metadata::{EntityDescriptor, ModelRegistry};
use crate::models::audit::{ChangeHeaderModel, OperationKind, PropertyDiffModel};
use crate::models::capability::Capability;
use crate::models::value::{PropertyBag, PropertyValue};
use crate::tracking::{ChangeTracker, EntryId, EntryState, TrackedEntry};
use crate::utils::to_bounded_lossy;

/// A captured change header and the tracker entry it describes.
///
/// The entry is kept so the owning key can be read once the write has
/// generated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub header: ChangeHeaderModel,
    pub entry: EntryId,
}

/// Fields shared by every header of one save.
struct HeaderStamp {
    transaction_id: Uuid,
    correlation_id: Option<Uuid>,
    changed_by: Option<Uuid>,
    changed_at: DateTime<Utc>,
}

/// Turns pending tracker entries into change headers and property diffs.
///
/// Must run before the business write: the write settles the tracker and
/// the original values are gone afterwards.
pub struct ChangeCaptureEngine<'a> {
    registry: &'a ModelRegistry,
    redaction_marker: &'a str,
}

impl<'a> ChangeCaptureEngine<'a> {
    pub fn new(registry: &'a ModelRegistry, redaction_marker: &'a str) -> Self {
        Self {
            registry,
            redaction_marker,
        }
    }

    pub fn capture(
        &self,
        tracker: &ChangeTracker,
        transaction_id: Uuid,
        actor: &dyn ActorContext,
    ) -> Vec<PendingChange> {
        self.capture_at(tracker, transaction_id, actor, actor.now())
    }

    /// Captures with an explicit timestamp shared by every header.
    pub fn capture_at(
        &self,
        tracker: &ChangeTracker,
        transaction_id: Uuid,
        actor: &dyn ActorContext,
        now: DateTime<Utc>,
    ) -> Vec<PendingChange> {
        let stamp = HeaderStamp {
            transaction_id,
            correlation_id: actor.correlation_id(),
            changed_by: actor.current_user_id(),
            changed_at: now,
        };

        tracker
            .pending_entries()
            .filter_map(|(id, entry)| {
                let descriptor = self.registry.descriptor(entry.entity().entity_name())?;
                if descriptor.audit_record || !descriptor.has(Capability::PropertyChangeAuditable) {
                    return None;
                }

                let header = self.capture_entry(descriptor, entry, &stamp)?;

                debug!(
                    entity = descriptor.name,
                    entry = %id,
                    operation = %header.operation_kind,
                    diffs = header.property_diffs.len(),
                    "Captured change"
                );
                Some(PendingChange { header, entry: id })
            })
            .collect()
    }

    fn capture_entry(
        &self,
        descriptor: &EntityDescriptor,
        entry: &TrackedEntry,
        stamp: &HeaderStamp,
    ) -> Option<ChangeHeaderModel> {
        let operation = match entry.state() {
            EntryState::Added => OperationKind::Create,
            EntryState::Modified => OperationKind::Update,
            EntryState::Deleted => OperationKind::Delete,
            EntryState::Unchanged => return None,
        };

        let current = entry.current_values();
        let original = match operation {
            OperationKind::Create => None,
            _ => entry.original_values(),
        };

        let mut diffs = raw_diffs(descriptor, original, &current);
        let deletion_flag = descriptor.deletion_flag.map(|c| c.property);
        let operation = SoftDeleteClassifier::classify(operation, &mut diffs, deletion_flag);

        let owning_entity_id = match operation {
            OperationKind::Create => None,
            _ => entry.entity().key().and_then(|key| key.to_audit_text()),
        };

        let (parent_entity_name, parent_entity_id) = match descriptor.parent {
            Some((column, parent)) => (
                Some(to_bounded_lossy(parent)),
                current.get(column.property).and_then(PropertyValue::to_audit_text),
            ),
            None => (None, None),
        };

        let id = Uuid::new_v4();
        let property_diffs = diffs
            .into_iter()
            .filter(|d| d.tracked)
            .map(|d| self.finish_diff(id, d))
            .collect();

        Some(ChangeHeaderModel {
            id,
            transaction_id: stamp.transaction_id,
            correlation_id: stamp.correlation_id,
            entity_type_name: to_bounded_lossy(descriptor.name),
            table_name: to_bounded_lossy(descriptor.table),
            operation_kind: operation,
            owning_entity_id,
            parent_entity_name,
            parent_entity_id,
            changed_by: stamp.changed_by,
            changed_at: stamp.changed_at,
            property_diffs,
        })
    }

    fn finish_diff(&self, change_header_id: Uuid, diff: RawPropertyDiff) -> PropertyDiffModel {
        let (original_value, new_value) = if diff.values_hidden {
            (
                Some(self.redaction_marker.to_string()),
                Some(self.redaction_marker.to_string()),
            )
        } else {
            (
                diff.original.as_ref().and_then(PropertyValue::to_audit_text),
                diff.current.to_audit_text(),
            )
        };

        PropertyDiffModel {
            id: Uuid::new_v4(),
            change_header_id,
            position: diff.position,
            property_name: to_bounded_lossy(diff.property),
            column_name: to_bounded_lossy(diff.column),
            original_value,
            new_value,
            values_hidden: diff.values_hidden,
        }
    }
}

/// Diffs of tracked properties plus the deletion flag, in declared order.
///
/// Without an original every tracked property counts as changed.
fn raw_diffs(
    descriptor: &EntityDescriptor,
    original: Option<&PropertyBag>,
    current: &PropertyBag,
) -> Vec<RawPropertyDiff> {
    let tracked = descriptor.tracked_properties();
    let mut diffs: Vec<RawPropertyDiff> = Vec::with_capacity(tracked.len());

    let value_of = |bag: &PropertyBag, name: &str| -> Option<PropertyValue> {
        let kind = descriptor.property(name).and_then(|p| p.kind())?;
        Some(bag.get(name).cloned().unwrap_or_else(|| PropertyValue::null(kind)))
    };

    for (position, spec) in tracked.iter().enumerate() {
        let Some(new) = value_of(current, spec.name) else {
            continue;
        };
        let old = match original {
            Some(bag) => match value_of(bag, spec.name) {
                Some(old) if old == new => continue,
                old => old,
            },
            None => None,
        };
        diffs.push(RawPropertyDiff {
            property: spec.name,
            column: spec.column,
            position: position as i64,
            original: old,
            current: new,
            tracked: true,
            values_hidden: spec.values_hidden,
        });
    }

    if let (Some(flag), Some(bag)) = (descriptor.deletion_flag, original) {
        let already_diffed = diffs.iter().any(|d| d.property == flag.property);
        if let (false, Some(old), Some(new)) = (
            already_diffed,
            value_of(bag, flag.property),
            value_of(current, flag.property),
        ) {
            if old != new {
                diffs.push(RawPropertyDiff {
                    property: flag.property,
                    column: flag.column,
                    position: tracked.len() as i64,
                    original: Some(old),
                    current: new,
                    tracked: false,
                    values_hidden: false,
                });
            }
        }
    }

    diffs
}
