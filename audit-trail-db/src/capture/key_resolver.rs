use crate::capture::engine::PendingChange;
use crate::metadata::ModelRegistry;
use crate::models::value::PropertyValue;
use crate::tracking::ChangeTracker;

/// Back-fills keys that only exist after the business write.
pub struct TemporaryKeyResolver;

impl TemporaryKeyResolver {
    /// Assigns owning keys to headers still lacking one, reading them off the
    /// tracked entities. Parent ids generated by the same write are filled in too.
    ///
    /// Returns the number of headers whose owning key is still unknown.
    pub fn resolve(changes: &mut [PendingChange], tracker: &ChangeTracker, registry: &ModelRegistry) -> usize {
        let mut unresolved = 0;

        for change in changes.iter_mut() {
            let Some(entry) = tracker.entry(change.entry) else {
                if change.header.owning_entity_id.is_none() {
                    unresolved += 1;
                }
                continue;
            };
            let header = &mut change.header;

            if header.owning_entity_id.is_none() {
                header.owning_entity_id = entry.entity().key().and_then(|key| key.to_audit_text());
            }

            if header.parent_entity_id.is_none() {
                let parent = registry
                    .descriptor(entry.entity().entity_name())
                    .and_then(|d| d.parent);
                if let Some((column, _)) = parent {
                    header.parent_entity_id = entry
                        .current_values()
                        .get(column.property)
                        .and_then(PropertyValue::to_audit_text);
                }
            }

            if header.owning_entity_id.is_none() {
                unresolved += 1;
            }
        }

        unresolved
    }
}
