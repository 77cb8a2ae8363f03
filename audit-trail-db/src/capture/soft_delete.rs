use crate::models::audit::OperationKind;
use crate::models::value::PropertyValue;

/// A property change before masking and tracked-property filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPropertyDiff {
    pub property: &'static str,
    pub column: &'static str,
    /// Position among the tracked properties; untracked entries use the end.
    pub position: i64,
    /// `None` for creates, where no original exists.
    pub original: Option<PropertyValue>,
    pub current: PropertyValue,
    pub tracked: bool,
    pub values_hidden: bool,
}

/// Folds a deletion-flag transition into the operation kind.
pub struct SoftDeleteClassifier;

impl SoftDeleteClassifier {
    /// Reclassifies an update that sets the deletion flag as a delete.
    ///
    /// The flag's own diff is removed; every other diff is kept. Clearing the
    /// flag is a restore and stays an update. Creates are never reclassified.
    pub fn classify(
        operation: OperationKind,
        diffs: &mut Vec<RawPropertyDiff>,
        deletion_flag: Option<&str>,
    ) -> OperationKind {
        let Some(flag) = deletion_flag else {
            return operation;
        };
        if operation != OperationKind::Update {
            return operation;
        }

        let set_now = diffs.iter().position(|d| {
            d.property == flag
                && d.current.is_set()
                && !d.original.as_ref().is_some_and(PropertyValue::is_set)
        });

        match set_now {
            Some(index) => {
                diffs.remove(index);
                OperationKind::Delete
            }
            None => operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(property: &'static str, original: PropertyValue, current: PropertyValue) -> RawPropertyDiff {
        RawPropertyDiff {
            property,
            column: property,
            position: 0,
            original: Some(original),
            current,
            tracked: true,
            values_hidden: false,
        }
    }

    #[test]
    fn test_flag_set_becomes_delete_and_keeps_other_diffs() {
        let mut diffs = vec![
            diff("closed_reason", None::<String>.into(), "moved away".into()),
            diff("is_deleted", false.into(), true.into()),
        ];

        let kind = SoftDeleteClassifier::classify(OperationKind::Update, &mut diffs, Some("is_deleted"));

        assert_eq!(kind, OperationKind::Delete);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].property, "closed_reason");
    }

    #[test]
    fn test_unset_flag_counts_as_false() {
        let mut diffs = vec![diff("is_deleted", PropertyValue::Bool(None), true.into())];

        let kind = SoftDeleteClassifier::classify(OperationKind::Update, &mut diffs, Some("is_deleted"));

        assert_eq!(kind, OperationKind::Delete);
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_restore_stays_update() {
        let mut diffs = vec![diff("is_deleted", true.into(), false.into())];

        let kind = SoftDeleteClassifier::classify(OperationKind::Update, &mut diffs, Some("is_deleted"));

        assert_eq!(kind, OperationKind::Update);
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn test_create_with_flag_set_is_not_reclassified() {
        let mut diffs = vec![RawPropertyDiff {
            original: None,
            ..diff("is_deleted", false.into(), true.into())
        }];

        let kind = SoftDeleteClassifier::classify(OperationKind::Create, &mut diffs, Some("is_deleted"));

        assert_eq!(kind, OperationKind::Create);
        assert_eq!(diffs.len(), 1);
    }
}
