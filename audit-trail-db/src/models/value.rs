use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValueError;

/// Storage type of a scalar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    Decimal,
    Text,
    Uuid,
    Timestamp,
}

/// A typed, nullable scalar property value.
///
/// Nulls keep their kind so that they can be bound to typed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Decimal(Option<Decimal>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
}

impl PropertyValue {
    /// A null of the given kind.
    pub fn null(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => PropertyValue::Bool(None),
            ValueKind::Int => PropertyValue::Int(None),
            ValueKind::Decimal => PropertyValue::Decimal(None),
            ValueKind::Text => PropertyValue::Text(None),
            ValueKind::Uuid => PropertyValue::Uuid(None),
            ValueKind::Timestamp => PropertyValue::Timestamp(None),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Int(_) => ValueKind::Int,
            PropertyValue::Decimal(_) => ValueKind::Decimal,
            PropertyValue::Text(_) => ValueKind::Text,
            PropertyValue::Uuid(_) => ValueKind::Uuid,
            PropertyValue::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            PropertyValue::Bool(v) => v.is_none(),
            PropertyValue::Int(v) => v.is_none(),
            PropertyValue::Decimal(v) => v.is_none(),
            PropertyValue::Text(v) => v.is_none(),
            PropertyValue::Uuid(v) => v.is_none(),
            PropertyValue::Timestamp(v) => v.is_none(),
        }
    }

    /// True only for a non-null boolean `true`.
    pub fn is_set(&self) -> bool {
        matches!(self, PropertyValue::Bool(Some(true)))
    }

    /// Formats the value for the audit trail. Null formats as `None`.
    pub fn to_audit_text(&self) -> Option<String> {
        match self {
            PropertyValue::Bool(v) => v.map(|b| b.to_string()),
            PropertyValue::Int(v) => v.map(|i| i.to_string()),
            PropertyValue::Decimal(v) => v.map(|d| d.normalize().to_string()),
            PropertyValue::Text(v) => v.clone(),
            PropertyValue::Uuid(v) => v.map(|u| u.hyphenated().to_string()),
            PropertyValue::Timestamp(v) => v.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

macro_rules! impl_from_scalar {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                PropertyValue::$variant(Some(value.into()))
            }
        }

        impl From<Option<$ty>> for PropertyValue {
            fn from(value: Option<$ty>) -> Self {
                PropertyValue::$variant(value.map(Into::into))
            }
        }
    };
}

impl_from_scalar!(bool, Bool);
impl_from_scalar!(i64, Int);
impl_from_scalar!(i32, Int);
impl_from_scalar!(Decimal, Decimal);
impl_from_scalar!(String, Text);
impl_from_scalar!(Uuid, Uuid);
impl_from_scalar!(DateTime<Utc>, Timestamp);

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(Some(value.to_string()))
    }
}

impl From<Option<&str>> for PropertyValue {
    fn from(value: Option<&str>) -> Self {
        PropertyValue::Text(value.map(str::to_string))
    }
}

/// Conversion out of a [`PropertyValue`], used when materializing entities.
pub trait FromPropertyValue: Sized {
    fn from_property_value(property: &str, value: &PropertyValue) -> Result<Self, ValueError>;
}

macro_rules! impl_from_property_value {
    ($ty:ty, $variant:ident) => {
        impl FromPropertyValue for Option<$ty> {
            fn from_property_value(property: &str, value: &PropertyValue) -> Result<Self, ValueError> {
                match value {
                    PropertyValue::$variant(v) => Ok(v.clone()),
                    other => Err(ValueError::KindMismatch {
                        property: property.to_string(),
                        expected: ValueKind::$variant,
                        found: other.kind(),
                    }),
                }
            }
        }

        impl FromPropertyValue for $ty {
            fn from_property_value(property: &str, value: &PropertyValue) -> Result<Self, ValueError> {
                Option::<$ty>::from_property_value(property, value)?
                    .ok_or_else(|| ValueError::Null(property.to_string()))
            }
        }
    };
}

impl_from_property_value!(bool, Bool);
impl_from_property_value!(i64, Int);
impl_from_property_value!(Decimal, Decimal);
impl_from_property_value!(String, Text);
impl_from_property_value!(Uuid, Uuid);
impl_from_property_value!(DateTime<Utc>, Timestamp);

/// Property values of one entity, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyBag {
    entries: Vec<(&'static str, PropertyValue)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a value, keeping the position of an existing entry.
    pub fn insert(&mut self, name: &'static str, value: impl Into<PropertyValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Reads a typed value.
    pub fn get_as<T: FromPropertyValue>(&self, name: &str) -> Result<T, ValueError> {
        let value = self
            .get(name)
            .ok_or_else(|| ValueError::Missing(name.to_string()))?;
        T::from_property_value(name, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_audit_text_formatting() {
        assert_eq!(PropertyValue::from(true).to_audit_text().as_deref(), Some("true"));
        assert_eq!(PropertyValue::from(42i64).to_audit_text().as_deref(), Some("42"));
        assert_eq!(
            PropertyValue::from(Decimal::from_str("12.500").unwrap()).to_audit_text().as_deref(),
            Some("12.5")
        );
        assert_eq!(PropertyValue::from("").to_audit_text().as_deref(), Some(""));
        assert_eq!(PropertyValue::Text(None).to_audit_text(), None);

        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            PropertyValue::from(at).to_audit_text().as_deref(),
            Some("2024-01-02T03:04:05Z")
        );
    }

    #[test]
    fn test_typed_nulls_keep_their_kind() {
        let value = PropertyValue::null(ValueKind::Uuid);
        assert!(value.is_null());
        assert_eq!(value.kind(), ValueKind::Uuid);
        assert_eq!(PropertyValue::from(None::<i64>), PropertyValue::Int(None));
    }

    #[test]
    fn test_bag_insert_replaces_in_place() {
        let mut bag = PropertyBag::new().with("id", 1i64).with("name", "Alice");
        bag.insert("id", 2i64);

        let names: Vec<_> = bag.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(bag.get_as::<i64>("id").unwrap(), 2);
    }

    #[test]
    fn test_get_as_reports_mismatch_and_null() {
        let bag = PropertyBag::new()
            .with("name", "Alice")
            .with("nickname", None::<String>);

        assert_eq!(
            bag.get_as::<i64>("name").unwrap_err(),
            ValueError::KindMismatch {
                property: "name".to_string(),
                expected: ValueKind::Int,
                found: ValueKind::Text,
            }
        );
        assert_eq!(
            bag.get_as::<String>("nickname").unwrap_err(),
            ValueError::Null("nickname".to_string())
        );
        assert_eq!(bag.get_as::<Option<String>>("nickname").unwrap(), None);
        assert_eq!(
            bag.get_as::<bool>("missing").unwrap_err(),
            ValueError::Missing("missing".to_string())
        );
    }
}
