use heapless::String as HeaplessString;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use std::error::Error;
use std::str::FromStr;

use audit_trail_db::models::{PropertyValue, ValueKind};

/// A trait for converting a database row into a model.
pub trait TryFromRow<R>: Sized {
    /// Performs the conversion.
    fn try_from_row(row: &R) -> Result<Self, Box<dyn Error + Send + Sync>>;
}

/// Retrieves a required `HeaplessString` from a row.
pub fn get_heapless_string<const N: usize>(
    row: &PgRow,
    col_name: &str,
) -> Result<HeaplessString<N>, Box<dyn Error + Send + Sync>> {
    let s: String = row.try_get(col_name)?;
    HeaplessString::from_str(&s).map_err(|_| {
        format!("Value for column '{col_name}' is too long (max {N} chars)").into()
    })
}

/// Retrieves an optional `HeaplessString` from a row.
pub fn get_optional_heapless_string<const N: usize>(
    row: &PgRow,
    col_name: &str,
) -> Result<Option<HeaplessString<N>>, Box<dyn Error + Send + Sync>> {
    let s: Option<String> = row.try_get(col_name)?;
    s.map(|val| HeaplessString::from_str(&val))
        .transpose()
        .map_err(|_| {
            format!("Value for column '{col_name}' is too long (max {N} chars)").into()
        })
}

/// Binds a property value, keeping the column type for nulls.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &PropertyValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        PropertyValue::Bool(v) => query.bind(*v),
        PropertyValue::Int(v) => query.bind(*v),
        PropertyValue::Decimal(v) => query.bind(*v),
        PropertyValue::Text(v) => query.bind(v.clone()),
        PropertyValue::Uuid(v) => query.bind(*v),
        PropertyValue::Timestamp(v) => query.bind(*v),
    }
}

/// Reads a nullable column as a property value of the given kind.
pub fn get_property_value(
    row: &PgRow,
    col_name: &str,
    kind: ValueKind,
) -> Result<PropertyValue, sqlx::Error> {
    Ok(match kind {
        ValueKind::Bool => PropertyValue::Bool(row.try_get(col_name)?),
        ValueKind::Int => PropertyValue::Int(row.try_get(col_name)?),
        ValueKind::Decimal => PropertyValue::Decimal(row.try_get(col_name)?),
        ValueKind::Text => PropertyValue::Text(row.try_get(col_name)?),
        ValueKind::Uuid => PropertyValue::Uuid(row.try_get(col_name)?),
        ValueKind::Timestamp => PropertyValue::Timestamp(row.try_get(col_name)?),
    })
}
